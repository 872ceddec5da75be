use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};

/// Разобранное значение одного поля записи
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Status(u8),
    Timestamp(DateTime<Utc>),
    Text(String),
    Amount(U256),
    Pubkey(Vec<u8>),
}

/// Полное описание миньпула
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinipoolDetails {
    pub address: Address,
    pub status: u8,
    pub status_type: String,
    pub status_time: DateTime<Utc>,
    pub staking_duration_id: String,
    pub node_ether_balance_wei: U256,
    pub node_rpl_balance_wei: U256,
    pub user_count: U256,
    pub user_deposit_capacity_wei: U256,
    pub user_deposit_total_wei: U256,
}

/// Статус миньпула вместе с публичным ключом валидатора
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinipoolStatus {
    pub status: u8,
    pub status_block: U256,
    pub staking_duration: U256,
    pub validator_pubkey: Vec<u8>,
}

/// Активные миньпулы: hex публичного ключа валидатора -> адрес миньпула
pub type ActiveMinipools = BTreeMap<String, Address>;
