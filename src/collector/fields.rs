use std::fmt;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};

use super::error::{CollectError, DecodeError};
use super::types::{FieldValue, MinipoolDetails, MinipoolStatus};
use crate::rpc::{ROCKET_POOL_TOKEN, Token};
use crate::status::status_label;

/// Смещение публичного ключа валидатора внутри depositInput
pub const PUBKEY_OFFSET: usize = 4;
/// Длина публичного ключа валидатора (BLS, 48 байт)
pub const PUBKEY_LEN: usize = 48;

/// Какой контракт читает поле
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Контракт самого миньпула
    Minipool,
    /// Синглтон из реестра по имени
    Registry(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Args {
    None,
    /// Адрес миньпула единственным аргументом
    EntityAddress,
}

/// Описание одного поля записи: что вызвать и как разобрать ответ
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<F> {
    pub field: F,
    /// Префикс сообщения об ошибке
    pub context: &'static str,
    pub target: Target,
    pub method: &'static str,
    pub args: Args,
    pub decode: fn(Token) -> Result<FieldValue, DecodeError>,
}

impl<F> FieldSpec<F> {
    pub fn args_for(&self, entity: Address) -> Vec<Token> {
        match self.args {
            Args::None => Vec::new(),
            Args::EntityAddress => vec![Token::Address(entity)],
        }
    }
}

/// Накопитель одной записи: по слоту на каждое поле.
///
/// Заполняется только собирающей задачей; наружу отдаётся лишь через
/// [`Record::finish`], когда заполнены все слоты.
pub trait Record: Default + Send {
    type Field: Copy + fmt::Debug + Send + Sync + 'static;
    type Output;

    const FIELDS: &'static [FieldSpec<Self::Field>];

    fn fill(&mut self, field: Self::Field, value: FieldValue) -> Result<(), CollectError>;

    fn finish(self, address: Address) -> Result<Self::Output, CollectError>;
}

pub fn decode_status(token: Token) -> Result<FieldValue, DecodeError> {
    match token {
        Token::Uint8(code) => Ok(FieldValue::Status(code)),
        Token::Uint(value) => u8::try_from(value)
            .map(FieldValue::Status)
            .map_err(|_| DecodeError::OutOfRange {
                value,
                target: "uint8",
            }),
        other => Err(unexpected("uint8", &other)),
    }
}

pub fn decode_amount(token: Token) -> Result<FieldValue, DecodeError> {
    match token {
        Token::Uint(value) => Ok(FieldValue::Amount(value)),
        Token::Uint8(value) => Ok(FieldValue::Amount(U256::from(value))),
        other => Err(unexpected("uint256", &other)),
    }
}

pub fn decode_text(token: Token) -> Result<FieldValue, DecodeError> {
    match token {
        Token::Str(text) => Ok(FieldValue::Text(text)),
        other => Err(unexpected("string", &other)),
    }
}

/// Unix-время в секундах; значения вне i64 отвергаются
pub fn decode_timestamp(token: Token) -> Result<FieldValue, DecodeError> {
    let value = match token {
        Token::Uint(value) => value,
        other => return Err(unexpected("uint256", &other)),
    };
    let out_of_range = || DecodeError::OutOfRange {
        value,
        target: "timestamp",
    };
    let secs = i64::try_from(value).map_err(|_| out_of_range())?;
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(FieldValue::Timestamp)
        .ok_or_else(out_of_range)
}

pub fn decode_pubkey(token: Token) -> Result<FieldValue, DecodeError> {
    match token {
        Token::Bytes(blob) => validator_pubkey(&blob).map(FieldValue::Pubkey),
        other => Err(unexpected("bytes", &other)),
    }
}

/// Вырезает публичный ключ валидатора из depositInput.
// TODO: разбирать depositInput как SSZ вместо фиксированного смещения
pub fn validator_pubkey(deposit_input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let end = PUBKEY_OFFSET + PUBKEY_LEN;
    deposit_input
        .get(PUBKEY_OFFSET..end)
        .map(<[u8]>::to_vec)
        .ok_or(DecodeError::ShortBlob {
            len: deposit_input.len(),
            need: end,
        })
}

fn unexpected(expected: &'static str, found: &Token) -> DecodeError {
    DecodeError::UnexpectedToken {
        expected,
        found: found.kind(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailsField {
    Status,
    StatusTime,
    StakingDurationId,
    NodeEtherBalance,
    NodeRplBalance,
    UserCount,
    UserDepositCapacity,
    UserDepositTotal,
}

pub const DETAILS_FIELDS: &[FieldSpec<DetailsField>] = &[
    FieldSpec {
        field: DetailsField::Status,
        context: "Error retrieving minipool status",
        target: Target::Minipool,
        method: "getStatus",
        args: Args::None,
        decode: decode_status,
    },
    FieldSpec {
        field: DetailsField::StatusTime,
        context: "Error retrieving minipool status changed time",
        target: Target::Minipool,
        method: "getStatusChangedTime",
        args: Args::None,
        decode: decode_timestamp,
    },
    FieldSpec {
        field: DetailsField::StakingDurationId,
        context: "Error retrieving minipool staking duration ID",
        target: Target::Minipool,
        method: "getStakingDurationID",
        args: Args::None,
        decode: decode_text,
    },
    FieldSpec {
        field: DetailsField::NodeEtherBalance,
        context: "Error retrieving minipool node ETH balance",
        target: Target::Minipool,
        method: "getNodeBalance",
        args: Args::None,
        decode: decode_amount,
    },
    FieldSpec {
        field: DetailsField::NodeRplBalance,
        context: "Error retrieving minipool node RPL balance",
        target: Target::Registry(ROCKET_POOL_TOKEN),
        method: "balanceOf",
        args: Args::EntityAddress,
        decode: decode_amount,
    },
    FieldSpec {
        field: DetailsField::UserCount,
        context: "Error retrieving minipool user count",
        target: Target::Minipool,
        method: "getUserCount",
        args: Args::None,
        decode: decode_amount,
    },
    FieldSpec {
        field: DetailsField::UserDepositCapacity,
        context: "Error retrieving minipool user deposit capacity",
        target: Target::Minipool,
        method: "getUserDepositCapacity",
        args: Args::None,
        decode: decode_amount,
    },
    FieldSpec {
        field: DetailsField::UserDepositTotal,
        context: "Error retrieving minipool user deposit total",
        target: Target::Minipool,
        method: "getUserDepositTotal",
        args: Args::None,
        decode: decode_amount,
    },
];

#[derive(Debug, Default)]
pub struct DetailsRecord {
    status: Option<u8>,
    status_time: Option<DateTime<Utc>>,
    staking_duration_id: Option<String>,
    node_ether_balance_wei: Option<U256>,
    node_rpl_balance_wei: Option<U256>,
    user_count: Option<U256>,
    user_deposit_capacity_wei: Option<U256>,
    user_deposit_total_wei: Option<U256>,
}

impl Record for DetailsRecord {
    type Field = DetailsField;
    type Output = MinipoolDetails;

    const FIELDS: &'static [FieldSpec<DetailsField>] = DETAILS_FIELDS;

    fn fill(&mut self, field: DetailsField, value: FieldValue) -> Result<(), CollectError> {
        match (field, value) {
            (DetailsField::Status, FieldValue::Status(code)) => self.status = Some(code),
            (DetailsField::StatusTime, FieldValue::Timestamp(time)) => {
                self.status_time = Some(time)
            }
            (DetailsField::StakingDurationId, FieldValue::Text(id)) => {
                self.staking_duration_id = Some(id)
            }
            (DetailsField::NodeEtherBalance, FieldValue::Amount(wei)) => {
                self.node_ether_balance_wei = Some(wei)
            }
            (DetailsField::NodeRplBalance, FieldValue::Amount(wei)) => {
                self.node_rpl_balance_wei = Some(wei)
            }
            (DetailsField::UserCount, FieldValue::Amount(count)) => self.user_count = Some(count),
            (DetailsField::UserDepositCapacity, FieldValue::Amount(wei)) => {
                self.user_deposit_capacity_wei = Some(wei)
            }
            (DetailsField::UserDepositTotal, FieldValue::Amount(wei)) => {
                self.user_deposit_total_wei = Some(wei)
            }
            (field, _) => return Err(CollectError::Mismatch(details_field_name(field))),
        }
        Ok(())
    }

    fn finish(self, address: Address) -> Result<MinipoolDetails, CollectError> {
        let status = self.status.ok_or(CollectError::Incomplete("status"))?;
        Ok(MinipoolDetails {
            address,
            status,
            status_type: status_label(status).to_string(),
            status_time: self
                .status_time
                .ok_or(CollectError::Incomplete("status time"))?,
            staking_duration_id: self
                .staking_duration_id
                .ok_or(CollectError::Incomplete("staking duration id"))?,
            node_ether_balance_wei: self
                .node_ether_balance_wei
                .ok_or(CollectError::Incomplete("node ETH balance"))?,
            node_rpl_balance_wei: self
                .node_rpl_balance_wei
                .ok_or(CollectError::Incomplete("node RPL balance"))?,
            user_count: self.user_count.ok_or(CollectError::Incomplete("user count"))?,
            user_deposit_capacity_wei: self
                .user_deposit_capacity_wei
                .ok_or(CollectError::Incomplete("user deposit capacity"))?,
            user_deposit_total_wei: self
                .user_deposit_total_wei
                .ok_or(CollectError::Incomplete("user deposit total"))?,
        })
    }
}

fn details_field_name(field: DetailsField) -> &'static str {
    match field {
        DetailsField::Status => "status",
        DetailsField::StatusTime => "status time",
        DetailsField::StakingDurationId => "staking duration id",
        DetailsField::NodeEtherBalance => "node ETH balance",
        DetailsField::NodeRplBalance => "node RPL balance",
        DetailsField::UserCount => "user count",
        DetailsField::UserDepositCapacity => "user deposit capacity",
        DetailsField::UserDepositTotal => "user deposit total",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusField {
    Status,
    StatusBlock,
    StakingDuration,
    ValidatorPubkey,
}

pub const STATUS_FIELDS: &[FieldSpec<StatusField>] = &[
    FieldSpec {
        field: StatusField::Status,
        context: "Error retrieving minipool status",
        target: Target::Minipool,
        method: "getStatus",
        args: Args::None,
        decode: decode_status,
    },
    FieldSpec {
        field: StatusField::StatusBlock,
        context: "Error retrieving minipool status changed block",
        target: Target::Minipool,
        method: "getStatusChangedBlock",
        args: Args::None,
        decode: decode_amount,
    },
    FieldSpec {
        field: StatusField::StakingDuration,
        context: "Error retrieving minipool staking duration",
        target: Target::Minipool,
        method: "getStakingDuration",
        args: Args::None,
        decode: decode_amount,
    },
    FieldSpec {
        field: StatusField::ValidatorPubkey,
        context: "Error retrieving minipool depositInput data",
        target: Target::Minipool,
        method: "getDepositInput",
        args: Args::None,
        decode: decode_pubkey,
    },
];

#[derive(Debug, Default)]
pub struct StatusRecord {
    status: Option<u8>,
    status_block: Option<U256>,
    staking_duration: Option<U256>,
    validator_pubkey: Option<Vec<u8>>,
}

impl Record for StatusRecord {
    type Field = StatusField;
    type Output = MinipoolStatus;

    const FIELDS: &'static [FieldSpec<StatusField>] = STATUS_FIELDS;

    fn fill(&mut self, field: StatusField, value: FieldValue) -> Result<(), CollectError> {
        match (field, value) {
            (StatusField::Status, FieldValue::Status(code)) => self.status = Some(code),
            (StatusField::StatusBlock, FieldValue::Amount(block)) => {
                self.status_block = Some(block)
            }
            (StatusField::StakingDuration, FieldValue::Amount(duration)) => {
                self.staking_duration = Some(duration)
            }
            (StatusField::ValidatorPubkey, FieldValue::Pubkey(pubkey)) => {
                self.validator_pubkey = Some(pubkey)
            }
            (StatusField::Status, _) => return Err(CollectError::Mismatch("status")),
            (StatusField::StatusBlock, _) => return Err(CollectError::Mismatch("status block")),
            (StatusField::StakingDuration, _) => {
                return Err(CollectError::Mismatch("staking duration"));
            }
            (StatusField::ValidatorPubkey, _) => {
                return Err(CollectError::Mismatch("validator pubkey"));
            }
        }
        Ok(())
    }

    fn finish(self, _address: Address) -> Result<MinipoolStatus, CollectError> {
        Ok(MinipoolStatus {
            status: self.status.ok_or(CollectError::Incomplete("status"))?,
            status_block: self
                .status_block
                .ok_or(CollectError::Incomplete("status block"))?,
            staking_duration: self
                .staking_duration
                .ok_or(CollectError::Incomplete("staking duration"))?,
            validator_pubkey: self
                .validator_pubkey
                .ok_or(CollectError::Incomplete("validator pubkey"))?,
        })
    }
}
