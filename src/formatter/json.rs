use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::collector::{ActiveMinipools, MinipoolDetails, MinipoolStatus};
use crate::status::status_label;

/// Ответ для CLI и HTTP: данные при успехе или сообщение об ошибке
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseJson<T> {
    pub status: String, // "success" | "error"
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinipoolDetailsJson {
    pub address: String,
    pub status: u8,
    pub status_type: String,
    pub status_time: String,
    pub staking_duration_id: String,
    pub node_ether_balance_wei: String,
    pub node_rpl_balance_wei: String,
    pub user_count: String,
    pub user_deposit_capacity_wei: String,
    pub user_deposit_total_wei: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinipoolStatusJson {
    pub status: u8,
    pub status_type: String,
    pub status_block: String,
    pub staking_duration: String,
    pub validator_pubkey: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveMinipoolsJson {
    pub count: usize,
    pub minipools: BTreeMap<String, String>,
}

/// JSON форматтер для результатов сбора
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_details(details: &MinipoolDetails) -> MinipoolDetailsJson {
        MinipoolDetailsJson {
            address: details.address.to_string(),
            status: details.status,
            status_type: details.status_type.clone(),
            status_time: details.status_time.to_rfc3339(),
            staking_duration_id: details.staking_duration_id.clone(),
            node_ether_balance_wei: details.node_ether_balance_wei.to_string(),
            node_rpl_balance_wei: details.node_rpl_balance_wei.to_string(),
            user_count: details.user_count.to_string(),
            user_deposit_capacity_wei: details.user_deposit_capacity_wei.to_string(),
            user_deposit_total_wei: details.user_deposit_total_wei.to_string(),
        }
    }

    pub fn format_status(status: &MinipoolStatus) -> MinipoolStatusJson {
        MinipoolStatusJson {
            status: status.status,
            status_type: status_label(status.status).to_string(),
            status_block: status.status_block.to_string(),
            staking_duration: status.staking_duration.to_string(),
            validator_pubkey: hex::encode(&status.validator_pubkey),
        }
    }

    pub fn format_active(active: &ActiveMinipools) -> ActiveMinipoolsJson {
        ActiveMinipoolsJson {
            count: active.len(),
            minipools: active
                .iter()
                .map(|(pubkey, address)| (pubkey.clone(), address.to_string()))
                .collect(),
        }
    }

    pub fn success<T>(data: T) -> ResponseJson<T> {
        ResponseJson {
            status: "success".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: Some(data),
            error: None,
        }
    }

    /// Сообщение ошибки передаётся без изменений
    pub fn failure(error: &dyn Display) -> ResponseJson<()> {
        ResponseJson {
            status: "error".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: None,
            error: Some(error.to_string()),
        }
    }

    /// Сериализует ответ в JSON строку
    pub fn to_json_string<T: Serialize>(response: &T) -> anyhow::Result<String> {
        serde_json::to_string_pretty(response)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {}", e))
    }

    /// Сериализует ответ в компактный JSON
    pub fn to_json_compact<T: Serialize>(response: &T) -> anyhow::Result<String> {
        serde_json::to_string(response)
            .map_err(|e| anyhow::anyhow!("JSON serialization failed: {}", e))
    }
}
