use std::time::Duration;

use alloy_primitives::U256;
use thiserror::Error;

use crate::rpc::RpcError;

/// Ошибка разбора значения, возвращённого контрактом
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("expected {expected}, got {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },
    #[error("value {value} does not fit into {target}")]
    OutOfRange { value: U256, target: &'static str },
    #[error("blob of {len} bytes is shorter than {need}")]
    ShortBlob { len: usize, need: usize },
}

/// Ошибка сборки записи или таблицы.
///
/// Первая же ошибка любого поля прерывает всю сборку и возвращается как есть.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("{context}: {source}")]
    Rpc {
        context: &'static str,
        #[source]
        source: RpcError,
    },
    #[error("{context}: {source}")]
    Decode {
        context: &'static str,
        #[source]
        source: DecodeError,
    },
    #[error("{context}: timed out after {timeout:?}")]
    Timeout {
        context: &'static str,
        timeout: Duration,
    },
    #[error("aggregation cancelled")]
    Cancelled,
    #[error("minipool count {0} exceeds the supported range")]
    CountOverflow(U256),
    #[error("minipool count {count} exceeds the configured limit of {limit}")]
    TooManyEntities { count: usize, limit: usize },
    #[error("record incomplete: missing {0}")]
    Incomplete(&'static str),
    #[error("unexpected value for field {0}")]
    Mismatch(&'static str),
    #[error("worker failed: {0}")]
    Worker(String),
}

impl CollectError {
    pub fn rpc(context: &'static str) -> impl FnOnce(RpcError) -> Self {
        move |source| Self::Rpc { context, source }
    }

    pub fn decode(context: &'static str) -> impl FnOnce(DecodeError) -> Self {
        move |source| Self::Decode { context, source }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Rpc {
                    source: RpcError::DeadlineExceeded,
                    ..
                }
        )
    }
}
