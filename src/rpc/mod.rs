use std::time::{Duration, Instant};

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod http;
pub mod registry;

pub use http::HttpCaller;
pub use registry::ContractRegistry;

/// Имя ABI контракта отдельного миньпула
pub const ROCKET_MINIPOOL: &str = "rocketMinipool";
/// Синглтон-контракт пула (количество и адреса миньпулов)
pub const ROCKET_POOL: &str = "rocketPool";
/// Синглтон-контракт токена RPL
pub const ROCKET_POOL_TOKEN: &str = "rocketPoolToken";

/// Типизированное значение аргумента или результата вызова контракта
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Token {
    Uint8(u8),
    Uint(U256),
    Str(String),
    Bytes(Vec<u8>),
    Address(Address),
}

impl Token {
    /// Короткое имя типа для сообщений об ошибках
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Uint8(_) => "uint8",
            Token::Uint(_) => "uint256",
            Token::Str(_) => "string",
            Token::Bytes(_) => "bytes",
            Token::Address(_) => "address",
        }
    }
}

/// Установленная привязка к контракту по адресу
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Contract {
    pub name: String,
    pub address: Address,
}

impl Contract {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("unknown contract: {0}")]
    UnknownContract(String),
    #[error("invalid binding: {0}")]
    Binding(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status} body={body}")]
    HttpStatus { status: u16, body: String },
    #[error("call reverted: {0}")]
    Reverted(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("call cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Контекст одного удалённого вызова: сигнал отмены и крайний срок.
///
/// Реализации [`RemoteCaller`] обязаны проверять контекст перед вызовом
/// и не ждать ответа дольше [`CallContext::remaining`].
#[derive(Debug, Clone)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Instant,
}

impl CallContext {
    pub fn new(cancel: CancellationToken, deadline: Instant) -> Self {
        Self { cancel, deadline }
    }

    pub fn with_timeout(cancel: CancellationToken, timeout: Duration) -> Self {
        Self::new(cancel, Instant::now() + timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn ensure_live(&self) -> Result<(), RpcError> {
        if self.is_cancelled() {
            return Err(RpcError::Cancelled);
        }
        if self.remaining().is_zero() {
            return Err(RpcError::DeadlineExceeded);
        }
        Ok(())
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Блокирующая возможность выполнить одно именованное чтение у удалённого узла.
///
/// Вызывается только из пула блокирующих потоков tokio, поэтому реализация
/// может свободно блокироваться на сетевом вводе-выводе.
pub trait RemoteCaller: Send + Sync + 'static {
    /// Устанавливает привязку к контракту `name`, развёрнутому по `address`
    fn contract_at(
        &self,
        address: Address,
        name: &str,
        ctx: &CallContext,
    ) -> Result<Contract, RpcError>;

    /// Выполняет чтение `method` у привязанного контракта
    fn call(
        &self,
        contract: &Contract,
        method: &str,
        args: &[Token],
        ctx: &CallContext,
    ) -> Result<Token, RpcError>;
}
