use alloy_primitives::{Address, U256};

use super::error::{CollectError, DecodeError};
use super::fields::{FieldSpec, validator_pubkey};
use super::types::FieldValue;
use crate::rpc::{CallContext, Contract, ROCKET_MINIPOOL, RemoteCaller, Token};

pub const CONTEXT_INIT_MINIPOOL: &str = "Error initialising minipool contract";
pub const CONTEXT_POOL_COUNT: &str = "Error retrieving minipool count";
pub const CONTEXT_POOL_ADDRESS: &str = "Error retrieving minipool address";
pub const CONTEXT_DEPOSIT_INPUT: &str = "Error retrieving minipool depositInput data";

/// Читает и разбирает одно поле записи. Ровно один вызов, без повторов.
pub fn fetch_field<F>(
    caller: &dyn RemoteCaller,
    contract: &Contract,
    spec: &FieldSpec<F>,
    entity: Address,
    ctx: &CallContext,
) -> Result<FieldValue, CollectError> {
    ctx.ensure_live().map_err(CollectError::rpc(spec.context))?;
    let token = caller
        .call(contract, spec.method, &spec.args_for(entity), ctx)
        .map_err(CollectError::rpc(spec.context))?;
    (spec.decode)(token).map_err(CollectError::decode(spec.context))
}

/// Привязка к контракту миньпула по адресу
pub fn bind_minipool(
    caller: &dyn RemoteCaller,
    address: Address,
    ctx: &CallContext,
) -> Result<Contract, CollectError> {
    ctx.ensure_live()
        .and_then(|()| caller.contract_at(address, ROCKET_MINIPOOL, ctx))
        .map_err(CollectError::rpc(CONTEXT_INIT_MINIPOOL))
}

pub fn fetch_pool_count(
    caller: &dyn RemoteCaller,
    pool: &Contract,
    ctx: &CallContext,
) -> Result<U256, CollectError> {
    let token = caller
        .call(pool, "getPoolsCount", &[], ctx)
        .map_err(CollectError::rpc(CONTEXT_POOL_COUNT))?;
    match token {
        Token::Uint(count) => Ok(count),
        Token::Uint8(count) => Ok(U256::from(count)),
        other => Err(CollectError::decode(CONTEXT_POOL_COUNT)(
            DecodeError::UnexpectedToken {
                expected: "uint256",
                found: other.kind(),
            },
        )),
    }
}

pub fn fetch_pool_address(
    caller: &dyn RemoteCaller,
    pool: &Contract,
    index: usize,
    ctx: &CallContext,
) -> Result<Address, CollectError> {
    ctx.ensure_live()
        .map_err(CollectError::rpc(CONTEXT_POOL_ADDRESS))?;
    let args = [Token::Uint(U256::from(index))];
    let token = caller
        .call(pool, "getPoolAt", &args, ctx)
        .map_err(CollectError::rpc(CONTEXT_POOL_ADDRESS))?;
    match token {
        Token::Address(address) => Ok(address),
        other => Err(CollectError::decode(CONTEXT_POOL_ADDRESS)(
            DecodeError::UnexpectedToken {
                expected: "address",
                found: other.kind(),
            },
        )),
    }
}

/// Привязывается к миньпулу и возвращает hex публичного ключа его валидатора
pub fn fetch_validator_pubkey(
    caller: &dyn RemoteCaller,
    address: Address,
    ctx: &CallContext,
) -> Result<String, CollectError> {
    let minipool = bind_minipool(caller, address, ctx)?;
    let token = caller
        .call(&minipool, "getDepositInput", &[], ctx)
        .map_err(CollectError::rpc(CONTEXT_DEPOSIT_INPUT))?;
    let blob = match token {
        Token::Bytes(blob) => blob,
        other => {
            return Err(CollectError::decode(CONTEXT_DEPOSIT_INPUT)(
                DecodeError::UnexpectedToken {
                    expected: "bytes",
                    found: other.kind(),
                },
            ));
        }
    };
    validator_pubkey(&blob)
        .map(hex::encode)
        .map_err(CollectError::decode(CONTEXT_DEPOSIT_INPUT))
}
