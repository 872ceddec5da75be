#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use minipool_collector::collector::{FanOutOptions, MinipoolCollector};
use minipool_collector::rpc::{
    CallContext, Contract, ContractRegistry, ROCKET_POOL, ROCKET_POOL_TOKEN, RemoteCaller,
    RpcError, Token,
};

pub const POOL: Address = Address::repeat_byte(0xa0);
pub const RPL_TOKEN: Address = Address::repeat_byte(0xb0);

type CallKey = (Address, String, Vec<Token>);

#[derive(Debug, Clone)]
enum Reply {
    Value(Token),
    Fail(String),
    Delayed(Duration, Token),
    /// Висит, пока контекст не отменят
    Hang,
}

/// RemoteCaller в памяти с подставляемыми ответами, ошибками и задержками
#[derive(Default)]
pub struct MockCaller {
    replies: HashMap<CallKey, Reply>,
    failing_bindings: HashSet<Address>,
    calls: AtomicUsize,
    binds: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    cancelled_hangs: AtomicUsize,
}

impl MockCaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returns(mut self, contract: Address, method: &str, args: Vec<Token>, token: Token) -> Self {
        self.replies
            .insert((contract, method.to_string(), args), Reply::Value(token));
        self
    }

    pub fn fails(mut self, contract: Address, method: &str, args: Vec<Token>, reason: &str) -> Self {
        self.replies.insert(
            (contract, method.to_string(), args),
            Reply::Fail(reason.to_string()),
        );
        self
    }

    pub fn delayed(
        mut self,
        contract: Address,
        method: &str,
        args: Vec<Token>,
        delay: Duration,
        token: Token,
    ) -> Self {
        self.replies.insert(
            (contract, method.to_string(), args),
            Reply::Delayed(delay, token),
        );
        self
    }

    pub fn hangs(mut self, contract: Address, method: &str, args: Vec<Token>) -> Self {
        self.replies
            .insert((contract, method.to_string(), args), Reply::Hang);
        self
    }

    pub fn failing_binding(mut self, address: Address) -> Self {
        self.failing_bindings.insert(address);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn binds(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn cancelled_hangs(&self) -> usize {
        self.cancelled_hangs.load(Ordering::SeqCst)
    }

    fn reply(&self, reply: Reply, ctx: &CallContext) -> Result<Token, RpcError> {
        match reply {
            Reply::Value(token) => Ok(token),
            Reply::Fail(reason) => Err(RpcError::Reverted(reason)),
            Reply::Delayed(delay, token) => {
                thread::sleep(delay);
                ctx.ensure_live()?;
                Ok(token)
            }
            Reply::Hang => {
                while !ctx.is_cancelled() {
                    thread::sleep(Duration::from_millis(2));
                }
                self.cancelled_hangs.fetch_add(1, Ordering::SeqCst);
                Err(RpcError::Cancelled)
            }
        }
    }
}

impl RemoteCaller for MockCaller {
    fn contract_at(
        &self,
        address: Address,
        name: &str,
        ctx: &CallContext,
    ) -> Result<Contract, RpcError> {
        ctx.ensure_live()?;
        self.binds.fetch_add(1, Ordering::SeqCst);
        if self.failing_bindings.contains(&address) {
            return Err(RpcError::Binding(format!("no code at {address}")));
        }
        Ok(Contract::new(name, address))
    }

    fn call(
        &self,
        contract: &Contract,
        method: &str,
        args: &[Token],
        ctx: &CallContext,
    ) -> Result<Token, RpcError> {
        ctx.ensure_live()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let key = (contract.address, method.to_string(), args.to_vec());
        let outcome = match self.replies.get(&key).cloned() {
            Some(reply) => self.reply(reply, ctx),
            None => Err(RpcError::Reverted(format!("no mock for {method}"))),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

pub fn options(max_in_flight: usize, call_timeout: Duration) -> FanOutOptions {
    FanOutOptions {
        max_in_flight,
        call_timeout,
        max_entities: 1_000,
    }
}

pub fn collector(mock: &Arc<MockCaller>, options: FanOutOptions) -> MinipoolCollector {
    let caller: Arc<dyn RemoteCaller> = mock.clone();
    let registry = ContractRegistry::new(caller)
        .with_contract(ROCKET_POOL, POOL)
        .with_contract(ROCKET_POOL_TOKEN, RPL_TOKEN);
    MinipoolCollector::new(registry, options)
}

pub fn uint(value: u64) -> Token {
    Token::Uint(U256::from(value))
}

/// depositInput с публичным ключом из 48 байт `pubkey_byte` по смещению 4
pub fn deposit_input(pubkey_byte: u8) -> Token {
    let mut blob = vec![0x01, 0x02, 0x03, 0x04];
    blob.extend([pubkey_byte; 48]);
    blob.extend([0x00; 96]);
    Token::Bytes(blob)
}

pub fn pubkey_hex(pubkey_byte: u8) -> String {
    hex::encode([pubkey_byte; 48])
}

/// Все восемь ответов, нужных для сборки полного описания миньпула
pub fn with_details(mock: MockCaller, minipool: Address, status: u8) -> MockCaller {
    mock.returns(minipool, "getStatus", vec![], Token::Uint8(status))
        .returns(minipool, "getStatusChangedTime", vec![], uint(1_546_300_800))
        .returns(
            minipool,
            "getStakingDurationID",
            vec![],
            Token::Str("3m".to_string()),
        )
        .returns(minipool, "getNodeBalance", vec![], uint(16_000_000_000))
        .returns(
            RPL_TOKEN,
            "balanceOf",
            vec![Token::Address(minipool)],
            uint(250),
        )
        .returns(minipool, "getUserCount", vec![], uint(3))
        .returns(minipool, "getUserDepositCapacity", vec![], uint(16_000))
        .returns(minipool, "getUserDepositTotal", vec![], uint(12_000))
}

pub fn with_status(mock: MockCaller, minipool: Address, status: u8, pubkey_byte: u8) -> MockCaller {
    mock.returns(minipool, "getStatus", vec![], Token::Uint8(status))
        .returns(minipool, "getStatusChangedBlock", vec![], uint(7_200_000))
        .returns(minipool, "getStakingDuration", vec![], uint(20_160))
        .returns(minipool, "getDepositInput", vec![], deposit_input(pubkey_byte))
}

/// Пул из `minipools` с ключами валидаторов `pubkey_bytes`
pub fn with_pool(mut mock: MockCaller, minipools: &[Address], pubkey_bytes: &[u8]) -> MockCaller {
    mock = mock.returns(POOL, "getPoolsCount", vec![], uint(minipools.len() as u64));
    for (index, (minipool, pubkey_byte)) in minipools.iter().zip(pubkey_bytes).enumerate() {
        mock = mock
            .returns(
                POOL,
                "getPoolAt",
                vec![uint(index as u64)],
                Token::Address(*minipool),
            )
            .returns(*minipool, "getDepositInput", vec![], deposit_input(*pubkey_byte));
    }
    mock
}
