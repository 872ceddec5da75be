use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;

use super::{Contract, RemoteCaller, RpcError};

/// Реестр синглтон-контрактов поверх одного [`RemoteCaller`]
#[derive(Clone)]
pub struct ContractRegistry {
    caller: Arc<dyn RemoteCaller>,
    contracts: HashMap<String, Contract>,
}

impl ContractRegistry {
    pub fn new(caller: Arc<dyn RemoteCaller>) -> Self {
        Self {
            caller,
            contracts: HashMap::new(),
        }
    }

    /// Регистрирует синглтон-контракт под именем его ABI
    pub fn with_contract(mut self, name: &str, address: Address) -> Self {
        self.contracts
            .insert(name.to_string(), Contract::new(name, address));
        self
    }

    pub fn contract(&self, name: &str) -> Result<Contract, RpcError> {
        self.contracts
            .get(name)
            .cloned()
            .ok_or_else(|| RpcError::UnknownContract(name.to_string()))
    }

    pub fn caller(&self) -> Arc<dyn RemoteCaller> {
        Arc::clone(&self.caller)
    }
}
