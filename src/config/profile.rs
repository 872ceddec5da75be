use std::collections::HashMap;
use std::str::FromStr;

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::rpc::{ROCKET_POOL, ROCKET_POOL_TOKEN};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String, // Название сети, например "mainnet" или "local"
    pub rpc_url: String, // Эндпоинт шлюза чтения контрактов
    pub contracts: HashMap<String, String>, // Адреса синглтон-контрактов по имени ABI
}

impl Profile {
    /// Проверяет, что заданы обязательные контракты и их адреса разбираются
    pub fn validate(&self) -> Result<()> {
        for required in [ROCKET_POOL, ROCKET_POOL_TOKEN] {
            if !self.contracts.contains_key(required) {
                anyhow::bail!("Profile '{}' is missing contract '{}'", self.name, required);
            }
        }
        self.contract_addresses().map(|_| ())
    }

    pub fn contract_addresses(&self) -> Result<Vec<(String, Address)>> {
        let mut addresses = self
            .contracts
            .iter()
            .map(|(name, raw)| {
                let address = Address::from_str(raw.trim())
                    .with_context(|| format!("Invalid address for contract '{}': {}", name, raw))?;
                Ok((name.clone(), address))
            })
            .collect::<Result<Vec<_>>>()?;
        addresses.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(addresses)
    }
}
