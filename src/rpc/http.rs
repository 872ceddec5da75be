use std::collections::HashSet;
use std::time::Duration;

use alloy_primitives::Address;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CallContext, Contract, ROCKET_MINIPOOL, RemoteCaller, RpcError, Token};

/// Тело запроса к шлюзу чтения контрактов
#[derive(Debug, Serialize)]
struct CallRequest<'a> {
    contract: &'a str,
    address: Address,
    method: &'a str,
    args: &'a [Token],
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    #[serde(default)]
    result: Option<Token>,
    #[serde(default)]
    error: Option<String>,
}

/// Блокирующий HTTP клиент шлюза чтения контрактов
#[derive(Debug, Clone)]
pub struct HttpCaller {
    call_url: String,
    client: Client,
    known_contracts: HashSet<String>,
}

impl HttpCaller {
    /// Создаёт клиент. Нельзя вызывать из асинхронного контекста:
    /// `reqwest::blocking` поднимает собственный рантайм.
    pub fn new(call_url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let call_url = call_url.trim();
        if call_url.is_empty() {
            return Err(RpcError::Binding("rpc url is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(3)))
            .build()
            .map_err(|e| RpcError::Network(format!("failed to build http client: {e}")))?;

        Ok(Self {
            call_url: call_url.to_string(),
            client,
            known_contracts: HashSet::from([ROCKET_MINIPOOL.to_string()]),
        })
    }
}

impl RemoteCaller for HttpCaller {
    fn contract_at(
        &self,
        address: Address,
        name: &str,
        ctx: &CallContext,
    ) -> Result<Contract, RpcError> {
        ctx.ensure_live()?;
        if !self.known_contracts.contains(name) {
            return Err(RpcError::UnknownContract(name.to_string()));
        }
        if address.is_zero() {
            return Err(RpcError::Binding(format!("{name} at zero address")));
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
        debug!(contract = %contract.name, address = %contract.address, method, "contract call");

        let request = CallRequest {
            contract: &contract.name,
            address: contract.address,
            method,
            args,
        };

        let resp = self
            .client
            .post(&self.call_url)
            .timeout(ctx.remaining())
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::DeadlineExceeded
                } else {
                    RpcError::Network(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RpcError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CallResponse = resp
            .json()
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        match parsed {
            CallResponse {
                error: Some(reason),
                ..
            } => Err(RpcError::Reverted(reason)),
            CallResponse {
                result: Some(token),
                ..
            } => Ok(token),
            CallResponse { .. } => Err(RpcError::Decode("empty call response".to_string())),
        }
    }
}
