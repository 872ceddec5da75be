//! Параллельный сбор состояния миньпулов.
//!
//! Каждое поле записи читается отдельным удалённым вызовом. Вызовы одной
//! записи выполняются параллельно, запись отдаётся только целиком, а первая
//! же ошибка любого вызова становится результатом всей операции.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::rpc::{ContractRegistry, ROCKET_POOL};

pub mod error;
pub mod fan_out;
pub mod fields;
pub mod task;
pub mod types;

pub use error::{CollectError, DecodeError};
pub use fan_out::{FanOut, FanOutOptions};
pub use fields::{DetailsRecord, FieldSpec, Record, StatusRecord, Target};
pub use types::{ActiveMinipools, FieldValue, MinipoolDetails, MinipoolStatus};

/// Коллектор состояния миньпулов поверх реестра контрактов
pub struct MinipoolCollector {
    registry: Arc<ContractRegistry>,
    options: FanOutOptions,
}

impl MinipoolCollector {
    pub fn new(registry: ContractRegistry, options: FanOutOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            options,
        }
    }

    pub fn options(&self) -> &FanOutOptions {
        &self.options
    }

    /// Собирает полное описание миньпула
    pub async fn details(&self, address: Address) -> Result<MinipoolDetails, CollectError> {
        self.collect_record::<DetailsRecord>(address).await
    }

    /// Собирает статус миньпула и публичный ключ его валидатора
    pub async fn status(&self, address: Address) -> Result<MinipoolStatus, CollectError> {
        self.collect_record::<StatusRecord>(address).await
    }

    /// Собирает одну запись формы `R`: привязка к миньпулу устанавливается
    /// один раз и разделяется всеми вызовами полей.
    pub async fn collect_record<R: Record>(
        &self,
        address: Address,
    ) -> Result<R::Output, CollectError> {
        let root = CancellationToken::new();
        let caller = self.registry.caller();

        let minipool = {
            let caller = Arc::clone(&caller);
            fan_out::call_one(
                &root,
                &self.options,
                task::CONTEXT_INIT_MINIPOOL,
                move |ctx| task::bind_minipool(caller.as_ref(), address, ctx),
            )
            .await?
        };
        let minipool = Arc::new(minipool);

        let mut fan_out = FanOut::new(&root, &self.options);
        for spec in R::FIELDS {
            let contract = match spec.target {
                Target::Minipool => Arc::clone(&minipool),
                Target::Registry(name) => Arc::new(
                    self.registry
                        .contract(name)
                        .map_err(CollectError::rpc(spec.context))?,
                ),
            };
            let caller = Arc::clone(&caller);
            let spec = *spec;
            debug!(%address, field = ?spec.field, method = spec.method, "spawning field fetch");
            fan_out.spawn(spec.context, spec.field, move |ctx| {
                task::fetch_field(caller.as_ref(), &contract, &spec, address, ctx)
            });
        }

        let mut record = R::default();
        fan_out
            .collect(|field, value| record.fill(field, value))
            .await?;
        let output = record.finish(address)?;

        info!(%address, fields = R::FIELDS.len(), "minipool record collected");
        Ok(output)
    }

    /// Строит таблицу активных миньпулов по публичному ключу валидатора.
    ///
    /// Первая фаза читает адреса миньпулов по индексам, вторая для каждого
    /// адреса читает depositInput. Таблица отдаётся только если успешны
    /// все вызовы обеих фаз.
    pub async fn active_by_validator_pubkey(&self) -> Result<ActiveMinipools, CollectError> {
        let root = CancellationToken::new();
        let caller = self.registry.caller();
        let pool = Arc::new(
            self.registry
                .contract(ROCKET_POOL)
                .map_err(CollectError::rpc(task::CONTEXT_POOL_COUNT))?,
        );

        let raw_count = {
            let caller = Arc::clone(&caller);
            let pool = Arc::clone(&pool);
            fan_out::call_one(
                &root,
                &self.options,
                task::CONTEXT_POOL_COUNT,
                move |ctx| task::fetch_pool_count(caller.as_ref(), &pool, ctx),
            )
            .await?
        };
        let count = self.checked_count(raw_count)?;
        if count == 0 {
            info!("no minipools registered");
            return Ok(ActiveMinipools::new());
        }

        let mut fan_out = FanOut::new(&root, &self.options);
        for index in 0..count {
            let caller = Arc::clone(&caller);
            let pool = Arc::clone(&pool);
            fan_out.spawn(task::CONTEXT_POOL_ADDRESS, index, move |ctx| {
                task::fetch_pool_address(caller.as_ref(), &pool, index, ctx)
            });
        }
        let mut slots: Vec<Option<Address>> = vec![None; count];
        fan_out
            .collect(|index, address| {
                slots[index] = Some(address);
                Ok(())
            })
            .await?;
        let addresses = slots
            .into_iter()
            .map(|slot| slot.ok_or(CollectError::Incomplete("minipool address")))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count, "minipool addresses resolved");

        let mut fan_out = FanOut::new(&root, &self.options);
        for (index, address) in addresses.iter().copied().enumerate() {
            let caller = Arc::clone(&caller);
            fan_out.spawn(task::CONTEXT_DEPOSIT_INPUT, index, move |ctx| {
                task::fetch_validator_pubkey(caller.as_ref(), address, ctx)
            });
        }
        let mut pubkeys: Vec<Option<String>> = vec![None; count];
        fan_out
            .collect(|index, pubkey| {
                pubkeys[index] = Some(pubkey);
                Ok(())
            })
            .await?;

        let mut active = ActiveMinipools::new();
        for (pubkey, address) in pubkeys.into_iter().zip(addresses) {
            let pubkey = pubkey.ok_or(CollectError::Incomplete("validator pubkey"))?;
            if let Some(previous) = active.insert(pubkey, address) {
                warn!(%previous, %address, "validator pubkey shared by several minipools");
            }
        }

        info!(count, entries = active.len(), "active minipools collected");
        Ok(active)
    }

    /// Приводит удалённое количество к границе цикла, отвергая переполнение
    fn checked_count(&self, raw: U256) -> Result<usize, CollectError> {
        let count = i64::try_from(raw).map_err(|_| CollectError::CountOverflow(raw))?;
        let count = usize::try_from(count).map_err(|_| CollectError::CountOverflow(raw))?;
        if count > self.options.max_entities {
            return Err(CollectError::TooManyEntities {
                count,
                limit: self.options.max_entities,
            });
        }
        Ok(count)
    }
}
