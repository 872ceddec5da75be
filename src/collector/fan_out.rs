use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::CollectError;
use crate::rpc::CallContext;

/// Ограничения одного раунда параллельных вызовов
#[derive(Debug, Clone)]
pub struct FanOutOptions {
    /// Сколько блокирующих вызовов может выполняться одновременно
    pub max_in_flight: usize,
    /// Крайний срок одного удалённого вызова
    pub call_timeout: Duration,
    /// Верхняя граница количества миньпулов, которое мы готовы обойти
    pub max_entities: usize,
}

impl Default for FanOutOptions {
    fn default() -> Self {
        Self {
            max_in_flight: 32,
            call_timeout: Duration::from_secs(10),
            max_entities: 10_000,
        }
    }
}

type Event<K, V> = Result<(K, V), CollectError>;

/// Группа параллельных блокирующих вызовов с политикой "первая ошибка побеждает".
///
/// Каждая задача публикует ровно одно событие: пару `(ключ, значение)` или
/// ошибку. [`FanOut::collect`] принимает события в порядке завершения и
/// при первой ошибке отменяет токен группы и снимает оставшиеся задачи.
pub struct FanOut<K, V> {
    set: JoinSet<Event<K, V>>,
    cancel: CancellationToken,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl<K, V> FanOut<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    pub fn new(parent: &CancellationToken, options: &FanOutOptions) -> Self {
        Self {
            set: JoinSet::new(),
            cancel: parent.child_token(),
            permits: Arc::new(Semaphore::new(options.max_in_flight.max(1))),
            call_timeout: options.call_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Запускает один блокирующий вызов `job` под ключом `key`
    pub fn spawn<F>(&mut self, context: &'static str, key: K, job: F)
    where
        F: FnOnce(&CallContext) -> Result<V, CollectError> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let permits = Arc::clone(&self.permits);
        let call_timeout = self.call_timeout;

        self.set.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CollectError::Cancelled),
                permit = permits.acquire_owned() => {
                    permit.map_err(|_| CollectError::Cancelled)?
                }
            };

            let ctx = CallContext::with_timeout(cancel.clone(), call_timeout);
            let worker = tokio::task::spawn_blocking(move || job(&ctx));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(CollectError::Cancelled),
                joined = timeout(call_timeout, worker) => match joined {
                    Ok(Ok(result)) => result.map(|value| (key, value)),
                    Ok(Err(e)) => Err(CollectError::Worker(e.to_string())),
                    Err(_) => Err(CollectError::Timeout {
                        context,
                        timeout: call_timeout,
                    }),
                },
            }
        });
    }

    /// Собирает все события, передавая успешные в `fold`.
    ///
    /// Возвращает число принятых событий. Первая ошибка (задачи или `fold`)
    /// прерывает сборку; незавершённые задачи отменяются при выходе.
    pub async fn collect<F>(mut self, mut fold: F) -> Result<usize, CollectError>
    where
        F: FnMut(K, V) -> Result<(), CollectError>,
    {
        let _abandon = self.cancel.clone().drop_guard();
        let expected = self.set.len();
        let mut received = 0usize;

        while let Some(joined) = self.set.join_next().await {
            let event = joined
                .map_err(|e| CollectError::Worker(e.to_string()))
                .and_then(|event| event);

            match event {
                Ok((key, value)) => {
                    fold(key, value)?;
                    received += 1;
                }
                Err(err) => {
                    warn!(received, expected, error = %err, "fan-out aborted on first failure");
                    return Err(err);
                }
            }
        }

        debug!(received, expected, "fan-out complete");
        Ok(received)
    }
}

/// Один блокирующий вызов с теми же отменой и крайним сроком, что и у группы
pub async fn call_one<V, F>(
    parent: &CancellationToken,
    options: &FanOutOptions,
    context: &'static str,
    job: F,
) -> Result<V, CollectError>
where
    V: Send + 'static,
    F: FnOnce(&CallContext) -> Result<V, CollectError> + Send + 'static,
{
    let mut fan_out = FanOut::new(parent, options);
    fan_out.spawn(context, (), job);

    let mut out = None;
    fan_out
        .collect(|(), value| {
            out = Some(value);
            Ok(())
        })
        .await?;
    out.ok_or(CollectError::Incomplete(context))
}
