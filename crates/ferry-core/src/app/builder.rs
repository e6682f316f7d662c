//! OfflineQueueBuilder - OfflineQueue の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - expect_operations() で replay handler が必要な operation type を宣言
//! - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - 不足があれば BuildError を返す（replay 時に黙って捨てられるのを防ぐ）

use std::future::Future;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::config::OfflineQueueConfig;
use super::manager::{Inner, OfflineQueue};
use super::monitor::ConnectivityMonitor;
use crate::domain::{HandlerError, OperationType};
use crate::ports::{
    Clock, ConnectivitySource, IdGenerator, KeyValueStore, SystemClock, UlidGenerator,
};
use crate::queue::PersistedQueue;
use crate::typed::{DynHandler, Handler, Operation, OperationRegistry};

/// ```ignore
/// let queue = OfflineQueueBuilder::new(store, connectivity)
///     .register::<SaveNote, _>(SaveNoteHandler::new(api))
///     .expect_operations(&[SaveNote::TYPE])
///     .build()?;
/// ```
pub struct OfflineQueueBuilder {
    store: Arc<dyn KeyValueStore>,
    source: Arc<dyn ConnectivitySource>,
    config: OfflineQueueConfig,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    registry: OperationRegistry,
    expected_operations: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing replay handlers for operation types: {0:?}")]
    MissingOperationTypes(Vec<String>),
}

impl OfflineQueueBuilder {
    pub fn new(store: Arc<dyn KeyValueStore>, source: Arc<dyn ConnectivitySource>) -> Self {
        Self {
            store,
            source,
            config: OfflineQueueConfig::default(),
            clock: Arc::new(SystemClock),
            ids: None,
            registry: OperationRegistry::new(),
            expected_operations: None,
        }
    }

    pub fn config(mut self, config: OfflineQueueConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock for `enqueued_at`. Also drives the default ID generator.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn register<O: Operation, H: Handler<O> + 'static>(mut self, handler: H) -> Self {
        self.registry.register::<O, H>(handler);
        self
    }

    pub fn register_operation(
        mut self,
        op_type: impl Into<OperationType>,
        handler: Arc<dyn DynHandler>,
    ) -> Self {
        self.registry.register_operation(op_type, handler);
        self
    }

    pub fn register_fn<F, Fut>(mut self, op_type: impl Into<OperationType>, f: F) -> Self
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.registry.register_fn(op_type, f);
        self
    }

    pub fn expect_operations(mut self, op_types: &[&str]) -> Self {
        self.expected_operations = Some(op_types.iter().map(|t| t.to_string()).collect());
        self
    }

    /// Validate and start. Spawns the connectivity listener, so this must be
    /// called inside a tokio runtime.
    pub fn build(self) -> Result<OfflineQueue, BuildError> {
        if let Some(expected) = &self.expected_operations {
            let missing: Vec<String> = expected
                .iter()
                .filter(|t| self.registry.get(&OperationType::new(t.as_str())).is_none())
                .cloned()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingOperationTypes(missing));
            }
        }

        let ids: Arc<dyn IdGenerator> = match self.ids {
            Some(ids) => ids,
            None => Arc::new(UlidGenerator::new(ClockRef(Arc::clone(&self.clock)))),
        };
        let (reports, _) = broadcast::channel(self.config.report_buffer.max(1));

        let inner = Inner {
            monitor: ConnectivityMonitor::new(self.source),
            queue: PersistedQueue::new(self.store, self.config.storage_key.clone()),
            registry: RwLock::new(self.registry),
            clock: self.clock,
            ids,
            sweep_lock: tokio::sync::Mutex::new(()),
            reports,
            shutdown: CancellationToken::new(),
        };
        tracing::debug!(
            storage_key = %self.config.storage_key,
            replay_on_start = self.config.replay_on_start,
            "offline queue starting"
        );
        Ok(OfflineQueue::start(inner, self.config.replay_on_start))
    }
}

/// Lets the default `UlidGenerator` share the builder's clock.
struct ClockRef(Arc<dyn Clock>);

impl Clock for ClockRef {
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.0.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::{InMemoryStore, ManualConnectivity};

    fn builder() -> OfflineQueueBuilder {
        OfflineQueueBuilder::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualConnectivity::new(false)),
        )
    }

    #[tokio::test]
    async fn build_success() {
        let queue = builder()
            .register_fn("A", |_| async { Ok(()) })
            .expect_operations(&["A"])
            .build();
        assert!(queue.is_ok());
    }

    #[tokio::test]
    async fn build_missing_operation_types() {
        let queue = builder()
            .register_fn("A", |_| async { Ok(()) })
            .expect_operations(&["A", "B"])
            .build();
        assert!(matches!(
            queue,
            Err(BuildError::MissingOperationTypes(missing)) if missing == vec!["B".to_string()]
        ));
    }

    #[tokio::test]
    async fn build_without_expectations() {
        let queue = builder().build().unwrap();
        assert!(queue.registered_types().is_empty());
        assert!(!queue.check_internet());
    }
}
