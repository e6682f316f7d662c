//! OfflineQueue - offline 対応の operation 実行と replay
//!
//! # execute_operation
//! - online: attempt を実行。失敗したら queue に積んでから元のエラーを返す
//! - offline: attempt は実行せず queue に積み、`QueuedOffline` を返す
//!
//! # replay
//! ConnectivityMonitor から `true` を受け取るたびに sweep を 1 回実行します。
//! sweep は同時に 1 つだけ（`sweep_lock`）。

use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::monitor::{ConnectivityMonitor, StatusStream};
use crate::domain::{ExecuteError, HandlerError, OperationType, QueuedOperation, StoreError};
use crate::ports::{Clock, IdGenerator};
use crate::queue::{PersistedQueue, SweepReport};
use crate::typed::{DynHandler, Handler, Operation, OperationRegistry, PayloadCodec};

pub(crate) struct Inner {
    pub(crate) monitor: ConnectivityMonitor,
    pub(crate) queue: PersistedQueue,
    pub(crate) registry: RwLock<OperationRegistry>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) sweep_lock: tokio::sync::Mutex<()>,
    pub(crate) reports: broadcast::Sender<SweepReport>,
    pub(crate) shutdown: CancellationToken,
}

impl Inner {
    fn lookup(&self, op_type: &OperationType) -> Option<Arc<dyn DynHandler>> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(op_type)
    }

    async fn enqueue(
        &self,
        op_type: OperationType,
        payload: serde_json::Value,
    ) -> Result<(), StoreError> {
        let operation = QueuedOperation::new(
            self.ids.generate_operation_id(),
            op_type,
            payload,
            self.clock.now(),
        );
        let op_id = operation.id();
        let len = self.queue.append(operation).await?;
        tracing::debug!(%op_id, queue_len = len, "operation persisted to offline queue");
        Ok(())
    }

    /// `cancel` is checked between entries; the listener passes the shutdown
    /// token, a manual sync passes one that never fires.
    async fn sync(&self, cancel: &CancellationToken) -> Result<SweepReport, StoreError> {
        let _guard = self.sweep_lock.lock().await;
        tracing::info!("replay sweep started");

        let report = crate::queue::sweep(&self.queue, |t| self.lookup(t), cancel).await?;

        tracing::info!(
            replayed = report.replayed,
            skipped = report.skipped,
            halted = report.is_halted(),
            "replay sweep finished"
        );
        // no report subscribers is fine
        let _ = self.reports.send(report.clone());
        Ok(report)
    }

    async fn listen(self: Arc<Self>, mut statuses: StatusStream, replay_on_start: bool) {
        let mut first = true;
        loop {
            let status = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                status = statuses.next() => status,
            };
            let Some(online) = status else {
                tracing::debug!("connectivity source closed, listener exiting");
                break;
            };

            let initial = std::mem::replace(&mut first, false);
            tracing::debug!(online, initial, "connectivity status");
            if !online || (initial && !replay_on_start) {
                continue;
            }

            if let Err(e) = self.sync(&self.shutdown).await {
                tracing::error!(error = %e, "replay sweep aborted by storage error");
            }
        }
    }
}

/// Offline-aware operation executor.
///
/// Built with [`OfflineQueueBuilder`](super::OfflineQueueBuilder). Listens
/// for connectivity changes until [`shutdown`](Self::shutdown) is called or
/// the value is dropped.
pub struct OfflineQueue {
    inner: Arc<Inner>,
    listener: Mutex<Option<JoinHandle<()>>>,
    _cancel_on_drop: DropGuard,
}

impl OfflineQueue {
    /// Spawns the connectivity listener. Must run inside a tokio runtime.
    pub(crate) fn start(inner: Inner, replay_on_start: bool) -> Self {
        let inner = Arc::new(inner);
        let statuses = inner.monitor.subscribe();
        let listener = tokio::spawn(Arc::clone(&inner).listen(statuses, replay_on_start));
        let cancel_on_drop = inner.shutdown.clone().drop_guard();
        Self {
            inner,
            listener: Mutex::new(Some(listener)),
            _cancel_on_drop: cancel_on_drop,
        }
    }

    pub fn check_internet(&self) -> bool {
        self.inner.monitor.check_internet()
    }

    pub fn is_online(&self) -> bool {
        self.check_internet()
    }

    /// Run `attempt` now if online; queue the operation for replay otherwise
    /// or when the attempt fails.
    pub async fn execute_operation<T, E, F, Fut>(
        &self,
        op_type: impl Into<OperationType>,
        payload: serde_json::Value,
        attempt: F,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let op_type = op_type.into();

        if !self.check_internet() {
            self.inner
                .enqueue(op_type.clone(), payload)
                .await
                .map_err(|e| {
                    tracing::error!(%op_type, error = %e, "offline and failed to queue operation");
                    ExecuteError::Storage(e)
                })?;
            tracing::info!(%op_type, "offline, operation stored for later replay");
            return Err(ExecuteError::QueuedOffline);
        }

        tracing::debug!(%op_type, "attempting operation");
        match attempt().await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Err(store) = self.inner.enqueue(op_type.clone(), payload).await {
                    tracing::error!(
                        %op_type,
                        error = %err,
                        store_error = %store,
                        "operation failed and could not be queued"
                    );
                    return Err(ExecuteError::FailedNotQueued { error: err, store });
                }
                tracing::warn!(%op_type, error = %err, "operation failed, queued for replay");
                Err(ExecuteError::Failed(err))
            }
        }
    }

    /// Typed form of [`execute_operation`](Self::execute_operation).
    pub async fn execute<O, T, E, F, Fut>(
        &self,
        operation: &O,
        attempt: F,
    ) -> Result<T, ExecuteError<E>>
    where
        O: Operation,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let payload = PayloadCodec::encode(operation).map_err(ExecuteError::Payload)?;
        self.execute_operation(O::TYPE, payload, attempt).await
    }

    /// Register the replay handler for `op_type`. Replaces any earlier one.
    pub fn register_operation(
        &self,
        op_type: impl Into<OperationType>,
        handler: Arc<dyn DynHandler>,
    ) {
        let op_type = op_type.into();
        let replaced = self
            .registry_mut()
            .register_operation(op_type.clone(), handler);
        if replaced.is_some() {
            tracing::debug!(%op_type, "replay handler replaced");
        }
    }

    pub fn register<O: Operation, H: Handler<O> + 'static>(&self, handler: H) {
        self.registry_mut().register::<O, H>(handler);
    }

    pub fn register_fn<F, Fut>(&self, op_type: impl Into<OperationType>, f: F)
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.registry_mut().register_fn(op_type, f);
    }

    pub fn registered_types(&self) -> Vec<OperationType> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .registered_types()
    }

    /// Run a sweep now, regardless of connectivity.
    ///
    /// Still works after [`shutdown`](Self::shutdown); only the background
    /// listener stops.
    pub async fn sync(&self) -> Result<SweepReport, StoreError> {
        self.inner.sync(&CancellationToken::new()).await
    }

    /// Reports of every sweep that finishes from now on.
    pub fn sweep_reports(&self) -> broadcast::Receiver<SweepReport> {
        self.inner.reports.subscribe()
    }

    pub async fn pending_operations(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.inner.queue.load().await
    }

    pub async fn clear_queue(&self) -> Result<(), StoreError> {
        self.inner.queue.clear().await?;
        tracing::info!(key = self.inner.queue.key(), "offline queue cleared");
        Ok(())
    }

    /// Stop listening for connectivity changes and wait for the listener.
    ///
    /// A handler already running is awaited; the background sweep replays no
    /// further entries. Connectivity changes no longer trigger replay.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(listener) = listener
            && let Err(e) = listener.await
        {
            tracing::error!(error = %e, "connectivity listener panicked");
        }
    }

    fn registry_mut(&self) -> std::sync::RwLockWriteGuard<'_, OperationRegistry> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
