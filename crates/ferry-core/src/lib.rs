//! ferry-core
//!
//! Offline-aware operation execution: run an operation now, or persist it
//! and replay it in order once connectivity returns.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（OperationType, QueuedOperation, OperationId, errors）
//! - **ports**: 抽象化レイヤー（KeyValueStore, ConnectivitySource, Clock, IdGenerator）
//! - **impls**: ports の実装（InMemoryStore, JsonFileStore, ManualConnectivity）
//! - **typed**: 型付き Operation API（Operation trait, Handler trait, OperationRegistry）
//! - **queue**: 永続キューと replay sweep
//! - **app**: OfflineQueue, OfflineQueueBuilder, ConnectivityMonitor

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod queue;
pub mod typed;

pub use app::{
    BuildError, ConnectivityMonitor, OfflineQueue, OfflineQueueBuilder, OfflineQueueConfig,
};
pub use domain::{ExecuteError, HandlerError, OperationType, QueuedOperation, StoreError};
pub use queue::SweepReport;
pub use typed::{Handler, Operation};
