//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **OfflineQueueBuilder**: 構築とワイヤリング
//! - **OfflineQueue**: execute / register / replay
//! - **ConnectivityMonitor**: 接続状態の購読

pub mod builder;
pub mod config;
pub mod manager;
pub mod monitor;

pub use self::builder::{BuildError, OfflineQueueBuilder};
pub use self::config::{DEFAULT_STORAGE_KEY, OfflineQueueConfig};
pub use self::manager::OfflineQueue;
pub use self::monitor::{ConnectivityMonitor, StatusStream};
