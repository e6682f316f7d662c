//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore**: テスト用・開発用の KeyValueStore
//! - **JsonFileStore**: 単一 JSON ファイルの KeyValueStore
//! - **ManualConnectivity**: 手動で切り替える ConnectivitySource

pub mod file_store;
pub mod inmem_store;
pub mod manual_connectivity;

pub use self::file_store::JsonFileStore;
pub use self::inmem_store::InMemoryStore;
pub use self::manual_connectivity::ManualConnectivity;
