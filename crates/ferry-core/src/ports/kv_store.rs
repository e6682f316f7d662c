//! KeyValueStore port - 永続化の抽象化
//!
//! ブラウザの localStorage やモバイルの preferences など、
//! 「キーで取得・キーで上書き」だけを提供するストアを想定しています。
//! append のようなプリミティブは前提にしません。

use async_trait::async_trait;

use crate::domain::StoreError;

/// Generic get/set-by-key persistence.
///
/// `set` overwrites the whole value for `key`. Atomicity of a single `set`
/// is whatever the implementation provides.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key was never set (or was removed).
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;
}
