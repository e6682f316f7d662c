//! Operation trait - 型付き operation の定義
//!
//! operation type の文字列と payload の型を対応付けて、
//! typo を型で排除します。

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Operation は operation type と payload 型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct SaveNote {
///     id: u64,
///     body: String,
/// }
///
/// impl Operation for SaveNote {
///     const TYPE: &'static str = "notes.save.v1";
/// }
/// ```
///
/// `Serialize` は queue への保存、`DeserializeOwned` は replay 時の復元に使います。
pub trait Operation: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Registry key and the persisted `type` field.
    const TYPE: &'static str;
}
