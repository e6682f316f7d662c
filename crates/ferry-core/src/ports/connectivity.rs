//! ConnectivitySource port - 接続状態の生シグナル
//!
//! ホスト環境（ブラウザの `online`/`offline` イベント、OS のネットワーク通知など）
//! をこの trait の裏に隠します。

use tokio::sync::broadcast;

/// Raw connectivity signal from the host environment.
pub trait ConnectivitySource: Send + Sync {
    /// Current connectivity flag at the instant of the call.
    fn is_online(&self) -> bool;

    /// Transition events from now on: `true` for "online", `false` for
    /// "offline". Duplicate values are passed through as reported.
    fn subscribe(&self) -> broadcast::Receiver<bool>;
}
