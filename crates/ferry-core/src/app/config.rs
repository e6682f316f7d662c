//! OfflineQueueConfig - 設定値

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_KEY: &str = "offlineOperations";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineQueueConfig {
    /// Store key holding the whole queue.
    pub storage_key: String,

    /// Sweep when the initial status snapshot is "online".
    pub replay_on_start: bool,

    /// Capacity of the sweep report channel.
    pub report_buffer: usize,
}

impl Default for OfflineQueueConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            replay_on_start: true,
            report_buffer: 16,
        }
    }
}

impl OfflineQueueConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}
