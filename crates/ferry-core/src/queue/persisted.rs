//! PersistedQueue - KeyValueStore 上の FIFO
//!
//! キュー全体（`Vec<QueuedOperation>`）を 1 つのキーに保存します。
//! ストアに append がないので、変更は常に「全体を読む → 変更 → 全体を書く」。
//! この read-modify-write は `lock` で直列化します。

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{QueuedOperation, StoreError};
use crate::ports::KeyValueStore;

pub struct PersistedQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    lock: Mutex<()>,
}

impl PersistedQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot of the persisted queue, head first.
    pub async fn load(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        match self.store.get(&self.key).await? {
            None | Some(serde_json::Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| StoreError::Corrupt {
                key: self.key.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Append to the tail. Returns the queue length after the write.
    pub async fn append(&self, operation: QueuedOperation) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut queue = self.load().await?;
        queue.push(operation);
        self.save(&queue).await?;
        Ok(queue.len())
    }

    /// Remove the head if it is still `expected`.
    ///
    /// Returns false (and writes nothing) when the head is some other entry
    /// or the queue is empty.
    pub async fn remove_head_if(&self, expected: &QueuedOperation) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut queue = self.load().await?;
        match queue.first() {
            Some(head) if head.is_same_entry(expected) => {
                queue.remove(0);
                self.save(&queue).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.save(&[]).await
    }

    async fn save(&self, queue: &[QueuedOperation]) -> Result<(), StoreError> {
        let value = serde_json::to_value(queue)?;
        self.store.set(&self.key, value).await
    }
}
