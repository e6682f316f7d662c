use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::OperationId;

/// Operation category. Only used as the key for replay handler lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationType(String);

impl OperationType {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for OperationType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OperationType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One deferred unit of work, as persisted in the offline queue.
///
/// Persisted shape: `{"type": ..., "payload": ..., "id": ..., "enqueued_at": ...}`.
/// `id` and `enqueued_at` are optional on read so bare `{type, payload}`
/// entries written by other clients still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedOperation {
    #[serde(rename = "type")]
    op_type: OperationType,

    payload: serde_json::Value,

    #[serde(default, skip_serializing_if = "OperationId::is_nil")]
    id: OperationId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    enqueued_at: Option<DateTime<Utc>>,
}

impl QueuedOperation {
    pub fn new(
        id: OperationId,
        op_type: OperationType,
        payload: serde_json::Value,
        enqueued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            op_type,
            payload,
            id,
            enqueued_at: Some(enqueued_at),
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn op_type(&self) -> &OperationType {
        &self.op_type
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn enqueued_at(&self) -> Option<DateTime<Utc>> {
        self.enqueued_at
    }

    /// Same entry as `other`.
    ///
    /// Entries with an ID compare by ID. Legacy entries without one fall back
    /// to comparing type and payload.
    pub fn is_same_entry(&self, other: &QueuedOperation) -> bool {
        if !self.id.is_nil() || !other.id.is_nil() {
            return self.id == other.id;
        }
        self.op_type == other.op_type && self.payload == other.payload
    }
}
