//! Domain identifiers.
//!
//! # ULID ベースの ID
//! - **時刻でソート可能**: enqueue 順と ID 順が（同一ミリ秒内を除き）一致する
//! - **分散生成可能**: 端末ごとに調整なしで生成できる
//!
//! The queue itself is ordered by position, not by ID. The ID only lets a
//! replay step confirm that the head it removes is the head it replayed.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one queued operation.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Ulid);

impl OperationId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }

    /// The nil ID, used for entries persisted without one.
    pub fn nil() -> Self {
        Self(Ulid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::nil()
    }
}

impl From<Ulid> for OperationId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_has_prefix() {
        let id = OperationId::from_ulid(Ulid::new());
        assert!(id.to_string().starts_with("op-"));
    }

    #[test]
    fn ids_are_sortable_by_creation_time() {
        let id1 = OperationId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = OperationId::from_ulid(Ulid::new());
        assert!(id1 < id2);
    }

    #[test]
    fn serializes_as_plain_string() {
        let ulid = Ulid::new();
        let id = OperationId::from_ulid(ulid);
        let v = serde_json::to_value(id).unwrap();
        assert_eq!(v, serde_json::Value::String(ulid.to_string()));

        let back: OperationId = serde_json::from_value(v).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn default_is_nil() {
        assert!(OperationId::default().is_nil());
        assert!(!OperationId::from_ulid(Ulid::new()).is_nil());
    }
}
