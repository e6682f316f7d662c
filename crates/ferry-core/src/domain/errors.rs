//! Errors - エラー型と分類
//!
//! - `ExecuteError`: `execute_operation` の呼び出し元に返るエラー
//! - `HandlerError`: replay handler の失敗（呼び出し元には返らない、ログのみ）
//! - `StoreError`: KeyValueStore の失敗

use thiserror::Error;

/// HandlerError の分類
///
/// Replay treats both kinds the same way (halt the sweep, retry at the next
/// online signal). The kind only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
}

/// Failure reported by a replay handler.
#[derive(Debug)]
pub struct HandlerError {
    kind: ErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Transient,
            message: message.into(),
            source: None,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Permanent,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for HandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler failed (kind: {:?}): {}", self.kind, self.message)
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// KeyValueStore errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("stored value under key '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Error returned by `execute_operation`.
///
/// `E` is the error type of the caller's attempt function. It is passed
/// through untouched.
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// The attempt ran while online and failed. The operation was queued.
    #[error(transparent)]
    Failed(E),

    /// Offline at call time. The attempt was not run; the operation was queued.
    #[error("offline: operation stored for later replay")]
    QueuedOffline,

    /// The attempt ran while online and failed, and the operation could not
    /// be written to the offline queue either.
    #[error("{error} (operation not queued: {store})")]
    FailedNotQueued {
        error: E,
        #[source]
        store: StoreError,
    },

    /// Offline at call time and the operation could not be written to the
    /// offline queue.
    #[error("failed to persist operation: {0}")]
    Storage(#[source] StoreError),

    /// The typed operation could not be serialized into a payload.
    #[error("failed to encode operation payload: {0}")]
    Payload(#[source] serde_json::Error),
}

impl<E> ExecuteError<E> {
    /// True when the operation is sitting in the offline queue.
    pub fn is_queued(&self) -> bool {
        matches!(self, ExecuteError::Failed(_) | ExecuteError::QueuedOffline)
    }

    /// The attempt error, if the attempt ran and failed.
    pub fn into_failure(self) -> Option<E> {
        match self {
            ExecuteError::Failed(e) | ExecuteError::FailedNotQueued { error: e, .. } => Some(e),
            _ => None,
        }
    }
}
