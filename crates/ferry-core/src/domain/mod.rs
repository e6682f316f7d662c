//! Domain model (operation, ids, errors).

pub mod errors;
pub mod ids;
pub mod operation;

pub use self::errors::{ErrorKind, ExecuteError, HandlerError, StoreError};
pub use self::ids::OperationId;
pub use self::operation::{OperationType, QueuedOperation};
