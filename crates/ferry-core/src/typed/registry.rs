//! OperationRegistry - replay handler の登録と管理
//!
//! - operation type → `Arc<dyn DynHandler>` の HashMap
//! - 同じ type を二度登録すると後勝ち（上書き）

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::handler::{DynHandler, FnHandler, Handler, TypedHandler};
use super::operation::Operation;
use crate::domain::{HandlerError, OperationType};

#[derive(Default)]
pub struct OperationRegistry {
    handlers: HashMap<OperationType, Arc<dyn DynHandler>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `op_type`, replacing any previous handler.
    ///
    /// Returns the replaced handler, if there was one.
    pub fn register_operation(
        &mut self,
        op_type: impl Into<OperationType>,
        handler: Arc<dyn DynHandler>,
    ) -> Option<Arc<dyn DynHandler>> {
        self.handlers.insert(op_type.into(), handler)
    }

    pub fn register<T: Operation, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Option<Arc<dyn DynHandler>> {
        self.register_operation(T::TYPE, Arc::new(TypedHandler::<T, H>::new(handler)))
    }

    pub fn register_fn<F, Fut>(
        &mut self,
        op_type: impl Into<OperationType>,
        f: F,
    ) -> Option<Arc<dyn DynHandler>>
    where
        F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.register_operation(op_type, Arc::new(FnHandler::new(f)))
    }

    pub fn get(&self, op_type: &OperationType) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(op_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<OperationType> {
        let mut types: Vec<OperationType> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
