//! Handler trait - replay 時に operation を実行する Handler の定義
//!
//! # 二層構造
//! - **表層（Typed）**: `Handler<T: Operation>` - payload は decode 済み
//! - **内部（Dyn）**: `DynHandler` - object-safe, `serde_json::Value` を受け取る
//!
//! `TypedHandler<T, H>` と `FnHandler<F>` が DynHandler への変換を担います。

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use super::codec::PayloadCodec;
use super::operation::Operation;
use crate::domain::HandlerError;

/// Handler は replay された Operation を実行する
///
/// ```ignore
/// struct SaveNoteHandler { api: ApiClient }
///
/// #[async_trait]
/// impl Handler<SaveNote> for SaveNoteHandler {
///     async fn handle(&self, op: SaveNote) -> Result<(), HandlerError> {
///         self.api.save(op).await.map_err(|e| HandlerError::new(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<T: Operation>: Send + Sync {
    async fn handle(&self, operation: T) -> Result<(), HandlerError>;
}

/// Object-safe handler stored in the registry.
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<(), HandlerError>;
}

pub struct TypedHandler<T: Operation, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<T>,
}

impl<T: Operation, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: Operation, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<(), HandlerError> {
        let operation: T = PayloadCodec::decode(payload)?;
        self.handler.handle(operation).await
    }
}

/// Adapts an async closure over the raw payload.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, Fut> DynHandler for FnHandler<F>
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle_dyn(&self, payload: serde_json::Value) -> Result<(), HandlerError> {
        (self.f)(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typed::operation::fixtures::CreateNote;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Handler<CreateNote> for RecordingHandler {
        async fn handle(&self, operation: CreateNote) -> Result<(), HandlerError> {
            self.seen.lock().unwrap().push(operation.title);
            Ok(())
        }
    }

    #[tokio::test]
    async fn typed_handler_decodes_payload() {
        let typed = TypedHandler::<CreateNote, _>::new(RecordingHandler::default());
        typed.handle_dyn(json!({"title": "a"})).await.unwrap();
        assert_eq!(*typed.handler.seen.lock().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn typed_handler_fails_on_bad_payload() {
        let typed = TypedHandler::<CreateNote, _>::new(RecordingHandler::default());
        assert!(typed.handle_dyn(json!(42)).await.is_err());
        assert!(typed.handler.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fn_handler_passes_payload_through() {
        let handler = FnHandler::new(|payload: serde_json::Value| async move {
            if payload == json!(1) {
                Ok(())
            } else {
                Err(HandlerError::new("unexpected payload"))
            }
        });
        assert!(handler.handle_dyn(json!(1)).await.is_ok());
        assert!(handler.handle_dyn(json!(2)).await.is_err());
    }
}
