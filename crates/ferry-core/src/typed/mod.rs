//! Typed - 型付き Operation API
//!
//! # 二層構造
//! - **表層（Typed）**: `Operation` trait, `Handler<T>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod codec;
pub mod handler;
pub mod operation;
pub mod registry;

pub use self::codec::PayloadCodec;
pub use self::handler::{DynHandler, FnHandler, Handler, TypedHandler};
pub use self::operation::Operation;
pub use self::registry::OperationRegistry;
