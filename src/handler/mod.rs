//! # Event handlers.
//!
//! The [`Handle`] trait, the function adapters ([`HandlerFn`],
//! [`sync_handler`]) and the schema-bearing variants.

pub mod handle;
pub mod handler_fn;
pub mod schema;

pub use handle::{Handle, HandlerRef};
pub use handler_fn::{sync_handler, HandlerFn};
pub use schema::{SchemaHandle, SchemaHandlerFn};
