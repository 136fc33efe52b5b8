//! # Event handler trait.
//!
//! [`Handle`] is the capability invoked with `(topic, event)` when a
//! subscription matches. The common handle type is [`HandlerRef`], an
//! `Arc<dyn Handle>` suitable for sharing across dispatch fan-outs.
//!
//! There are exactly two ways to obtain a handler, both resolved once at
//! registration time and never inspected again at dispatch time:
//!
//! - implement `Handle` on your own type (stateful handlers),
//! - adapt a function with [`HandlerFn`](crate::HandlerFn) or
//!   [`sync_handler`](crate::sync_handler).
//!
//! ## Implementation requirements
//! - Use async I/O; avoid blocking the executor.
//! - Return a [`HandlerError`] for recoverable failures; the dispatcher
//!   isolates it from sibling handlers and reports it in the aggregate.
//! - Panics are caught by the dispatcher and converted into failures.
//!
//! ## Example
//! ```
//! use async_trait::async_trait;
//! use omnibus::{Event, Handle, HandlerError};
//!
//! struct Auditor;
//!
//! #[async_trait]
//! impl Handle for Auditor {
//!     async fn handle(&self, topic: &str, event: &Event) -> Result<(), HandlerError> {
//!         println!("audit: {} on {}", event.identifier(), topic);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "auditor" }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::event::Event;

/// Shared handle to an event handler.
pub type HandlerRef = Arc<dyn Handle>;

/// Capability invoked for each event delivered to a matching subscription.
#[async_trait]
pub trait Handle: Send + Sync + 'static {
    /// Processes one event delivered on `topic`.
    ///
    /// A returned error is collected by the dispatcher and reported in the
    /// dispatch aggregate; it never aborts sibling handlers.
    async fn handle(&self, topic: &str, event: &Event) -> Result<(), HandlerError>;

    /// Returns the handler name used in logs and failure reports.
    ///
    /// Prefer short, descriptive names. The default uses
    /// `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
