//! # Client configuration.
//!
//! [`ClientConfig`] centralizes the subscriber-side policy knobs: tap channel
//! capacity, the handler-required rule, and the dispatch concurrency mode.
//!
//! # Example
//! ```
//! use omnibus::{ClientConfig, DispatchMode};
//!
//! let mut cfg = ClientConfig::default();
//! cfg.handler_required = true;
//! cfg.dispatch_mode = DispatchMode::Ordered;
//!
//! assert_eq!(cfg.tap_capacity, 1024);
//! ```

/// Concurrency policy for invoking the handlers resolved for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// All resolved handlers are started together; dispatch completes when
    /// every one of them has finished. No ordering between handlers.
    #[default]
    Concurrent,
    /// Handlers run sequentially in pattern-registration order.
    Ordered,
}

/// Policy knobs for a subscriber.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Capacity of the inbound and unhandled event taps (clamped to >= 1).
    pub tap_capacity: usize,
    /// When true, subscribing without a direct or fallback handler fails with
    /// `HandlerNotFound` instead of degrading to a no-op at delivery time.
    pub handler_required: bool,
    /// Concurrency policy for handler fan-out.
    pub dispatch_mode: DispatchMode,
}

impl Default for ClientConfig {
    /// Provides a default configuration:
    /// - `tap_capacity = 1024`
    /// - `handler_required = false`
    /// - `dispatch_mode = DispatchMode::Concurrent`
    fn default() -> Self {
        Self {
            tap_capacity: 1024,
            handler_required: false,
            dispatch_mode: DispatchMode::default(),
        }
    }
}
