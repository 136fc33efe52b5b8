//! # Subscription dispatch engine.
//!
//! [`Dispatcher`] resolves, for an inbound event on a topic, which handlers
//! must run and under what concurrency policy.
//!
//! ## Resolution
//! ```text
//! inbound (topic, event)
//!     │
//!     ├─► match topic against every registered pattern (pluggable matcher)
//!     │
//!     ├─► no pattern matched ──────────► unhandled tap, done
//!     │
//!     └─► per matching binding:
//!           explicit handler ─► run it
//!           else fallback    ─► run fallback
//!           else             ─► skip silently (handler_required = false only)
//! ```
//!
//! ## Precedence (fixed, documented)
//! `handler_required` wins over fallback; fallback wins over silent skip.
//! A subscribe call with neither a direct nor a fallback handler fails with
//! `HandlerNotFound` when `handler_required` is set, and otherwise records the
//! absence with a warning.
//!
//! ## Concurrency
//! [`DispatchMode::Concurrent`] starts every resolved handler and joins all of
//! them; completion of `dispatch` is the join barrier. [`DispatchMode::Ordered`]
//! runs handlers sequentially in registration order. In both modes a handler
//! failure (error or panic) is collected and reported in the aggregate; it
//! never prevents the remaining handlers from running.

use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::DispatchMode;
use crate::dispatch::matcher::MatcherRef;
use crate::dispatch::tap::EventTap;
use crate::error::{ClientError, DispatchError, HandlerError, HandlerFailure};
use crate::event::Event;
use crate::handler::HandlerRef;

/// One registered pattern with its optional handler.
///
/// An absent handler means "use the fallback"; registration order is the
/// tie-break order for ordered dispatch.
struct Binding {
    pattern: String,
    handler: Option<HandlerRef>,
}

/// Per-subscriber handler table and fan-out engine.
pub struct Dispatcher {
    bindings: RwLock<Vec<Binding>>,
    fallback: Option<HandlerRef>,
    matcher: MatcherRef,
    handler_required: bool,
    mode: DispatchMode,
    unhandled: EventTap,
}

impl Dispatcher {
    /// Creates a dispatcher with the given policy knobs.
    pub fn new(
        matcher: MatcherRef,
        fallback: Option<HandlerRef>,
        handler_required: bool,
        mode: DispatchMode,
        unhandled: EventTap,
    ) -> Self {
        Self {
            bindings: RwLock::new(Vec::new()),
            fallback,
            matcher,
            handler_required,
            mode,
            unhandled,
        }
    }

    /// Validates a subscription before any transport action runs.
    ///
    /// Fails with [`ClientError::HandlerNotFound`] when a handler is required
    /// and neither a direct nor a fallback handler is available.
    pub fn validate(&self, topic: &str, handler: Option<&HandlerRef>) -> Result<(), ClientError> {
        if handler.is_none() && self.fallback.is_none() {
            if self.handler_required {
                return Err(ClientError::HandlerNotFound {
                    topic: topic.to_owned(),
                });
            }
            warn!(
                topic,
                "subscribing without a handler; events will only surface on the taps"
            );
        }
        Ok(())
    }

    /// Registers (or replaces) the handler association for a pattern.
    ///
    /// Re-binding an existing pattern replaces its handler in place, keeping
    /// the original registration position.
    pub async fn bind(&self, pattern: &str, handler: Option<HandlerRef>) {
        let mut bindings = self.bindings.write().await;
        if let Some(existing) = bindings.iter_mut().find(|b| b.pattern == pattern) {
            existing.handler = handler;
        } else {
            bindings.push(Binding {
                pattern: pattern.to_owned(),
                handler,
            });
        }
    }

    /// Removes the binding for `topic`, or every binding when `topic` is `None`.
    ///
    /// Unbinding an unregistered topic is a no-op, not an error.
    pub async fn unbind(&self, topic: Option<&str>) {
        let mut bindings = self.bindings.write().await;
        match topic {
            Some(topic) => bindings.retain(|b| b.pattern != topic),
            None => bindings.clear(),
        }
    }

    /// Number of registered pattern bindings.
    pub async fn len(&self) -> usize {
        self.bindings.read().await.len()
    }

    /// True when no pattern is registered.
    pub async fn is_empty(&self) -> bool {
        self.bindings.read().await.is_empty()
    }

    /// Observer for events that matched no registered pattern.
    pub fn observe_unhandled(&self) -> tokio::sync::broadcast::Receiver<(String, Event)> {
        self.unhandled.observe()
    }

    /// Resolves and invokes the handlers for an inbound event.
    ///
    /// Completion is a join barrier over the fan-out: every resolved handler
    /// has finished (or failed) when this returns. Failures are aggregated
    /// into a [`DispatchError`]; an event matching no pattern surfaces on the
    /// unhandled tap and yields `Ok`.
    pub async fn dispatch(&self, topic: &str, event: &Event) -> Result<(), DispatchError> {
        let selected = {
            let bindings = self.bindings.read().await;
            let mut matched_any = false;
            let mut selected: Vec<(String, HandlerRef)> = Vec::new();
            for binding in bindings.iter() {
                if !self.matcher.matches(&binding.pattern, topic) {
                    continue;
                }
                matched_any = true;
                match binding.handler.clone().or_else(|| self.fallback.clone()) {
                    Some(handler) => selected.push((binding.pattern.clone(), handler)),
                    None => debug!(
                        topic,
                        pattern = %binding.pattern,
                        "no handler bound and no fallback; skipping"
                    ),
                }
            }
            if !matched_any {
                debug!(topic, event = %event.identifier(), "unhandled event");
                self.unhandled.publish(topic, event);
                return Ok(());
            }
            selected
        };

        let failures = match self.mode {
            DispatchMode::Concurrent => {
                let invocations = selected
                    .iter()
                    .map(|(pattern, handler)| invoke(handler, pattern, topic, event));
                join_all(invocations).await.into_iter().flatten().collect()
            }
            DispatchMode::Ordered => {
                let mut failures = Vec::new();
                for (pattern, handler) in &selected {
                    if let Some(failure) = invoke(handler, pattern, topic, event).await {
                        failures.push(failure);
                    }
                }
                failures
            }
        };

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DispatchError { failures })
        }
    }
}

/// Runs one handler, converting errors and panics into a reportable failure.
async fn invoke(
    handler: &HandlerRef,
    pattern: &str,
    topic: &str,
    event: &Event,
) -> Option<HandlerFailure> {
    let fut = handler.handle(topic, event);
    let error = match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
        Ok(Ok(())) => return None,
        Ok(Err(error)) => error,
        Err(panic) => HandlerError::new(format!("panicked: {}", panic_message(panic.as_ref()))),
    };
    warn!(
        topic,
        handler = handler.name(),
        error = %error,
        "handler failed"
    );
    Some(HandlerFailure {
        handler: handler.name().to_owned(),
        pattern: pattern.to_owned(),
        error,
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
