//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(String, Event) -> Fut` into the
//! [`Handle`] capability, producing a fresh future per delivered event. The
//! adaptation happens once, at construction; dispatch treats the result like
//! any other handler.
//!
//! Synchronous callbacks are normalized to the same asynchronous contract via
//! [`sync_handler`].
//!
//! ## Example
//! ```
//! use omnibus::{HandlerFn, HandlerRef, Event};
//!
//! let counter: HandlerRef = HandlerFn::arc("counter", |topic: String, event: Event| async move {
//!     println!("{topic}: {}", event.identifier());
//!     Ok(())
//! });
//!
//! assert_eq!(counter.name(), "counter");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future;

use crate::error::HandlerError;
use crate::event::Event;
use crate::handler::handle::{Handle, HandlerRef};

/// Function-backed handler implementation.
///
/// The closure receives owned copies of the topic and event (events are cheap
/// to clone; the payload sits behind an `Arc`), so the produced future has no
/// borrowed state.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F, Fut> HandlerFn<F>
where
    F: Fn(String, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> HandlerRef {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Handle for HandlerFn<F>
where
    F: Fn(String, Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn handle(&self, topic: &str, event: &Event) -> Result<(), HandlerError> {
        (self.f)(topic.to_owned(), event.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Adapts a synchronous callback into a [`HandlerRef`].
///
/// The callback runs inline on the dispatching task; keep it short and
/// non-blocking.
///
/// # Example
/// ```
/// use omnibus::sync_handler;
///
/// let h = sync_handler("printer", |topic, event| {
///     println!("{topic}: {}", event.identifier());
///     Ok(())
/// });
/// assert_eq!(h.name(), "printer");
/// ```
pub fn sync_handler<F>(name: impl Into<Cow<'static, str>>, f: F) -> HandlerRef
where
    F: Fn(&str, &Event) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    HandlerFn::arc(name, move |topic: String, event: Event| {
        future::ready(f(&topic, &event))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn async_closure_is_adapted() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let handler = HandlerFn::arc("hits", move |_topic: String, _event: Event| {
            let counted = Arc::clone(&counted);
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let event = Event::new("p", None);
        handler.handle("t", &event).await.unwrap();
        handler.handle("t", &event).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sync_callback_is_normalized() {
        let handler = sync_handler("strict", |topic, _event| {
            if topic == "allowed" {
                Ok(())
            } else {
                Err(HandlerError::new("wrong topic"))
            }
        });

        let event = Event::new("p", None);
        assert!(handler.handle("allowed", &event).await.is_ok());
        assert!(handler.handle("denied", &event).await.is_err());
    }
}
