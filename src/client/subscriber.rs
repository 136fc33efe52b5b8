//! # Subscriber: the inbound half of the client.
//!
//! [`Subscriber`] owns a [`SubscribeTransport`], the handler table
//! ([`Dispatcher`]) and a background receive loop:
//!
//! ```text
//! transport.incoming()
//!     │ (topic, Envelope)
//!     ▼
//! receive loop ──► decode envelope ──► inbound tap ──► dispatcher.dispatch
//!                      │ (CodecError)
//!                      └─► warn + skip (loop keeps running)
//! ```
//!
//! ## Rules
//! - `subscribe`/`unsubscribe` require a connected subscriber.
//! - The transport action runs before the handler table changes, so a
//!   transport failure leaves the table untouched.
//! - A malformed or unknown-typed envelope never terminates the loop.
//! - Handler failures are logged from the loop; they never affect other
//!   events or the transport.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::connector::{ConnectionState, ConnectorCore};
use crate::config::{ClientConfig, DispatchMode};
use crate::dispatch::matcher::ExactMatcher;
use crate::dispatch::{Dispatcher, EventTap, MatcherRef};
use crate::error::ClientError;
use crate::event::{Envelope, Event, PayloadRegistry};
use crate::handler::HandlerRef;
use crate::transport::SubscribeTransport;

/// Lifecycle callbacks around subscription changes.
///
/// Every hook defaults to a no-op. An error from a *before* hook
/// ([`on_subscribing`](Self::on_subscribing),
/// [`on_unsubscribing`](Self::on_unsubscribing)) aborts the operation before
/// the transport is touched.
#[async_trait]
pub trait SubscribeHooks: Send + Sync + 'static {
    /// Runs before interest in a topic is registered with the transport.
    async fn on_subscribing(&self, _topic: &str) -> Result<(), ClientError> {
        Ok(())
    }

    /// Runs after the subscription is active and the handler is bound.
    async fn on_subscribed(&self, _topic: &str) -> Result<(), ClientError> {
        Ok(())
    }

    /// Runs before interest is withdrawn (`None` = all topics).
    async fn on_unsubscribing(&self, _topic: Option<&str>) -> Result<(), ClientError> {
        Ok(())
    }

    /// Runs after the unsubscription took effect.
    async fn on_unsubscribed(&self, _topic: Option<&str>) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Default no-op hooks.
struct NoopSubscribeHooks;

impl SubscribeHooks for NoopSubscribeHooks {}

struct SubscriberInner<T> {
    core: ConnectorCore,
    transport: T,
    registry: Arc<PayloadRegistry>,
    hooks: Arc<dyn SubscribeHooks>,
    dispatcher: Dispatcher,
    inbound: EventTap,
    stop: Mutex<Option<CancellationToken>>,
}

/// Subscribing client bound to one transport.
///
/// Cheap to clone (internally `Arc`-backed); clones share the connection
/// state, the handler table and the receive loop.
///
/// # Example
/// ```
/// use omnibus::{sync_handler, LocalBus, LocalSubscribeTransport, PayloadRegistry, Subscriber};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), omnibus::ClientError> {
/// let bus = LocalBus::default();
/// let subscriber = Subscriber::new(LocalSubscribeTransport::new(&bus), PayloadRegistry::shared());
///
/// subscriber.connect().await?;
/// subscriber
///     .subscribe("alerts", Some(sync_handler("log", |topic, _event| {
///         println!("event on {topic}");
///         Ok(())
///     })))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Subscriber<T: SubscribeTransport> {
    inner: Arc<SubscriberInner<T>>,
}

impl<T: SubscribeTransport> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: SubscribeTransport> Subscriber<T> {
    /// Creates a subscriber with default configuration and exact topic
    /// matching.
    pub fn new(transport: T, registry: Arc<PayloadRegistry>) -> Self {
        Self::builder(transport, registry).build()
    }

    /// Starts building a subscriber.
    pub fn builder(transport: T, registry: Arc<PayloadRegistry>) -> SubscriberBuilder<T> {
        SubscriberBuilder {
            transport,
            registry,
            identifier: None,
            config: ClientConfig::default(),
            hooks: None,
            fallback: None,
            matcher: None,
        }
    }

    /// Identity of this subscriber.
    pub fn identifier(&self) -> &str {
        self.inner.core.identifier()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.core.state().await
    }

    /// Registry used to decode inbound payloads.
    pub fn registry(&self) -> &Arc<PayloadRegistry> {
        &self.inner.registry
    }

    /// Observer for every event this subscriber receives, regardless of
    /// dispatch outcome.
    pub fn inbound_events(&self) -> broadcast::Receiver<(String, Event)> {
        self.inner.inbound.observe()
    }

    /// Observer for events that matched no registered pattern.
    pub fn unhandled_events(&self) -> broadcast::Receiver<(String, Event)> {
        self.inner.dispatcher.observe_unhandled()
    }

    /// Connects the transport and starts the receive loop. Idempotent.
    pub async fn connect(&self) -> Result<(), ClientError> {
        if !self.inner.core.begin_connect().await {
            return Ok(());
        }
        if let Err(err) = self.inner.transport.connect().await {
            self.inner.core.abort_connect().await;
            return Err(err.into());
        }

        let token = CancellationToken::new();
        tokio::spawn(receive_loop(
            self.clone(),
            self.inner.transport.incoming(),
            token.clone(),
        ));
        *self.inner.stop.lock().await = Some(token);

        self.inner.core.finish_connect().await;
        info!(subscriber = self.identifier(), "connected");
        Ok(())
    }

    /// Stops the receive loop and disconnects the transport. Idempotent.
    ///
    /// Handler bindings survive a disconnect; a later `connect()` resumes
    /// dispatching with the same table.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        if !self.inner.core.begin_disconnect().await {
            return Ok(());
        }
        if let Some(token) = self.inner.stop.lock().await.take() {
            token.cancel();
        }
        let result = self.inner.transport.disconnect().await;
        self.inner.core.finish_disconnect().await;
        info!(subscriber = self.identifier(), "disconnected");
        result.map_err(Into::into)
    }

    /// Subscribes to a topic pattern, optionally binding a handler.
    ///
    /// `None` binds the fallback handler if one is configured; with
    /// `handler_required` set and no fallback, the call fails with
    /// [`ClientError::HandlerNotFound`] before any transport action.
    pub async fn subscribe(
        &self,
        topic: &str,
        handler: Option<HandlerRef>,
    ) -> Result<(), ClientError> {
        self.inner.core.ensure_connected().await?;
        self.inner.dispatcher.validate(topic, handler.as_ref())?;

        debug!(subscriber = self.identifier(), topic, "subscribing");
        self.inner.hooks.on_subscribing(topic).await?;
        self.inner.transport.subscribe(topic).await?;
        self.inner.dispatcher.bind(topic, handler).await;
        self.inner.hooks.on_subscribed(topic).await?;
        Ok(())
    }

    /// Subscribes the same handler to several topic patterns.
    ///
    /// With `parallelize`, the per-topic subscriptions run as concurrent
    /// tasks; otherwise they run in order, stopping at the first failure.
    pub async fn multi_subscribe(
        &self,
        topics: &[&str],
        handler: Option<HandlerRef>,
        parallelize: bool,
    ) -> Result<(), ClientError> {
        if !parallelize {
            for topic in topics {
                self.subscribe(topic, handler.clone()).await?;
            }
            return Ok(());
        }

        let handles: Vec<_> = topics
            .iter()
            .map(|topic| {
                let this = self.clone();
                let topic = (*topic).to_owned();
                let handler = handler.clone();
                tokio::spawn(async move { this.subscribe(&topic, handler).await })
            })
            .collect();

        futures::future::try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Fanout {
                    reason: err.to_string(),
                }),
            }
        }))
        .await?;
        Ok(())
    }

    /// Unsubscribes from one topic pattern, or all of them (`None`).
    ///
    /// The transport action runs first; its failure leaves the handler table
    /// untouched. Unsubscribing an unknown topic is a no-op.
    pub async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), ClientError> {
        self.inner.core.ensure_connected().await?;

        debug!(subscriber = self.identifier(), topic, "unsubscribing");
        self.inner.hooks.on_unsubscribing(topic).await?;
        self.inner.transport.unsubscribe(topic).await?;
        self.inner.dispatcher.unbind(topic).await;
        self.inner.hooks.on_unsubscribed(topic).await?;
        Ok(())
    }

    /// Unsubscribes from several topic patterns.
    ///
    /// With `parallelize`, the per-topic unsubscriptions run as concurrent
    /// tasks; otherwise they run in order, stopping at the first failure.
    pub async fn multi_unsubscribe(
        &self,
        topics: &[&str],
        parallelize: bool,
    ) -> Result<(), ClientError> {
        if !parallelize {
            for topic in topics {
                self.unsubscribe(Some(topic)).await?;
            }
            return Ok(());
        }

        let handles: Vec<_> = topics
            .iter()
            .map(|topic| {
                let this = self.clone();
                let topic = (*topic).to_owned();
                tokio::spawn(async move { this.unsubscribe(Some(&topic)).await })
            })
            .collect();

        futures::future::try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Fanout {
                    reason: err.to_string(),
                }),
            }
        }))
        .await?;
        Ok(())
    }

    /// Number of registered pattern bindings.
    pub async fn subscription_count(&self) -> usize {
        self.inner.dispatcher.len().await
    }

    /// Decodes and routes one inbound envelope.
    async fn deliver(&self, topic: &str, envelope: Envelope) {
        let event = match envelope.into_event(&self.inner.registry).await {
            Ok(event) => event,
            Err(err) => {
                warn!(
                    subscriber = self.identifier(),
                    topic,
                    error = %err,
                    "dropping undecodable envelope"
                );
                return;
            }
        };

        self.inner.inbound.publish(topic, &event);
        if let Err(err) = self.inner.dispatcher.dispatch(topic, &event).await {
            warn!(
                subscriber = self.identifier(),
                topic,
                error = %err,
                "dispatch completed with failures"
            );
        }
    }
}

/// Background task draining the transport stream until cancellation.
async fn receive_loop<T: SubscribeTransport>(
    subscriber: Subscriber<T>,
    mut incoming: futures::stream::BoxStream<'static, (String, Envelope)>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            next = incoming.next() => match next {
                Some((topic, envelope)) => subscriber.deliver(&topic, envelope).await,
                None => {
                    debug!(
                        subscriber = subscriber.identifier(),
                        "transport stream ended"
                    );
                    break;
                }
            },
        }
    }
}

/// Builder for [`Subscriber`].
pub struct SubscriberBuilder<T: SubscribeTransport> {
    transport: T,
    registry: Arc<PayloadRegistry>,
    identifier: Option<String>,
    config: ClientConfig,
    hooks: Option<Arc<dyn SubscribeHooks>>,
    fallback: Option<HandlerRef>,
    matcher: Option<MatcherRef>,
}

impl<T: SubscribeTransport> SubscriberBuilder<T> {
    /// Sets an explicit subscriber identifier.
    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Installs lifecycle hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: Arc<dyn SubscribeHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Installs a fallback handler for handlerless subscriptions.
    #[must_use]
    pub fn fallback(mut self, fallback: HandlerRef) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Replaces the topic matcher (exact equality by default; use
    /// [`GlobMatcher`](crate::GlobMatcher) for wildcard patterns).
    #[must_use]
    pub fn matcher(mut self, matcher: MatcherRef) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Requires every subscription to resolve to a handler.
    #[must_use]
    pub fn handler_required(mut self, required: bool) -> Self {
        self.config.handler_required = required;
        self
    }

    /// Sets the handler fan-out concurrency policy.
    #[must_use]
    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.config.dispatch_mode = mode;
        self
    }

    /// Builds the subscriber.
    pub fn build(self) -> Subscriber<T> {
        let matcher = self.matcher.unwrap_or_else(|| Arc::new(ExactMatcher));
        let dispatcher = Dispatcher::new(
            matcher,
            self.fallback,
            self.config.handler_required,
            self.config.dispatch_mode,
            EventTap::new(self.config.tap_capacity),
        );
        Subscriber {
            inner: Arc::new(SubscriberInner {
                core: ConnectorCore::new("subscriber", self.identifier),
                transport: self.transport,
                registry: self.registry,
                hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopSubscribeHooks)),
                dispatcher,
                inbound: EventTap::new(self.config.tap_capacity),
                stop: Mutex::new(None),
            }),
        }
    }
}
