//! # Publisher: the outbound half of the client.
//!
//! [`Publisher`] wraps a [`PublishTransport`] with the connector lifecycle,
//! the three-phase hook contract, and the multi-topic fan-out engine.
//!
//! ## Hook ordering
//! ```text
//! publish(topic, payload)
//!     ├─► build Event (identifier, timestamp, publisher id)
//!     ├─► hooks.on_publishing(topic, &event)   // error: stop here, propagate
//!     ├─► encode Envelope, transport.send(...) // always runs otherwise
//!     ├─► hooks.on_published(topic, &event)
//!     └─► return Event                         // caller correlates acks
//! ```
//!
//! Hooks never suppress the transport action: only a failing *before* hook
//! skips the send (and the after hook); a failing send skips the after hook
//! and propagates the transport error unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future;
use tracing::{debug, info};

use crate::client::connector::{ConnectionState, ConnectorCore};
use crate::error::ClientError;
use crate::event::{Envelope, Event, PayloadRef, PayloadRegistry};
use crate::transport::PublishTransport;

/// Lifecycle callbacks around each publish.
///
/// Every hook defaults to a no-op; override only what you need. An error from
/// [`on_publishing`](Self::on_publishing) aborts the publish before the
/// transport is touched.
#[async_trait]
pub trait PublishHooks: Send + Sync + 'static {
    /// Runs before the envelope is handed to the transport.
    async fn on_publishing(&self, _topic: &str, _event: &Event) -> Result<(), ClientError> {
        Ok(())
    }

    /// Runs after the transport accepted the envelope.
    async fn on_published(&self, _topic: &str, _event: &Event) -> Result<(), ClientError> {
        Ok(())
    }
}

/// Default no-op hooks.
struct NoopPublishHooks;

impl PublishHooks for NoopPublishHooks {}

struct PublisherInner<T> {
    core: ConnectorCore,
    transport: T,
    registry: Arc<PayloadRegistry>,
    hooks: Arc<dyn PublishHooks>,
}

/// Publishing client bound to one transport.
///
/// Cheap to clone (internally `Arc`-backed); clones share the connection
/// state and transport.
///
/// # Example
/// ```
/// use omnibus::{Int64Payload, LocalBus, LocalPublishTransport, PayloadCodec, PayloadRegistry, Publisher};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), omnibus::ClientError> {
/// let bus = LocalBus::default();
/// let publisher = Publisher::new(LocalPublishTransport::new(&bus), PayloadRegistry::shared());
///
/// publisher.connect().await?;
/// let event = publisher.publish("metrics", Some(Int64Payload(42).into_payload())).await?;
/// assert!(!event.identifier().is_empty());
/// # Ok(())
/// # }
/// ```
pub struct Publisher<T: PublishTransport> {
    inner: Arc<PublisherInner<T>>,
}

impl<T: PublishTransport> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: PublishTransport> Publisher<T> {
    /// Creates a publisher with a generated identifier and no-op hooks.
    pub fn new(transport: T, registry: Arc<PayloadRegistry>) -> Self {
        Self::builder(transport, registry).build()
    }

    /// Starts building a publisher.
    pub fn builder(transport: T, registry: Arc<PayloadRegistry>) -> PublisherBuilder<T> {
        PublisherBuilder {
            transport,
            registry,
            identifier: None,
            hooks: None,
        }
    }

    /// Identity of this publisher, recorded on every event it produces.
    pub fn identifier(&self) -> &str {
        self.inner.core.identifier()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.core.state().await
    }

    /// Registry used to auto-register payload types on encode.
    pub fn registry(&self) -> &Arc<PayloadRegistry> {
        &self.inner.registry
    }

    /// Connects the underlying transport. Idempotent.
    pub async fn connect(&self) -> Result<(), ClientError> {
        if !self.inner.core.begin_connect().await {
            return Ok(());
        }
        match self.inner.transport.connect().await {
            Ok(()) => {
                self.inner.core.finish_connect().await;
                info!(publisher = self.identifier(), "connected");
                Ok(())
            }
            Err(err) => {
                self.inner.core.abort_connect().await;
                Err(err.into())
            }
        }
    }

    /// Disconnects the underlying transport. Idempotent.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        if !self.inner.core.begin_disconnect().await {
            return Ok(());
        }
        let result = self.inner.transport.disconnect().await;
        self.inner.core.finish_disconnect().await;
        info!(publisher = self.identifier(), "disconnected");
        result.map_err(Into::into)
    }

    /// Publishes a payload (or a pure signal) on a topic.
    ///
    /// Builds the event, runs the hooks around the transport send, and
    /// returns the event so the caller can correlate acknowledgements.
    pub async fn publish(
        &self,
        topic: &str,
        payload: Option<PayloadRef>,
    ) -> Result<Event, ClientError> {
        self.inner.core.ensure_connected().await?;

        let event = Event::new(self.identifier(), payload);
        debug!(
            publisher = self.identifier(),
            topic,
            event = event.identifier(),
            "publishing"
        );

        self.inner.hooks.on_publishing(topic, &event).await?;
        let envelope = Envelope::from_event(&event, &self.inner.registry).await?;
        self.inner.transport.send(topic, envelope).await?;
        self.inner.hooks.on_published(topic, &event).await?;

        Ok(event)
    }

    /// Publishes the same payload on several topics.
    ///
    /// With `parallelize`, every per-topic publish runs as its own task and
    /// the call joins all of them, failing fast on the first error without
    /// canceling sends already in flight. Without it, topics are published
    /// strictly in the given order, stopping at the first failure.
    ///
    /// Returned events are in topic order.
    pub async fn multi_publish(
        &self,
        topics: &[&str],
        payload: Option<PayloadRef>,
        parallelize: bool,
    ) -> Result<Vec<Event>, ClientError> {
        debug!(
            publisher = self.identifier(),
            topics = topics.len(),
            parallelize,
            "multi-publish"
        );

        if !parallelize {
            let mut events = Vec::with_capacity(topics.len());
            for topic in topics {
                events.push(self.publish(topic, payload.clone()).await?);
            }
            return Ok(events);
        }

        let handles: Vec<_> = topics
            .iter()
            .map(|topic| {
                let this = self.clone();
                let topic = (*topic).to_owned();
                let payload = payload.clone();
                tokio::spawn(async move { this.publish(&topic, payload).await })
            })
            .collect();

        // Dropping a JoinHandle detaches the task, so an early error return
        // leaves in-flight sends running to completion.
        future::try_join_all(handles.into_iter().map(|handle| async move {
            match handle.await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Fanout {
                    reason: err.to_string(),
                }),
            }
        }))
        .await
    }
}

/// Builder for [`Publisher`].
pub struct PublisherBuilder<T: PublishTransport> {
    transport: T,
    registry: Arc<PayloadRegistry>,
    identifier: Option<String>,
    hooks: Option<Arc<dyn PublishHooks>>,
}

impl<T: PublishTransport> PublisherBuilder<T> {
    /// Sets an explicit publisher identifier.
    #[must_use]
    pub fn identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Installs lifecycle hooks.
    #[must_use]
    pub fn hooks(mut self, hooks: Arc<dyn PublishHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Builds the publisher.
    pub fn build(self) -> Publisher<T> {
        Publisher {
            inner: Arc::new(PublisherInner {
                core: ConnectorCore::new("publisher", self.identifier),
                transport: self.transport,
                registry: self.registry,
                hooks: self.hooks.unwrap_or_else(|| Arc::new(NoopPublishHooks)),
            }),
        }
    }
}
