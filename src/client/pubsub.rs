//! # Combined publish/subscribe clients.
//!
//! [`PubSubClient`] pairs a [`Publisher`] with a [`Subscriber`] under one
//! lifecycle, for the common case where a component both produces and
//! consumes events. [`MultiClient`] fans a single call out over several
//! heterogeneous clients through the type-erased [`Client`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tokio::sync::broadcast;

use crate::error::ClientError;
use crate::event::{Event, PayloadRef};
use crate::handler::HandlerRef;
use crate::transport::{PublishTransport, SubscribeTransport};

use super::publisher::Publisher;
use super::subscriber::Subscriber;

/// Type-erased client surface, for collections of heterogeneous clients.
///
/// The erased `publish` drops the returned [`Event`]; use the inherent
/// methods on [`Publisher`] or [`PubSubClient`] when the event matters.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Connects the underlying transport(s).
    async fn connect(&self) -> Result<(), ClientError>;

    /// Disconnects the underlying transport(s).
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Publishes a payload on a topic.
    async fn publish(&self, topic: &str, payload: Option<PayloadRef>) -> Result<(), ClientError>;

    /// Subscribes to a topic pattern with an optional handler.
    async fn subscribe(&self, topic: &str, handler: Option<HandlerRef>)
        -> Result<(), ClientError>;

    /// Unsubscribes from one topic pattern, or all of them (`None`).
    async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), ClientError>;
}

/// A publisher and a subscriber sharing one lifecycle.
///
/// The halves keep their own transports and identifiers; `connect` and
/// `disconnect` drive both together.
pub struct PubSubClient<P: PublishTransport, S: SubscribeTransport> {
    publisher: Publisher<P>,
    subscriber: Subscriber<S>,
}

impl<P: PublishTransport, S: SubscribeTransport> Clone for PubSubClient<P, S> {
    fn clone(&self) -> Self {
        Self {
            publisher: self.publisher.clone(),
            subscriber: self.subscriber.clone(),
        }
    }
}

impl<P: PublishTransport, S: SubscribeTransport> PubSubClient<P, S> {
    /// Pairs an existing publisher and subscriber.
    pub fn new(publisher: Publisher<P>, subscriber: Subscriber<S>) -> Self {
        Self {
            publisher,
            subscriber,
        }
    }

    /// The publishing half.
    pub fn publisher(&self) -> &Publisher<P> {
        &self.publisher
    }

    /// The subscribing half.
    pub fn subscriber(&self) -> &Subscriber<S> {
        &self.subscriber
    }

    /// Connects both halves, failing if either connect fails.
    pub async fn connect(&self) -> Result<(), ClientError> {
        tokio::try_join!(self.publisher.connect(), self.subscriber.connect())?;
        Ok(())
    }

    /// Disconnects both halves.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        tokio::try_join!(self.publisher.disconnect(), self.subscriber.disconnect())?;
        Ok(())
    }

    /// Publishes a payload and returns the produced event.
    pub async fn publish(
        &self,
        topic: &str,
        payload: Option<PayloadRef>,
    ) -> Result<Event, ClientError> {
        self.publisher.publish(topic, payload).await
    }

    /// Publishes the same payload on several topics.
    pub async fn multi_publish(
        &self,
        topics: &[&str],
        payload: Option<PayloadRef>,
        parallelize: bool,
    ) -> Result<Vec<Event>, ClientError> {
        self.publisher.multi_publish(topics, payload, parallelize).await
    }

    /// Subscribes to a topic pattern with an optional handler.
    pub async fn subscribe(
        &self,
        topic: &str,
        handler: Option<HandlerRef>,
    ) -> Result<(), ClientError> {
        self.subscriber.subscribe(topic, handler).await
    }

    /// Unsubscribes from one topic pattern, or all of them (`None`).
    pub async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), ClientError> {
        self.subscriber.unsubscribe(topic).await
    }

    /// Observer for every event the subscribing half receives.
    pub fn inbound_events(&self) -> broadcast::Receiver<(String, Event)> {
        self.subscriber.inbound_events()
    }

    /// Observer for events that matched no registered pattern.
    pub fn unhandled_events(&self) -> broadcast::Receiver<(String, Event)> {
        self.subscriber.unhandled_events()
    }
}

#[async_trait]
impl<P: PublishTransport, S: SubscribeTransport> Client for PubSubClient<P, S> {
    async fn connect(&self) -> Result<(), ClientError> {
        PubSubClient::connect(self).await
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        PubSubClient::disconnect(self).await
    }

    async fn publish(&self, topic: &str, payload: Option<PayloadRef>) -> Result<(), ClientError> {
        self.publisher.publish(topic, payload).await.map(|_| ())
    }

    async fn subscribe(
        &self,
        topic: &str,
        handler: Option<HandlerRef>,
    ) -> Result<(), ClientError> {
        self.subscriber.subscribe(topic, handler).await
    }

    async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), ClientError> {
        self.subscriber.unsubscribe(topic).await
    }
}

/// Fans every call out over a set of clients, concurrently.
///
/// Any failing member fails the aggregate call; calls already in flight on
/// other members run to completion.
#[derive(Clone, Default)]
pub struct MultiClient {
    clients: Vec<Arc<dyn Client>>,
}

impl MultiClient {
    /// Creates a fan-out group over the given clients.
    pub fn new(clients: Vec<Arc<dyn Client>>) -> Self {
        Self { clients }
    }

    /// Adds one more member.
    pub fn push(&mut self, client: Arc<dyn Client>) {
        self.clients.push(client);
    }

    /// Number of member clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True when the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[async_trait]
impl Client for MultiClient {
    async fn connect(&self) -> Result<(), ClientError> {
        try_join_all(self.clients.iter().map(|c| c.connect())).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        try_join_all(self.clients.iter().map(|c| c.disconnect())).await?;
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Option<PayloadRef>) -> Result<(), ClientError> {
        try_join_all(
            self.clients
                .iter()
                .map(|c| c.publish(topic, payload.clone())),
        )
        .await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        handler: Option<HandlerRef>,
    ) -> Result<(), ClientError> {
        try_join_all(
            self.clients
                .iter()
                .map(|c| c.subscribe(topic, handler.clone())),
        )
        .await?;
        Ok(())
    }

    async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), ClientError> {
        try_join_all(self.clients.iter().map(|c| c.unsubscribe(topic))).await?;
        Ok(())
    }
}
