//! # Transport adapters for the in-process bus.
//!
//! [`LocalPublishTransport`] injects envelopes onto a [`LocalBus`];
//! [`LocalSubscribeTransport`] drains it, forwarding only the topics it was
//! told to subscribe to. Both are connectionless: `connect`/`disconnect`
//! always succeed.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::dispatch::matcher::{GlobMatcher, TopicMatcher};
use crate::error::TransportError;
use crate::event::Envelope;
use crate::transport::{PublishTransport, SubscribeTransport};

use super::bus::LocalBus;

/// Outbound adapter for a [`LocalBus`].
#[derive(Clone, Debug)]
pub struct LocalPublishTransport {
    bus: LocalBus,
}

impl LocalPublishTransport {
    /// Attaches a publish transport to the bus.
    pub fn new(bus: &LocalBus) -> Self {
        Self { bus: bus.clone() }
    }
}

#[async_trait]
impl PublishTransport for LocalPublishTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(&self, topic: &str, envelope: Envelope) -> Result<(), TransportError> {
        self.bus.send(topic, envelope);
        Ok(())
    }
}

/// Inbound adapter for a [`LocalBus`].
///
/// The bus broadcasts every envelope to every attached transport; this
/// adapter forwards only those whose topic matches one of its subscribed
/// patterns (glob semantics, same as the dispatcher default).
#[derive(Clone, Debug)]
pub struct LocalSubscribeTransport {
    bus: LocalBus,
    patterns: Arc<RwLock<HashSet<String>>>,
}

impl LocalSubscribeTransport {
    /// Attaches a subscribe transport to the bus.
    pub fn new(bus: &LocalBus) -> Self {
        Self {
            bus: bus.clone(),
            patterns: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    fn is_subscribed(patterns: &RwLock<HashSet<String>>, topic: &str) -> bool {
        match patterns.read() {
            Ok(set) => set.iter().any(|p| GlobMatcher.matches(p, topic)),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl SubscribeTransport for LocalSubscribeTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.patterns
            .write()
            .map_err(|_| TransportError::new("subscription set poisoned"))?
            .insert(topic.to_owned());
        Ok(())
    }

    async fn unsubscribe(&self, topic: Option<&str>) -> Result<(), TransportError> {
        let mut set = self
            .patterns
            .write()
            .map_err(|_| TransportError::new("subscription set poisoned"))?;
        match topic {
            Some(topic) => {
                set.remove(topic);
            }
            None => set.clear(),
        }
        Ok(())
    }

    fn incoming(&self) -> BoxStream<'static, (String, Envelope)> {
        let rx = self.bus.attach();
        let patterns = Arc::clone(&self.patterns);

        Box::pin(stream::unfold(
            (rx, patterns),
            |(mut rx, patterns)| async move {
                loop {
                    match rx.recv().await {
                        Ok((topic, envelope)) => {
                            if Self::is_subscribed(&patterns, &topic) {
                                return Some(((topic.to_string(), envelope), (rx, patterns)));
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "local transport lagged; envelopes dropped");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        ))
    }
}
