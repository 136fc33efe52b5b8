//! # Connector lifecycle.
//!
//! Every publisher and subscriber shares the same small state machine:
//!
//! ```text
//! Disconnected ──► Connecting ──► Connected ──► Disconnecting ──► Disconnected
//! ```
//!
//! `connect()` and `disconnect()` are idempotent: invoking them in an
//! already-target (or in-transition-to-target) state is a no-op, not an
//! error. A failed transport connect rolls the state back to `Disconnected`.

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ClientError;

/// Lifecycle state of a publisher or subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport connection; the initial and final state.
    Disconnected,
    /// Transport connect in progress.
    Connecting,
    /// Operational; publish/subscribe/unsubscribe are permitted.
    Connected,
    /// Transport disconnect in progress.
    Disconnecting,
}

/// Identifier plus lifecycle state, embedded by publishers and subscribers.
#[derive(Debug)]
pub(crate) struct ConnectorCore {
    identifier: String,
    state: RwLock<ConnectionState>,
}

impl ConnectorCore {
    /// Creates a core with the given identifier, or a generated
    /// `{prefix}-{uuid}` one.
    pub(crate) fn new(prefix: &str, identifier: Option<String>) -> Self {
        Self {
            identifier: identifier.unwrap_or_else(|| format!("{prefix}-{}", Uuid::new_v4())),
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    pub(crate) fn identifier(&self) -> &str {
        &self.identifier
    }

    pub(crate) async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Moves to `Connecting` unless already connected or connecting.
    ///
    /// Returns `false` when the call should be treated as an idempotent no-op.
    pub(crate) async fn begin_connect(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            ConnectionState::Connected | ConnectionState::Connecting => false,
            _ => {
                *state = ConnectionState::Connecting;
                true
            }
        }
    }

    pub(crate) async fn finish_connect(&self) {
        *self.state.write().await = ConnectionState::Connected;
    }

    /// Rolls back a failed connect attempt.
    pub(crate) async fn abort_connect(&self) {
        *self.state.write().await = ConnectionState::Disconnected;
    }

    /// Moves to `Disconnecting` unless already disconnected or disconnecting.
    ///
    /// Returns `false` when the call should be treated as an idempotent no-op.
    pub(crate) async fn begin_disconnect(&self) -> bool {
        let mut state = self.state.write().await;
        match *state {
            ConnectionState::Disconnected | ConnectionState::Disconnecting => false,
            _ => {
                *state = ConnectionState::Disconnecting;
                true
            }
        }
    }

    pub(crate) async fn finish_disconnect(&self) {
        *self.state.write().await = ConnectionState::Disconnected;
    }

    /// Guards operations that require an active connection.
    ///
    /// Fails with [`ClientError::NotConnected`] before any transport call is
    /// attempted.
    pub(crate) async fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.state().await == ConnectionState::Connected {
            Ok(())
        } else {
            Err(ClientError::NotConnected {
                connector: self.identifier.clone(),
            })
        }
    }
}
