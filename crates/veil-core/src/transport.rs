//! Transport collaborator boundary.
//!
//! The realtime connection library (wire framing, delivery, reconnect
//! backoff) lives outside this repository. The core reaches it through
//! [`Transport`], issuing logical payloads and consuming a logical
//! event stream. Implementations decide what a "connection" physically
//! is; the harness ships an in-memory loopback.

use async_trait::async_trait;
use thiserror::Error;
use veil_proto::{ClientPayload, ServerPayload};

/// Failure reported by a transport implementation.
///
/// Driver-level only: the client state machine never sees these; a
/// failed emit degrades to a log line while the collaborator's
/// reconnect logic does its work.
#[derive(Debug, Clone, Error)]
#[error("transport failure: {reason}")]
pub struct TransportError {
    /// Implementation-reported cause.
    pub reason: String,
}

impl TransportError {
    /// Wraps a cause description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Logical event delivered by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection came up (initially or after a reconnect).
    Connected,
    /// The connection dropped; the collaborator will retry on its own
    /// schedule.
    Disconnected,
    /// A server payload arrived.
    Inbound(ServerPayload),
}

/// The external realtime connection, seen as logical operations.
///
/// # Contract
///
/// - Events surface via [`next_event`](Transport::next_event) strictly
///   in delivery order; at-most-once semantics.
/// - After [`close`](Transport::close), `next_event` returns `None`
///   permanently and further emits fail.
#[async_trait]
pub trait Transport: Send {
    /// Opens the connection to `server_url`. Connection establishment
    /// is reported asynchronously via a [`TransportEvent::Connected`].
    async fn connect(&mut self, server_url: &str) -> Result<(), TransportError>;

    /// Emits one logical payload to the server.
    async fn emit(&mut self, payload: ClientPayload) -> Result<(), TransportError>;

    /// Waits for the next logical event. `None` means the transport is
    /// closed for good.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Tears the connection down. Idempotent.
    async fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_reason() {
        let err = TransportError::new("socket reset");
        assert_eq!(err.to_string(), "transport failure: socket reset");
    }
}
