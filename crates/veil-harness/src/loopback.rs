//! Channel-backed Transport implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;
use veil_core::{Transport, TransportError, TransportEvent};
use veil_proto::ClientPayload;

/// In-memory transport wired to a [`SimServer`](crate::SimServer).
///
/// Connecting registers the client with the relay and surfaces a
/// `Connected` event, matching how a real connection library reports
/// establishment asynchronously. Outbound payloads are serialized to
/// their JSON wire form before the relay parses them back, so the
/// harness exercises the same encoding a socket transport would.
pub struct LoopbackTransport {
    server: crate::SimServer,
    client_id: Option<u64>,
    events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    pending_connected: bool,
    closed: bool,
}

impl LoopbackTransport {
    /// Creates a transport for one client against `server`.
    pub fn new(server: crate::SimServer) -> Self {
        Self { server, client_id: None, events: None, pending_connected: false, closed: false }
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&mut self, _server_url: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::new("transport closed"));
        }

        let (client_id, events) = self.server.register();
        self.client_id = Some(client_id);
        self.events = Some(events);
        self.pending_connected = true;
        Ok(())
    }

    async fn emit(&mut self, payload: ClientPayload) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::new("transport closed"));
        }
        let client_id =
            self.client_id.ok_or_else(|| TransportError::new("emit before connect"))?;

        let frame = serde_json::to_string(&payload)
            .map_err(|e| TransportError::new(format!("frame encode: {e}")))?;
        self.server.deliver(client_id, &frame);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.closed {
            return None;
        }

        if self.pending_connected {
            self.pending_connected = false;
            return Some(TransportEvent::Connected);
        }

        match self.events.as_mut() {
            Some(events) => events.recv().await,
            // connect() has not run yet; park this arm rather than
            // report a closed stream.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(client_id) = self.client_id.take() {
            self.server.deregister(client_id);
        }
        self.events = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use veil_proto::MessageBody;

    use super::*;

    #[tokio::test]
    async fn connect_surfaces_connected_event() {
        let server = crate::SimServer::new();
        let mut transport = LoopbackTransport::new(server.clone());

        transport.connect("sim://local").await.unwrap();

        assert_eq!(transport.next_event().await, Some(TransportEvent::Connected));
        assert_eq!(server.client_count(), 1);
    }

    #[tokio::test]
    async fn emit_before_connect_fails() {
        let server = crate::SimServer::new();
        let mut transport = LoopbackTransport::new(server);

        let result = transport
            .emit(ClientPayload::SendMessage {
                group_id: "g1".to_string(),
                username: "ada".to_string(),
                body: MessageBody::Plain("hello".to_string()),
            })
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn close_deregisters_and_ends_the_stream() {
        let server = crate::SimServer::new();
        let mut transport = LoopbackTransport::new(server.clone());

        transport.connect("sim://local").await.unwrap();
        transport.close().await;
        transport.close().await; // idempotent

        assert_eq!(server.client_count(), 0);
        assert_eq!(transport.next_event().await, None);
        assert!(transport.emit(ClientPayload::LeaveGroup {
            group_id: "g1".to_string(),
            username: "ada".to_string(),
        })
        .await
        .is_err());
    }

    #[tokio::test]
    async fn emitted_frames_round_trip_through_json() {
        let server = crate::SimServer::new();
        let mut transport = LoopbackTransport::new(server.clone());
        transport.connect("sim://local").await.unwrap();
        let _ = transport.next_event().await;

        transport
            .emit(ClientPayload::JoinGroup {
                group_id: "g1".to_string(),
                username: "ada".to_string(),
            })
            .await
            .unwrap();

        // The join notice comes back, proving the frame decoded.
        match transport.next_event().await {
            Some(TransportEvent::Inbound(payload)) => {
                let json = serde_json::to_value(&payload).unwrap();
                assert_eq!(json["event"], "user_joined");
            },
            other => panic!("expected inbound notice, got {other:?}"),
        }
    }
}
