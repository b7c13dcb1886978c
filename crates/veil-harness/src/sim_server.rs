//! In-memory relay server model.
//!
//! Mirrors the production messaging service's observable behavior:
//! clients join and leave named groups, messages broadcast to the full
//! group including the sender, membership changes produce notices, and
//! the server assigns message ids and display timestamps. No
//! authentication, no history: exactly the collaborator the client
//! core expects.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::mpsc;
use veil_core::TransportEvent;
use veil_proto::{ClientPayload, GroupNotice, InboundMessage, MessageBody, ServerPayload};

/// Display clock start: 12:00:00, advancing one second per message.
const CLOCK_EPOCH_SECONDS: u64 = 12 * 3600;

#[derive(Default)]
struct ServerState {
    groups: HashMap<String, HashSet<u64>>,
    clients: HashMap<u64, mpsc::UnboundedSender<TransportEvent>>,
    next_client_id: u64,
    next_message_id: u64,
}

/// Shared in-memory relay.
///
/// Clones share one server; each [`LoopbackTransport`](crate::LoopbackTransport)
/// registers itself on connect and is removed from every group on
/// close, as the production service does on socket disconnect.
#[derive(Clone, Default)]
pub struct SimServer {
    state: Arc<Mutex<ServerState>>,
}

impl SimServer {
    /// Creates an empty relay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client, returning its id and event stream.
    pub(crate) fn register(&self) -> (u64, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();

        state.next_client_id += 1;
        let client_id = state.next_client_id;
        state.clients.insert(client_id, tx);

        (client_id, rx)
    }

    /// Removes a client from the relay and every group it joined.
    pub(crate) fn deregister(&self, client_id: u64) {
        let mut state = self.lock();
        state.clients.remove(&client_id);
        for members in state.groups.values_mut() {
            members.remove(&client_id);
        }
    }

    /// Handles one client frame in its JSON wire form.
    pub(crate) fn deliver(&self, client_id: u64, frame: &str) {
        match serde_json::from_str::<ClientPayload>(frame) {
            Ok(payload) => self.handle(client_id, payload),
            Err(e) => tracing::warn!("sim server dropped malformed frame: {}", e),
        }
    }

    fn handle(&self, client_id: u64, payload: ClientPayload) {
        match payload {
            ClientPayload::JoinGroup { group_id, username } => {
                let recipients = {
                    let mut state = self.lock();
                    state.groups.entry(group_id.clone()).or_default().insert(client_id);
                    state.group_recipients(&group_id)
                };
                let notice = ServerPayload::UserJoined(GroupNotice { group_id, username });
                Self::broadcast(&recipients, &notice);
            },

            ClientPayload::LeaveGroup { group_id, username } => {
                let recipients = {
                    let mut state = self.lock();
                    if let Some(members) = state.groups.get_mut(&group_id) {
                        members.remove(&client_id);
                    }
                    state.group_recipients(&group_id)
                };
                let notice = ServerPayload::UserLeft(GroupNotice { group_id, username });
                Self::broadcast(&recipients, &notice);
            },

            ClientPayload::SendMessage { group_id, username, body } => {
                let (recipients, id, timestamp) = {
                    let mut state = self.lock();
                    if !state.groups.contains_key(&group_id) {
                        return;
                    }
                    state.next_message_id += 1;
                    let id = state.next_message_id;
                    (state.group_recipients(&group_id), id, format_clock(id))
                };

                // The relay never reads message content: a plaintext
                // body becomes the display text, a sealed body is
                // forwarded with the ciphertext copied through as the
                // placeholder text.
                let (text, encrypted) = match body {
                    MessageBody::Plain(text) => (text, None),
                    MessageBody::Cipher(envelope) => (envelope.ciphertext.clone(), Some(envelope)),
                };

                let message = ServerPayload::NewMessage(InboundMessage {
                    id: id.to_string(),
                    group_id,
                    sender: username,
                    text,
                    timestamp,
                    encrypted,
                });
                Self::broadcast(&recipients, &message);
            },
        }
    }

    fn broadcast(recipients: &[mpsc::UnboundedSender<TransportEvent>], payload: &ServerPayload) {
        for recipient in recipients {
            // A closed receiver just means that client is gone.
            let _ = recipient.send(TransportEvent::Inbound(payload.clone()));
        }
    }

    /// Number of members currently in `group_id`. Test oracle.
    pub fn member_count(&self, group_id: &str) -> usize {
        self.lock().groups.get(group_id).map_or(0, HashSet::len)
    }

    /// Number of registered clients. Test oracle.
    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ServerState {
    /// Senders for every live member of a group, in stable id order.
    fn group_recipients(&self, group_id: &str) -> Vec<mpsc::UnboundedSender<TransportEvent>> {
        let Some(members) = self.groups.get(group_id) else {
            return Vec::new();
        };

        let mut ids: Vec<u64> = members.iter().copied().collect();
        ids.sort_unstable();
        ids.iter().filter_map(|id| self.clients.get(id).cloned()).collect()
    }
}

fn format_clock(message_index: u64) -> String {
    let seconds = CLOCK_EPOCH_SECONDS + message_index;
    format!("{:02}:{:02}:{:02}", (seconds / 3600) % 24, (seconds / 60) % 60, seconds % 60)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn join_frame(group_id: &str, username: &str) -> String {
        serde_json::to_string(&ClientPayload::JoinGroup {
            group_id: group_id.to_string(),
            username: username.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn join_adds_membership_and_notifies() {
        let server = SimServer::new();
        let (id, mut events) = server.register();

        server.deliver(id, &join_frame("g1", "ada"));

        assert_eq!(server.member_count("g1"), 1);
        match events.try_recv().unwrap() {
            TransportEvent::Inbound(ServerPayload::UserJoined(notice)) => {
                assert_eq!(notice.username, "ada");
            },
            other => panic!("expected join notice, got {other:?}"),
        }
    }

    #[test]
    fn message_reaches_the_full_room_including_sender() {
        let server = SimServer::new();
        let (alice, mut alice_events) = server.register();
        let (bob, mut bob_events) = server.register();

        server.deliver(alice, &join_frame("g1", "ada"));
        server.deliver(bob, &join_frame("g1", "bob"));

        let frame = serde_json::to_string(&ClientPayload::SendMessage {
            group_id: "g1".to_string(),
            username: "ada".to_string(),
            body: MessageBody::Plain("hello".to_string()),
        })
        .unwrap();
        server.deliver(alice, &frame);

        let mut seen = 0;
        for events in [&mut alice_events, &mut bob_events] {
            while let Ok(event) = events.try_recv() {
                if let TransportEvent::Inbound(ServerPayload::NewMessage(msg)) = event {
                    assert_eq!(msg.text, "hello");
                    assert_eq!(msg.sender, "ada");
                    seen += 1;
                }
            }
        }
        assert_eq!(seen, 2, "sender and peer both receive the broadcast");
    }

    #[test]
    fn message_to_unknown_group_is_dropped() {
        let server = SimServer::new();
        let (id, mut events) = server.register();

        let frame = serde_json::to_string(&ClientPayload::SendMessage {
            group_id: "nowhere".to_string(),
            username: "ada".to_string(),
            body: MessageBody::Plain("hello".to_string()),
        })
        .unwrap();
        server.deliver(id, &frame);

        assert!(events.try_recv().is_err());
    }

    #[test]
    fn deregister_leaves_every_group() {
        let server = SimServer::new();
        let (id, _events) = server.register();

        server.deliver(id, &join_frame("g1", "ada"));
        server.deliver(id, &join_frame("g2", "ada"));
        assert_eq!(server.client_count(), 1);

        server.deregister(id);

        assert_eq!(server.client_count(), 0);
        assert_eq!(server.member_count("g1"), 0);
        assert_eq!(server.member_count("g2"), 0);
    }

    #[test]
    fn malformed_frames_are_ignored() {
        let server = SimServer::new();
        let (id, mut events) = server.register();

        server.deliver(id, "{not json");

        assert!(events.try_recv().is_err());
        assert_eq!(server.member_count("g1"), 0);
    }

    #[test]
    fn clock_formats_as_display_time() {
        assert_eq!(format_clock(1), "12:00:01");
        assert_eq!(format_clock(61), "12:01:01");
    }
}
