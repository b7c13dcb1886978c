//! Client state machine.
//!
//! The `Client` is the transport-facing state machine: it tracks the
//! connection lifecycle, turns application intents into outbound
//! payloads (encrypting on the way out), and turns inbound payloads
//! into decoded messages (decrypting on the way in). Pure state
//! machine - returns actions, caller handles I/O.
//!
//! Inbound events must be fed one at a time in delivery order; the
//! per-event `handle` call is the atomic unit the concurrency model
//! relies on, so the group-key cache only ever sees sequential access.

use veil_core::{ConnectionState, EnvRng, Environment, Message};
use veil_crypto::KeyManager;
use veil_proto::{ClientPayload, GroupNotice, InboundMessage, ServerPayload};

use crate::{
    codec,
    error::ClientError,
    event::{ClientAction, ClientEvent, LogLevel},
};

/// Client state machine.
///
/// Owns the session [`KeyManager`]; both live exactly as long as the
/// session and nothing they hold is persisted.
///
/// # Type Parameters
///
/// - `E`: Environment implementation supplying randomness
pub struct Client<E: Environment> {
    /// Connection lifecycle.
    state: ConnectionState,

    /// Session key material.
    keys: KeyManager,

    /// Environment for randomness.
    env: E,
}

impl<E: Environment> Client<E> {
    /// Creates a disconnected client with empty key material.
    pub fn new(env: E) -> Self {
        Self { state: ConnectionState::Disconnected, keys: KeyManager::new(), env }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of groups with a cached symmetric key.
    pub fn group_key_count(&self) -> usize {
        self.keys.group_key_count()
    }

    /// Exports the session public key as base64 for out-of-band
    /// sharing, generating the keypair lazily.
    ///
    /// `None` means export is unavailable; messaging continues without
    /// it.
    pub fn export_public_key(&mut self) -> Option<String> {
        let mut rng = EnvRng::new(&self.env);
        self.keys.export_public_key(&mut rng)
    }

    /// Processes one event and returns the resulting actions, in
    /// execution order.
    ///
    /// Never fails: every error in this layer resolves into a degraded
    /// action sequence (plaintext send, raw-ciphertext display, or a
    /// dropped no-op) plus a log line.
    pub fn handle(&mut self, event: ClientEvent) -> Vec<ClientAction> {
        match event {
            ClientEvent::ConnectRequested => self.handle_connect_requested(),
            ClientEvent::TransportConnected => self.handle_transport_connected(),
            ClientEvent::TransportDisconnected => self.handle_transport_disconnected(),
            ClientEvent::JoinGroup { group_id, username } => {
                self.handle_membership("join_group", group_id, username, true)
            },
            ClientEvent::LeaveGroup { group_id, username } => {
                self.handle_membership("leave_group", group_id, username, false)
            },
            ClientEvent::SendMessage { group_id, text, username } => {
                self.handle_send_message(&group_id, &text, username)
            },
            ClientEvent::ActiveGroupChanged => vec![ClientAction::ClearMessages],
            ClientEvent::Inbound(payload) => self.handle_inbound(payload),
        }
    }

    fn handle_connect_requested(&mut self) -> Vec<ClientAction> {
        if self.state != ConnectionState::Disconnected {
            return vec![];
        }

        self.state = ConnectionState::Connecting;
        vec![ClientAction::ConnectionChanged(self.state)]
    }

    fn handle_transport_connected(&mut self) -> Vec<ClientAction> {
        if self.state == ConnectionState::Connected {
            return vec![];
        }

        self.state = ConnectionState::Connected;
        vec![
            ClientAction::ConnectionChanged(self.state),
            ClientAction::Log { level: LogLevel::Info, message: "connected to server".to_owned() },
        ]
    }

    fn handle_transport_disconnected(&mut self) -> Vec<ClientAction> {
        if self.state == ConnectionState::Disconnected {
            return vec![];
        }

        self.state = ConnectionState::Disconnected;
        vec![
            ClientAction::ConnectionChanged(self.state),
            ClientAction::Log {
                level: LogLevel::Info,
                message: "disconnected from server".to_owned(),
            },
        ]
    }

    /// Join and leave share a shape: dropped while not connected,
    /// forwarded verbatim otherwise.
    fn handle_membership(
        &mut self,
        operation: &'static str,
        group_id: String,
        username: String,
        join: bool,
    ) -> Vec<ClientAction> {
        if self.state != ConnectionState::Connected {
            return vec![Self::dropped(ClientError::TransportDisconnected { operation })];
        }

        let payload = if join {
            ClientPayload::JoinGroup { group_id, username }
        } else {
            ClientPayload::LeaveGroup { group_id, username }
        };

        vec![ClientAction::Emit(payload)]
    }

    fn handle_send_message(
        &mut self,
        group_id: &str,
        text: &str,
        username: String,
    ) -> Vec<ClientAction> {
        if self.state != ConnectionState::Connected {
            return vec![Self::dropped(ClientError::TransportDisconnected {
                operation: "send_message",
            })];
        }

        if text.trim().is_empty() {
            return vec![];
        }

        let mut rng = EnvRng::new(&self.env);
        let outcome = codec::encrypt_message(&mut self.keys, &mut rng, text, group_id);

        let mut actions = Vec::with_capacity(2);
        if let Some(cause) = outcome.degraded {
            let err = ClientError::CryptoUnavailable(cause);
            actions.push(ClientAction::Log {
                level: err.severity(),
                message: format!("sending unencrypted: {err}"),
            });
        }

        actions.push(ClientAction::Emit(ClientPayload::SendMessage {
            group_id: group_id.to_owned(),
            username,
            body: outcome.body,
        }));
        actions
    }

    fn handle_inbound(&mut self, payload: ServerPayload) -> Vec<ClientAction> {
        match payload {
            ServerPayload::NewMessage(message) => self.handle_new_message(message),
            ServerPayload::UserJoined(notice) => vec![Self::notice_log("joined", &notice)],
            ServerPayload::UserLeft(notice) => vec![Self::notice_log("left", &notice)],
        }
    }

    /// Decodes one inbound message and publishes it.
    ///
    /// A decode failure still publishes - with the raw ciphertext as
    /// display text - so no message is ever dropped silently.
    fn handle_new_message(&mut self, inbound: InboundMessage) -> Vec<ClientAction> {
        let (text, was_encrypted, failure) = match &inbound.encrypted {
            Some(envelope) => {
                let outcome = codec::decrypt_envelope(&self.keys, envelope, &inbound.group_id);
                (outcome.text, outcome.was_encrypted, outcome.failure)
            },
            None => (inbound.text.clone(), false, None),
        };

        let mut actions = Vec::with_capacity(2);
        if let Some(err) = failure {
            actions.push(ClientAction::Log {
                level: err.severity(),
                message: format!("showing raw payload: {err}"),
            });
        }

        actions.push(ClientAction::Publish(Message {
            id: inbound.id,
            group_id: inbound.group_id,
            sender: inbound.sender,
            text,
            timestamp: inbound.timestamp,
            was_encrypted,
        }));
        actions
    }

    fn dropped(err: ClientError) -> ClientAction {
        ClientAction::Log { level: err.severity(), message: err.to_string() }
    }

    fn notice_log(verb: &str, notice: &GroupNotice) -> ClientAction {
        ClientAction::Log {
            level: LogLevel::Info,
            message: format!("{} {} group {}", notice.username, verb, notice.group_id),
        }
    }
}
