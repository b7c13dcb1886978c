//! Logical transport events.
//!
//! [`ClientPayload`] is what the core hands to the transport
//! collaborator; [`ServerPayload`] is what the collaborator delivers
//! back. Both serialize as `{"event": ..., "data": ...}` frames so a
//! JSON transport can put them on the wire verbatim.

use serde::{Deserialize, Serialize};

use crate::envelope::EncryptedEnvelope;

/// Body of an outbound `send_message` payload.
///
/// Exactly one of the wire's `message` / `encrypted` fields exists, so
/// the union is modeled as a tagged variant rather than two options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Plaintext body; the sender degraded to unencrypted delivery.
    #[serde(rename = "message")]
    Plain(String),

    /// Sealed body; the normal path.
    #[serde(rename = "encrypted")]
    Cipher(EncryptedEnvelope),
}

impl MessageBody {
    /// True for the encrypted variant.
    pub fn is_cipher(&self) -> bool {
        matches!(self, Self::Cipher(_))
    }
}

/// Client-to-server payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientPayload {
    /// Enter a group's broadcast scope.
    #[serde(rename_all = "camelCase")]
    JoinGroup {
        /// Target group.
        group_id: String,
        /// Display name announced to the group.
        username: String,
    },

    /// Leave a group's broadcast scope.
    #[serde(rename_all = "camelCase")]
    LeaveGroup {
        /// Target group.
        group_id: String,
        /// Display name announced to the group.
        username: String,
    },

    /// Deliver a message to a group.
    #[serde(rename_all = "camelCase")]
    SendMessage {
        /// Target group.
        group_id: String,
        /// Sender display name.
        username: String,
        /// Plain or sealed body, never both.
        #[serde(flatten)]
        body: MessageBody,
    },
}

/// A message as delivered by the server.
///
/// When `encrypted` is present, `text` is a placeholder the relay copied
/// through; the real text must be derived by decrypting the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Server-assigned message id.
    pub id: String,
    /// Group the message belongs to.
    pub group_id: String,
    /// Sender display name.
    pub sender: String,
    /// Display text (authoritative only when `encrypted` is absent).
    pub text: String,
    /// Server-assigned display timestamp (`HH:MM:SS`).
    pub timestamp: String,
    /// Sealed body, when the sender encrypted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub encrypted: Option<EncryptedEnvelope>,
}

/// Membership change notice. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNotice {
    /// Group the notice concerns.
    pub group_id: String,
    /// Member who joined or left.
    pub username: String,
}

/// Server-to-client payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerPayload {
    /// A message addressed to a group this client joined.
    NewMessage(InboundMessage),
    /// Another member joined a group.
    UserJoined(GroupNotice),
    /// Another member left a group.
    UserLeft(GroupNotice),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn join_group_wire_shape() {
        let payload =
            ClientPayload::JoinGroup { group_id: "g1".to_string(), username: "ada".to_string() };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event"], "join_group");
        assert_eq!(json["data"]["groupId"], "g1");
        assert_eq!(json["data"]["username"], "ada");
    }

    #[test]
    fn plain_body_serializes_as_message_field() {
        let payload = ClientPayload::SendMessage {
            group_id: "g1".to_string(),
            username: "ada".to_string(),
            body: MessageBody::Plain("hi".to_string()),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["data"]["message"], "hi");
        assert!(json["data"].get("encrypted").is_none());
    }

    #[test]
    fn cipher_body_serializes_as_encrypted_field() {
        let payload = ClientPayload::SendMessage {
            group_id: "g1".to_string(),
            username: "ada".to_string(),
            body: MessageBody::Cipher(EncryptedEnvelope {
                ciphertext: "YWJj".to_string(),
                iv: Some("aXY=".to_string()),
                group_id: "g1".to_string(),
            }),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["data"].get("message").is_none());
        assert_eq!(json["data"]["encrypted"]["ciphertext"], "YWJj");
    }

    #[test]
    fn send_message_round_trips_both_bodies() {
        for body in [
            MessageBody::Plain("hello".to_string()),
            MessageBody::Cipher(EncryptedEnvelope {
                ciphertext: "YWJj".to_string(),
                iv: Some("aXY=".to_string()),
                group_id: "g1".to_string(),
            }),
        ] {
            let payload = ClientPayload::SendMessage {
                group_id: "g1".to_string(),
                username: "ada".to_string(),
                body,
            };

            let json = serde_json::to_string(&payload).unwrap();
            let decoded: ClientPayload = serde_json::from_str(&json).unwrap();
            assert_eq!(payload, decoded);
        }
    }

    #[test]
    fn new_message_without_envelope_decodes() {
        let json = r#"{
            "event": "new_message",
            "data": {
                "id": "42",
                "groupId": "g1",
                "sender": "ada",
                "text": "hello",
                "timestamp": "12:00:00"
            }
        }"#;

        let decoded: ServerPayload = serde_json::from_str(json).unwrap();
        match decoded {
            ServerPayload::NewMessage(msg) => {
                assert_eq!(msg.text, "hello");
                assert_eq!(msg.encrypted, None);
            },
            other => panic!("expected NewMessage, got {other:?}"),
        }
    }

    #[test]
    fn notices_round_trip() {
        let payload = ServerPayload::UserLeft(GroupNotice {
            group_id: "g1".to_string(),
            username: "ada".to_string(),
        });

        let json = serde_json::to_string(&payload).unwrap();
        let decoded: ServerPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload, decoded);
    }
}
