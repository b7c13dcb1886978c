//! Decoded domain model.

use serde::{Deserialize, Serialize};

/// Connection lifecycle of the realtime transport.
///
/// `Disconnected -> Connecting -> Connected`, falling back to
/// `Disconnected` on network loss. Retry pacing belongs to the
/// transport collaborator, not this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection; operations are silent no-ops.
    #[default]
    Disconnected,
    /// Dialing; operations are still no-ops.
    Connecting,
    /// Live connection; join/leave/send are forwarded.
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// A decoded message as the presentation layer sees it.
///
/// Immutable once appended to the store; `text` is already the
/// best-effort decrypted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message id.
    pub id: String,
    /// Group the message belongs to.
    pub group_id: String,
    /// Sender display name.
    pub sender: String,
    /// Display text (decrypted, passthrough plaintext, or raw
    /// ciphertext after a failed decrypt).
    pub text: String,
    /// Server-assigned display timestamp.
    pub timestamp: String,
    /// Whether the payload was protected in transit.
    pub was_encrypted: bool,
}
