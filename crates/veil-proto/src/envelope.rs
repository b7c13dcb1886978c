//! The transportable encrypted message unit.

use serde::{Deserialize, Serialize};

/// Encrypted message envelope.
///
/// Produced by the client codec and carried opaquely by the transport.
/// Both `ciphertext` and `iv` are standard base64. An absent `iv` means
/// the payload was never encrypted (the sender degraded to plaintext and
/// `ciphertext` holds the raw text); receivers must pass such envelopes
/// through without attempting AEAD decryption.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    /// Base64 AES-256-GCM ciphertext (tag included), or raw plaintext
    /// when `iv` is absent.
    pub ciphertext: String,

    /// Base64 96-bit initialization vector. `None` is the
    /// degrade-to-plaintext sentinel.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iv: Option<String>,

    /// Group whose key sealed this payload.
    pub group_id: String,
}

impl EncryptedEnvelope {
    /// True when the envelope actually carries sealed data.
    pub fn is_sealed(&self) -> bool {
        self.iv.is_some()
    }
}

impl std::fmt::Debug for EncryptedEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedEnvelope")
            .field("ciphertext", &format!("<{} bytes b64>", self.ciphertext.len()))
            .field("iv", &self.iv.as_ref().map(|iv| format!("<{} bytes b64>", iv.len())))
            .field("group_id", &self.group_id)
            .finish()
    }
}
