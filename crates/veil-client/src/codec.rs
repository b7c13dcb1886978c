//! Message codec: plaintext <-> transportable envelope.
//!
//! Both directions borrow the [`KeyManager`] only for the duration of
//! one operation. The codec never fails a send and never drops a
//! receive:
//!
//! - Encryption degrades to plaintext when key creation or sealing
//!   fails, with the trigger recorded for logging.
//! - Decryption passes envelopes through verbatim when they were never
//!   sealed or no key is cached, and surfaces the raw ciphertext as a
//!   best-effort display value when verification fails.
//!
//! Note that group keys are generated independently by every client
//! and never exchanged, so envelopes sealed by a peer do not verify
//! here; they surface through the failure path below. That gap is
//! inherited from the protocol, not introduced by this codec.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::{CryptoRng, RngCore};
use veil_crypto::{CryptoError, Iv, KeyManager};
use veil_proto::{EncryptedEnvelope, MessageBody};

use crate::error::ClientError;

/// Result of encoding an outbound message.
#[derive(Debug)]
pub struct EncryptOutcome {
    /// Wire body: `Cipher` on the normal path, `Plain` after a
    /// degrade.
    pub body: MessageBody,
    /// The failure that forced a degrade, when one happened. Recorded
    /// for logging; never surfaced as a user-facing error.
    pub degraded: Option<CryptoError>,
}

/// Result of decoding an inbound envelope.
#[derive(Debug)]
pub struct DecryptOutcome {
    /// Best-effort display text.
    pub text: String,
    /// Whether the payload was protected in transit.
    pub was_encrypted: bool,
    /// Verification or decoding failure, when one happened. The
    /// message is still delivered with `text` as-is.
    pub failure: Option<ClientError>,
}

/// Encrypts `plaintext` for `group_id`, creating the group key on
/// first use.
///
/// Draws a fresh random 96-bit IV, seals with AES-256-GCM, and
/// base64-encodes ciphertext and IV into an [`EncryptedEnvelope`]. Any
/// failure yields `MessageBody::Plain` so the message is sent rather
/// than dropped.
pub fn encrypt_message<R>(
    keys: &mut KeyManager,
    rng: &mut R,
    plaintext: &str,
    group_id: &str,
) -> EncryptOutcome
where
    R: CryptoRng + RngCore,
{
    let sealed = keys.get_or_create_group_key(group_id, rng).and_then(|key| {
        let iv = Iv::generate(rng)?;
        let ciphertext = key.seal(&iv, plaintext.as_bytes())?;
        Ok(EncryptedEnvelope {
            ciphertext: BASE64.encode(ciphertext),
            iv: Some(BASE64.encode(iv.as_bytes())),
            group_id: group_id.to_owned(),
        })
    });

    match sealed {
        Ok(envelope) => EncryptOutcome { body: MessageBody::Cipher(envelope), degraded: None },
        Err(err) => EncryptOutcome {
            body: MessageBody::Plain(plaintext.to_owned()),
            degraded: Some(err),
        },
    }
}

/// Decrypts an inbound envelope for `group_id`.
///
/// Passthrough cases (treated as already-plaintext, mirroring the
/// encrypt fallback, not an error path):
///
/// - the envelope carries no IV (sender degraded to plaintext)
/// - no key is cached for `group_id`
///
/// Otherwise base64-decodes IV and ciphertext, opens the AEAD, and
/// decodes UTF-8. Tag verification or decoding failure is reported in
/// the outcome while `text` falls back to the raw ciphertext field.
pub fn decrypt_envelope(
    keys: &KeyManager,
    envelope: &EncryptedEnvelope,
    group_id: &str,
) -> DecryptOutcome {
    let Some(iv_b64) = envelope.iv.as_deref() else {
        return DecryptOutcome {
            text: envelope.ciphertext.clone(),
            was_encrypted: false,
            failure: None,
        };
    };

    let Some(key) = keys.group_key(group_id) else {
        return DecryptOutcome {
            text: envelope.ciphertext.clone(),
            was_encrypted: false,
            failure: None,
        };
    };

    match open_sealed(key, iv_b64, &envelope.ciphertext) {
        Ok(text) => DecryptOutcome { text, was_encrypted: true, failure: None },
        Err(reason) => DecryptOutcome {
            text: envelope.ciphertext.clone(),
            was_encrypted: true,
            failure: Some(ClientError::DecryptFailure { group_id: group_id.to_owned(), reason }),
        },
    }
}

fn open_sealed(
    key: &veil_crypto::GroupKey,
    iv_b64: &str,
    ciphertext_b64: &str,
) -> Result<String, String> {
    let iv_bytes = BASE64.decode(iv_b64).map_err(|e| format!("IV base64: {e}"))?;
    let iv = Iv::from_slice(&iv_bytes).map_err(|e| e.to_string())?;
    let ciphertext = BASE64.decode(ciphertext_b64).map_err(|e| format!("ciphertext base64: {e}"))?;

    let plaintext = key.open(&iv, &ciphertext).map_err(|e| e.to_string())?;
    String::from_utf8(plaintext).map_err(|_| "decrypted payload is not UTF-8".to_owned())
}
