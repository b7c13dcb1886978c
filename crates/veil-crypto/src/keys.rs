//! Session key material.
//!
//! [`KeyManager`] owns everything keyed: the session RSA keypair and
//! the lazily created AES-256-GCM group keys. One manager exists per
//! client session; nothing it holds is ever persisted or exported
//! except the public half of the keypair.
//!
//! # Invariants
//!
//! - At most one [`GroupKey`] exists per group id per session, and
//!   repeated lookups return the same key (reference stability).
//! - Every seal draws a fresh random [`Iv`]; an IV is never reused
//!   under the same key.

use std::collections::{HashMap, hash_map::Entry};

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rand::{CryptoRng, RngCore};
use rsa::{RsaPrivateKey, RsaPublicKey, pkcs8::EncodePublicKey};

use crate::error::CryptoError;

/// AES-256-GCM key width in bytes.
pub const GROUP_KEY_SIZE: usize = 32;

/// AES-GCM initialization vector width in bytes (96 bits).
pub const IV_SIZE: usize = 12;

/// Modulus width of the session keypair.
pub const RSA_MODULUS_BITS: usize = 2048;

/// 96-bit AEAD initialization vector.
///
/// Always exactly [`IV_SIZE`] random bytes, drawn fresh per seal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// Draws a fresh random IV.
    pub fn generate<R>(rng: &mut R) -> Result<Self, CryptoError>
    where
        R: CryptoRng + RngCore,
    {
        let mut bytes = [0u8; IV_SIZE];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Unavailable { reason: e.to_string() })?;
        Ok(Self(bytes))
    }

    /// Reconstructs an IV from decoded wire bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; IV_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::IvLength { actual: bytes.len() })?;
        Ok(Self(bytes))
    }

    /// Raw IV bytes.
    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

/// Symmetric key scoped to one group's messages.
///
/// AES-256-GCM. Created lazily on first use for a group, cached for
/// the session, never exported. Note that every client generates its
/// own key per group; there is no key agreement between participants
/// in this protocol revision.
#[derive(Clone, PartialEq, Eq)]
pub struct GroupKey([u8; GROUP_KEY_SIZE]);

impl GroupKey {
    fn generate<R>(rng: &mut R) -> Result<Self, CryptoError>
    where
        R: CryptoRng + RngCore,
    {
        let mut bytes = [0u8; GROUP_KEY_SIZE];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::Unavailable { reason: e.to_string() })?;
        Ok(Self(bytes))
    }

    /// AEAD-encrypts `plaintext` under this key and the given IV.
    ///
    /// The returned ciphertext carries the GCM tag at its tail.
    pub fn seal(&self, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0));
        cipher.encrypt(Nonce::from_slice(iv.as_bytes()), plaintext).map_err(|_| CryptoError::SealFailed)
    }

    /// AEAD-decrypts and verifies `ciphertext`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::OpenFailed`] when tag verification fails
    /// (tamper, wrong key, or corrupt data).
    pub fn open(&self, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0));
        cipher.decrypt(Nonce::from_slice(iv.as_bytes()), ciphertext).map_err(|_| CryptoError::OpenFailed)
    }
}

impl std::fmt::Debug for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GroupKey").field(&"<redacted>").finish()
    }
}

/// Per-session key lifecycle manager.
///
/// Created at session start, dropped at session end; holds the RSA
/// session keypair (2048-bit modulus, intended for OAEP/SHA-256 use by
/// out-of-band consumers) and the group-key cache. One instance per
/// session with an explicit lifecycle, never a process-wide global.
#[derive(Default)]
pub struct KeyManager {
    /// Session keypair; the public half derives from the private key.
    keypair: Option<RsaPrivateKey>,

    /// One symmetric key per group id.
    group_keys: HashMap<String, GroupKey>,
}

impl KeyManager {
    /// Creates an empty manager with no key material.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates the session keypair, replacing any prior one.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Unavailable`] when the provider cannot
    /// complete generation.
    pub fn generate_keypair<R>(&mut self, rng: &mut R) -> Result<(), CryptoError>
    where
        R: CryptoRng + RngCore,
    {
        let private = RsaPrivateKey::new(rng, RSA_MODULUS_BITS)
            .map_err(|e| CryptoError::Unavailable { reason: e.to_string() })?;
        self.keypair = Some(private);
        Ok(())
    }

    /// True once a session keypair exists.
    pub fn has_keypair(&self) -> bool {
        self.keypair.is_some()
    }

    /// Serializes the public key as base64 SPKI DER for out-of-band
    /// sharing, generating a keypair first if none exists.
    ///
    /// Returns `None` (never an error) when generation or
    /// serialization fails; callers treat that as "export unavailable"
    /// and continue messaging.
    pub fn export_public_key<R>(&mut self, rng: &mut R) -> Option<String>
    where
        R: CryptoRng + RngCore,
    {
        if self.keypair.is_none() {
            self.generate_keypair(rng).ok()?;
        }

        let private = self.keypair.as_ref()?;
        let der = RsaPublicKey::from(private).to_public_key_der().ok()?;
        Some(BASE64.encode(der.as_bytes()))
    }

    /// Returns the cached key for `group_id`, generating and caching a
    /// new AES-256-GCM key on first use.
    ///
    /// Repeated calls for the same group id within a session return the
    /// same key.
    pub fn get_or_create_group_key<R>(
        &mut self,
        group_id: &str,
        rng: &mut R,
    ) -> Result<&GroupKey, CryptoError>
    where
        R: CryptoRng + RngCore,
    {
        match self.group_keys.entry(group_id.to_owned()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => Ok(entry.insert(GroupKey::generate(rng)?)),
        }
    }

    /// Cache lookup without creation. The decrypt path uses this so an
    /// unknown group falls through to plaintext passthrough instead of
    /// minting a key that could never verify.
    pub fn group_key(&self, group_id: &str) -> Option<&GroupKey> {
        self.group_keys.get(group_id)
    }

    /// Number of groups with a cached key.
    pub fn group_key_count(&self) -> usize {
        self.group_keys.len()
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("has_keypair", &self.keypair.is_some())
            .field("group_key_count", &self.group_keys.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0x5eed)
    }

    #[test]
    fn group_key_is_stable_per_group() {
        let mut rng = rng();
        let mut keys = KeyManager::new();

        let first = keys.get_or_create_group_key("g1", &mut rng).unwrap().clone();
        let second = keys.get_or_create_group_key("g1", &mut rng).unwrap();

        // Same underlying key: data sealed by one opens under the other.
        let iv = Iv::generate(&mut rng).unwrap();
        let sealed = first.seal(&iv, b"stable").unwrap();
        assert_eq!(second.open(&iv, &sealed).unwrap(), b"stable");
        assert_eq!(keys.group_key_count(), 1);
    }

    #[test]
    fn distinct_groups_get_distinct_keys() {
        let mut rng = rng();
        let mut keys = KeyManager::new();

        let g1 = keys.get_or_create_group_key("g1", &mut rng).unwrap().clone();
        let g2 = keys.get_or_create_group_key("g2", &mut rng).unwrap().clone();

        assert_ne!(g1, g2);
        assert_eq!(keys.group_key_count(), 2);
    }

    #[test]
    fn seal_open_round_trip() {
        let mut rng = rng();
        let mut keys = KeyManager::new();
        let key = keys.get_or_create_group_key("g1", &mut rng).unwrap().clone();

        let iv = Iv::generate(&mut rng).unwrap();
        let sealed = key.seal(&iv, "привет, group".as_bytes()).unwrap();
        assert_eq!(key.open(&iv, &sealed).unwrap(), "привет, group".as_bytes());
    }

    #[test]
    fn tampered_ciphertext_fails_verification() {
        let mut rng = rng();
        let mut keys = KeyManager::new();
        let key = keys.get_or_create_group_key("g1", &mut rng).unwrap().clone();

        let iv = Iv::generate(&mut rng).unwrap();
        let mut sealed = key.seal(&iv, b"hello").unwrap();
        sealed[0] ^= 0x01;

        assert!(matches!(key.open(&iv, &sealed), Err(CryptoError::OpenFailed)));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let mut rng = rng();
        let mut keys = KeyManager::new();
        let ours = keys.get_or_create_group_key("g1", &mut rng).unwrap().clone();
        let theirs = keys.get_or_create_group_key("g2", &mut rng).unwrap().clone();

        let iv = Iv::generate(&mut rng).unwrap();
        let sealed = ours.seal(&iv, b"hello").unwrap();

        assert!(matches!(theirs.open(&iv, &sealed), Err(CryptoError::OpenFailed)));
    }

    #[test]
    fn iv_never_repeats_across_thousand_draws() {
        let mut rng = rng();
        let mut seen = HashSet::new();

        for _ in 0..1000 {
            let iv = Iv::generate(&mut rng).unwrap();
            assert!(seen.insert(*iv.as_bytes()), "IV reuse detected");
        }
    }

    #[test]
    fn iv_from_slice_rejects_wrong_width() {
        assert!(matches!(Iv::from_slice(&[0u8; 16]), Err(CryptoError::IvLength { actual: 16 })));

        let iv = Iv::from_slice(&[7u8; IV_SIZE]).unwrap();
        assert_eq!(iv.as_bytes(), &[7u8; IV_SIZE]);
    }

    #[test]
    fn keypair_generates_and_exports() {
        let mut rng = rng();
        let mut keys = KeyManager::new();
        assert!(!keys.has_keypair());

        // Export lazily creates the keypair.
        let exported = keys.export_public_key(&mut rng).unwrap();
        assert!(keys.has_keypair());
        assert!(!exported.is_empty());

        // SPKI DER decodes back out of base64.
        let der = BASE64.decode(exported.as_bytes()).unwrap();
        assert_eq!(der[0], 0x30, "SPKI export must be a DER SEQUENCE");
    }

    #[test]
    fn debug_output_redacts_key_material() {
        let mut rng = rng();
        let mut keys = KeyManager::new();
        let key = keys.get_or_create_group_key("g1", &mut rng).unwrap().clone();

        assert_eq!(format!("{key:?}"), "GroupKey(\"<redacted>\")");
        let manager = format!("{keys:?}");
        assert!(manager.contains("group_key_count: 1"));
    }
}
