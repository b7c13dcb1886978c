//! Anonymization digests.
//!
//! Neither function involves key material: anonymous ids are plain
//! random identity handles and [`hash_data`] is a stable fingerprint,
//! not a secrecy mechanism.

use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Byte width of an anonymous id (128 bits).
pub const ANONYMOUS_ID_SIZE: usize = 16;

/// Generates a uniformly random 128-bit id as 32 lowercase hex chars.
///
/// Unrelated to any key material; used to derive pseudonymous display
/// identities.
pub fn generate_anonymous_id<R>(rng: &mut R) -> Result<String, CryptoError>
where
    R: CryptoRng + RngCore,
{
    let mut bytes = [0u8; ANONYMOUS_ID_SIZE];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::Unavailable { reason: e.to_string() })?;
    Ok(to_hex(&bytes))
}

/// Deterministic SHA-256 hex digest of `data`.
///
/// Same input always yields the same output; used where a stable
/// anonymized fingerprint is required.
pub fn hash_data(data: &str) -> String {
    to_hex(&Sha256::digest(data.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn hashing_is_deterministic() {
        assert_eq!(hash_data("anon-seed"), hash_data("anon-seed"));
        assert_ne!(hash_data("anon-seed"), hash_data("anon-seed2"));
    }

    #[test]
    fn hash_matches_known_vector() {
        assert_eq!(
            hash_data("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn anonymous_ids_are_hex_and_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let first = generate_anonymous_id(&mut rng).unwrap();
        let second = generate_anonymous_id(&mut rng).unwrap();

        assert_eq!(first.len(), ANONYMOUS_ID_SIZE * 2);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first, second);
    }
}
