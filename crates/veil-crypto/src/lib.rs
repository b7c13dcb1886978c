//! Veil Cryptographic Primitives
//!
//! This crate provides the cryptographic building blocks for the Veil
//! messaging client: the per-session key manager, AEAD sealing for
//! group messages, and the anonymization digests.
//!
//! # Design
//!
//! Nothing in this crate touches a system RNG or the clock. Random
//! bytes required for key generation and IVs are drawn from a
//! caller-supplied RNG, enabling:
//!
//! - Deterministic testing with seeded RNG
//! - Sans-IO architecture compatibility
//! - No coupling to application-level abstractions
//!
//! # Security Properties
//!
//! - One symmetric key per group per session; keys never leave the
//!   process and are never persisted
//! - Fresh random 96-bit IV per seal; an IV is never reused under the
//!   same key
//! - The session keypair exists only for out-of-band public-key
//!   sharing; it never protects message traffic

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod digest;
mod error;
mod keys;

pub use digest::{ANONYMOUS_ID_SIZE, generate_anonymous_id, hash_data};
pub use error::CryptoError;
pub use keys::{GROUP_KEY_SIZE, GroupKey, IV_SIZE, Iv, KeyManager, RSA_MODULUS_BITS};
