//! Environment abstraction for deterministic testing.
//!
//! Client logic never touches the system clock or RNG directly; it
//! goes through `Environment`. The session driver plugs in real
//! resources, the harness plugs in a seeded RNG, and the same client
//! code runs under both. A seed is enough to replay any simulated
//! session byte-for-byte.

use std::time::{Duration, Instant};

use rand::{CryptoRng, RngCore};

/// Time and randomness provider.
///
/// # Contract
///
/// Implementations MUST guarantee:
///
/// 1. `now()` never goes backwards within one execution context
/// 2. `random_bytes()` draws from a cryptographically secure source in
///    production, and from a seeded CSPRNG (with the seed logged) in
///    simulation
/// 3. Methods do not panic outside of truly exceptional conditions
///    such as OS entropy exhaustion
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current time.
    fn now(&self) -> Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only driver code should use this; client logic never sleeps.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    ///
    /// Convenience for session ids and similar small draws.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}

/// Bridges an [`Environment`] into the `rand` RNG traits the crypto
/// layer consumes.
///
/// The `CryptoRng` marker is justified by the trait contract above:
/// every conforming environment backs `random_bytes` with a CSPRNG.
pub struct EnvRng<'a, E: Environment> {
    env: &'a E,
}

impl<'a, E: Environment> EnvRng<'a, E> {
    /// Wraps an environment reference.
    pub fn new(env: &'a E) -> Self {
        Self { env }
    }
}

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.fill_bytes(&mut bytes);
        u32::from_le_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        let mut bytes = [0u8; 8];
        self.fill_bytes(&mut bytes);
        u64::from_le_bytes(bytes)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.env.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl<E: Environment> CryptoRng for EnvRng<'_, E> {}
