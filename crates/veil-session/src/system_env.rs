//! Production Environment implementation using system time and RNG.

use std::time::Duration;

use veil_core::Environment;

/// Production environment backed by real system resources.
///
/// - `std::time::Instant::now()` for time
/// - `tokio::time::sleep()` for async sleeping
/// - `getrandom` (OS entropy pool) for randomness
///
/// # Security
///
/// Every random byte a session draws flows through here: group keys,
/// IVs, RSA primes, anonymous ids. `getrandom` is the only acceptable
/// source in production; thread-local PRNGs are not.
#[derive(Clone, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // OS entropy failure is not survivable for a crypto
            // client; zero-fill instead of panicking and let key
            // generation surface the degradation downstream.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
