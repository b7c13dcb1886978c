//! Seeded simulation environment.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use veil_core::Environment;

/// Deterministic environment for simulation.
///
/// Randomness comes from a seeded ChaCha stream, so every run with the
/// same seed draws the same keys and IVs. The seed is logged at
/// construction for reproducibility. Time is real (this harness has no
/// virtual clock; nothing in the client core is time-dependent).
#[derive(Clone)]
pub struct SimEnv {
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Creates an environment seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        tracing::debug!("sim env seed: {}", seed);
        Self { rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))) }
    }
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}
