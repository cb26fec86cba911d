//! Seeded Environment implementation for deterministic testing.

use std::sync::{Arc, Mutex, PoisonError};

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tpmkey_core::{EntropyError, Environment};

/// Simulation environment with a seeded ChaCha20 stream.
///
/// Machine seeds (under `SeedPolicy::Random`), public inputs, and nonces all
/// come from this stream, so a session replays exactly given the same seed.
///
/// For testing different scenarios, create `SimEnv` with different seeds:
/// ```ignore
/// let env = SimEnv::with_seed(12345);
/// ```
#[derive(Clone)]
pub struct SimEnv {
    /// Shared across clones so that clones continue one sequence.
    rng: Arc<Mutex<ChaCha20Rng>>,
}

impl SimEnv {
    /// Create a new `SimEnv` with default seed (0)
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Create a new `SimEnv` with a specific seed
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))) }
    }
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").finish_non_exhaustive()
    }
}

impl Environment for SimEnv {
    fn random_bytes(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        // A poisoned lock still holds a usable RNG state.
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(dest);
        Ok(())
    }
}
