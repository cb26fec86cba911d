//! Production Environment implementation using OS randomness.

use tpmkey_core::{EntropyError, Environment};

/// Production environment backed by `getrandom`.
///
/// Machine seeds, public round inputs, and challenge nonces all come from
/// here in production.
///
/// # Security
///
/// `getrandom` provides OS-level cryptographic randomness. The struct holds
/// no state, so clones handed to concurrent sessions share nothing. When the
/// OS source fails the error is returned and the session ends; the buffer is
/// never filled with a fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn random_bytes(&self, buffer: &mut [u8]) -> Result<(), EntropyError> {
        getrandom::fill(buffer).map_err(|e| {
            tracing::error!("getrandom failed: {}", e);
            EntropyError { reason: e.to_string() }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_env_random_bytes_are_random() {
        let env = SystemEnv::new();

        let mut bytes1 = [0u8; 32];
        let mut bytes2 = [0u8; 32];

        env.random_bytes(&mut bytes1).expect("entropy");
        env.random_bytes(&mut bytes2).expect("entropy");

        // Extremely unlikely to be equal if random
        assert_ne!(bytes1, bytes2, "Random bytes should differ");
    }

    #[test]
    fn system_env_random_bytes_fills_buffer() {
        let env = SystemEnv::new();

        let mut bytes = [0u8; 64];
        env.random_bytes(&mut bytes).expect("entropy");

        let non_zero_count = bytes.iter().filter(|&&b| b != 0).count();
        assert!(non_zero_count > 32, "Most bytes should be non-zero");
    }

    #[test]
    fn system_env_seeds_differ_per_call() {
        let env = SystemEnv::new();
        assert_ne!(env.random_u64().expect("entropy"), env.random_u64().expect("entropy"));
    }
}
