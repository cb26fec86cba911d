//! tpmkey Cryptographic Primitives
//!
//! Turns a synchronized weight grid into a symmetric session key and proves
//! possession of that key with HMAC tags.
//!
//! # Design
//!
//! All functions in this crate are pure. Nonces are supplied by the caller,
//! so the protocol layer stays deterministic under a seeded environment.
//!
//! # Security Properties
//!
//! - The key is SHA-256 over the weights, each serialized as a 2-byte
//!   big-endian signed integer in row-major order. Any weight change yields a
//!   different key.
//! - Tags are HMAC-SHA256(key, nonce). Verification is constant-time.
//! - Nothing here authenticates the exchanged round bits. An active attacker
//!   who rewrites `x`/`tau` records is out of scope.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod session_key;

pub use error::CryptoError;
pub use session_key::{KEY_PREFIX_LEN, KEY_SIZE, SessionKey, TAG_SIZE};
