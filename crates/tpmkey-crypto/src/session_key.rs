//! Session key derivation and confirmation tags.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// Size of the session key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of a confirmation tag in bytes.
pub const TAG_SIZE: usize = 32;

/// Number of hex characters in the key prefix used by diagnostics.
pub const KEY_PREFIX_LEN: usize = 8;

type HmacSha256 = Hmac<Sha256>;

/// Symmetric key derived from a weight grid.
///
/// # Security
///
/// - **Debug Redaction**: `Debug` prints only the diagnostic prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; KEY_SIZE]);

impl SessionKey {
    /// Hashes a row-major weight grid.
    ///
    /// Each weight contributes two big-endian bytes, so the digest is fixed
    /// by the grid contents and its order alone.
    pub fn derive(weights: &[i16]) -> Self {
        let mut hasher = Sha256::new();
        for weight in weights {
            hasher.update(weight.to_be_bytes());
        }
        Self(hasher.finalize().into())
    }

    /// Raw key bytes.
    pub const fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Lowercase hex encoding of the key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First [`KEY_PREFIX_LEN`] hex characters, safe to show in progress
    /// reports.
    pub fn prefix(&self) -> String {
        hex::encode(&self.0[..KEY_PREFIX_LEN / 2])
    }

    /// HMAC-SHA256 over `nonce` keyed by this session key.
    pub fn tag(&self, nonce: &[u8]) -> Result<[u8; TAG_SIZE], CryptoError> {
        let mut mac = self.mac()?;
        mac.update(nonce);
        Ok(mac.finalize().into_bytes().into())
    }

    /// Checks a peer's tag over `nonce` in constant time.
    pub fn verify(&self, nonce: &[u8], tag: &[u8]) -> Result<bool, CryptoError> {
        let mut mac = self.mac()?;
        mac.update(nonce);
        Ok(mac.verify_slice(tag).is_ok())
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        HmacSha256::new_from_slice(&self.0)
            .map_err(|_| CryptoError::InvalidKeyLength { len: self.0.len() })
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionKey").field(&format!("{}…", self.prefix())).finish()
    }
}
