use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const HMAC_SHA256_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HmacError {
    #[error("HMAC key could not be initialized")]
    InvalidKey,
    #[error("HMAC verification failed")]
    VerificationError,
}

/// HMAC-SHA256 keyed once and reused for many messages.
#[derive(Clone)]
pub struct HmacSha256Key {
    mac: HmacSha256,
}

impl HmacSha256Key {
    pub fn new(key: &[u8]) -> Result<Self, HmacError> {
        let mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| HmacError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// Compute the MAC over the concatenation of `parts`.
    pub fn compute(&self, parts: &[&[u8]]) -> [u8; HMAC_SHA256_LEN] {
        let mut mac = self.mac.clone();
        for part in parts {
            mac.update(part);
        }
        let mut out = [0u8; HMAC_SHA256_LEN];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }

    /// Constant-time check of a (possibly truncated) MAC, comparing the
    /// leftmost `expected.len()` bytes.
    pub fn verify_truncated(&self, parts: &[&[u8]], expected: &[u8]) -> Result<(), HmacError> {
        let mut mac = self.mac.clone();
        for part in parts {
            mac.update(part);
        }
        mac.verify_truncated_left(expected)
            .map_err(|_| HmacError::VerificationError)
    }
}

impl std::fmt::Debug for HmacSha256Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacSha256Key(<redacted>)")
    }
}
