use thiserror::Error;

use super::aes_cipher::NONCE_LEN;
use crate::infrastructure::crypto::hash::hmac_sha256::{HmacError, HmacSha256Key};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonceError {
    #[error("nonce key could not be initialized")]
    InvalidKey,
    #[error("nonce does not match message")]
    Mismatch,
}

/// Derives a nonce from the message itself (synthetic IV).
///
/// The nonce is the leftmost 12 bytes of
/// `HMAC-SHA256(key, len(aad) || aad || plaintext)` with `len(aad)` as a
/// big-endian u64. Equal messages get equal nonces, distinct messages get
/// distinct nonces with overwhelming probability, so encryption is
/// deterministic without reusing a nonce across different plaintexts.
#[derive(Debug, Clone)]
pub struct SyntheticNonceGenerator {
    mac: HmacSha256Key,
}

impl SyntheticNonceGenerator {
    pub fn new(key: &[u8]) -> Result<Self, NonceError> {
        let mac = HmacSha256Key::new(key).map_err(|_| NonceError::InvalidKey)?;
        Ok(Self { mac })
    }

    pub fn generate(&self, aad: &[u8], plaintext: &[u8]) -> [u8; NONCE_LEN] {
        let aad_len = (aad.len() as u64).to_be_bytes();
        let tag = self.mac.compute(&[&aad_len[..], aad, plaintext]);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&tag[..NONCE_LEN]);
        nonce
    }

    /// Constant-time check that `nonce` was derived from this message.
    pub fn verify(
        &self,
        aad: &[u8],
        plaintext: &[u8],
        nonce: &[u8; NONCE_LEN],
    ) -> Result<(), NonceError> {
        let aad_len = (aad.len() as u64).to_be_bytes();
        self.mac
            .verify_truncated(&[&aad_len[..], aad, plaintext], nonce)
            .map_err(|e| match e {
                HmacError::InvalidKey => NonceError::InvalidKey,
                HmacError::VerificationError => NonceError::Mismatch,
            })
    }
}
