use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use thiserror::Error;
use zeroize::{Zeroizing, ZeroizeOnDrop};

pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

pub trait SymmetricEncryption {
    /// Encrypt `data`, binding `aad` into the authentication tag.
    fn encrypt(&self, nonce: &[u8; NONCE_LEN], data: &[u8], aad: &[u8])
        -> Result<Vec<u8>, CryptoError>;

    /// Decrypt `ciphertext || tag` produced by [`SymmetricEncryption::encrypt`].
    fn decrypt(
        &self,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed")]
    EncryptingError,
    #[error("decryption failed")]
    DecryptingError,
    #[error("invalid key")]
    InvalidKey,
    #[error("invalid ciphertext format")]
    InvalidFormat,
}

/// AES-256-GCM with caller-supplied nonces.
///
/// Nonce uniqueness per key is the caller's responsibility. The key, and
/// the expanded key schedule of each operation, are wiped on drop.
#[derive(ZeroizeOnDrop)]
pub struct AesCipher {
    key: Zeroizing<[u8; 32]>,
}

impl AesCipher {
    pub fn new(key: impl Into<Zeroizing<[u8; 32]>>) -> Self {
        Self { key: key.into() }
    }

    fn cipher(&self) -> Result<Aes256Gcm, CryptoError> {
        Aes256Gcm::new_from_slice(self.key.as_slice()).map_err(|_| CryptoError::InvalidKey)
    }

    #[cfg(test)]
    fn key_for_test(&self) -> &[u8; 32] {
        &self.key
    }
}

impl SymmetricEncryption for AesCipher {
    fn encrypt(
        &self,
        nonce: &[u8; NONCE_LEN],
        data: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.cipher()?
            .encrypt(Nonce::from_slice(nonce), Payload { msg: data, aad })
            .map_err(|_| CryptoError::EncryptingError)
    }

    fn decrypt(
        &self,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
        aad: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        if ciphertext.len() < TAG_LEN {
            return Err(CryptoError::InvalidFormat);
        }
        self.cipher()?
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad,
                },
            )
            .map_err(|_| CryptoError::DecryptingError)
    }
}

impl std::fmt::Debug for AesCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AesCipher(<redacted>)")
    }
}
