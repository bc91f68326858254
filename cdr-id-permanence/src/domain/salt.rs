use zeroize::{Zeroize, ZeroizeOnDrop};

use super::error::PermanenceError;

/// Minimum accepted length of configured salt material, in bytes.
pub const MIN_SALT_LEN: usize = 32;

/// Secret per-product key material from which identifier keys are derived.
///
/// Wiped from memory on drop.
#[derive(ZeroizeOnDrop)]
pub struct SaltMaterial(Vec<u8>);

impl SaltMaterial {
    pub fn new(mut bytes: Vec<u8>) -> Result<Self, PermanenceError> {
        let len = bytes.len();
        if len < MIN_SALT_LEN {
            bytes.zeroize();
            return Err(PermanenceError::Configuration(format!(
                "salt material must be at least {MIN_SALT_LEN} bytes, got {len}"
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl std::fmt::Debug for SaltMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SaltMaterial(<redacted>)")
    }
}
