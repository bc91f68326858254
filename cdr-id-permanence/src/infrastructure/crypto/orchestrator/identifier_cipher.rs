use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::application_service::permanence_service::IdentifierCipher;
use crate::domain::{CanonicalForm, ExternalToken, IdentifierKind, PermanenceError, SaltMaterial};
use crate::infrastructure::crypto::kdf::hkdf::HkdfKeyDerivation;
use crate::infrastructure::crypto::symmetric::aes_cipher::{
    AesCipher, SymmetricEncryption, NONCE_LEN, TAG_LEN,
};
use crate::infrastructure::crypto::symmetric::nonce::SyntheticNonceGenerator;

/// Leading byte of every token. Bump when the construction changes.
pub const TOKEN_VERSION: u8 = 0x01;

const HKDF_SALT: &[u8] = b"cdr-id-permanence/v1";
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Deterministic AEAD over canonical identifier forms.
///
/// Per identifier kind, two 256-bit keys are derived from the product salt
/// with HKDF-SHA256: one for AES-256-GCM and one for the synthetic nonce. A
/// token is `base64url(version || nonce || ciphertext || tag)` without
/// padding. The canonical context is bound as AAD, so a token replayed under a
/// different product, sector or customer fails the GCM tag check.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicIdentifierCipher;

struct DerivedKeys {
    cipher: AesCipher,
    nonce: SyntheticNonceGenerator,
}

impl DeterministicIdentifierCipher {
    fn derive_keys(salt: &SaltMaterial, kind: IdentifierKind) -> Result<DerivedKeys, PermanenceError> {
        let derive = |purpose: &str| {
            let info = format!("{kind}/{purpose}");
            HkdfKeyDerivation::derive_256_bit_key(
                salt.as_bytes(),
                Some(HKDF_SALT),
                Some(info.as_bytes()),
            )
            .map_err(|e| PermanenceError::Configuration(format!("key derivation failed: {e}")))
        };

        let cipher = AesCipher::new(derive("aes-256-gcm")?);
        let nonce_key = derive("synthetic-nonce")?;
        let nonce = SyntheticNonceGenerator::new(nonce_key.as_slice())
            .map_err(|e| PermanenceError::Configuration(format!("key derivation failed: {e}")))?;

        Ok(DerivedKeys { cipher, nonce })
    }
}

impl IdentifierCipher for DeterministicIdentifierCipher {
    fn encrypt(
        &self,
        salt: &SaltMaterial,
        form: &CanonicalForm,
    ) -> Result<ExternalToken, PermanenceError> {
        let keys = Self::derive_keys(salt, form.kind())?;
        let aad = form.context();
        let plaintext = form.as_bytes();

        let nonce = keys.nonce.generate(aad, plaintext);
        let ciphertext = keys
            .cipher
            .encrypt(&nonce, plaintext, aad)
            .map_err(|e| PermanenceError::Configuration(format!("encryption failed: {e}")))?;

        let mut token = Vec::with_capacity(HEADER_LEN + ciphertext.len());
        token.push(TOKEN_VERSION);
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);

        Ok(ExternalToken::new(URL_SAFE_NO_PAD.encode(token)))
    }

    fn decrypt(
        &self,
        salt: &SaltMaterial,
        kind: IdentifierKind,
        context: &[u8],
        token: &str,
    ) -> Result<Vec<u8>, PermanenceError> {
        let Ok(raw) = URL_SAFE_NO_PAD.decode(token) else {
            tracing::debug!(%kind, "rejected identifier token: malformed encoding");
            return Err(PermanenceError::Decryption);
        };
        if raw.len() <= HEADER_LEN + TAG_LEN || raw[0] != TOKEN_VERSION {
            tracing::debug!(%kind, "rejected identifier token: malformed layout");
            return Err(PermanenceError::Decryption);
        }

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&raw[1..HEADER_LEN]);

        let keys = Self::derive_keys(salt, kind)?;
        let Ok(plaintext) = keys.cipher.decrypt(&nonce, &raw[HEADER_LEN..], context) else {
            tracing::debug!(%kind, "rejected identifier token: authentication failed");
            return Err(PermanenceError::Decryption);
        };
        if keys.nonce.verify(context, &plaintext, &nonce).is_err() {
            tracing::debug!(%kind, "rejected identifier token: nonce mismatch");
            return Err(PermanenceError::Decryption);
        }

        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CustomerId, IdParameters, SubParameters};

    fn salt(byte: u8) -> SaltMaterial {
        SaltMaterial::new(vec![byte; 32]).unwrap()
    }

    fn account_form(account: &str, product: &str) -> CanonicalForm {
        CanonicalForm::id(account, &IdParameters::new("C-123", product)).unwrap()
    }

    fn open(salt: &SaltMaterial, form: &CanonicalForm, token: &str) -> Result<Vec<u8>, PermanenceError> {
        DeterministicIdentifierCipher.decrypt(salt, form.kind(), form.context(), token)
    }

    #[test]
    fn test_encrypt_and_decrypt() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        assert_eq!(open(&salt, &form, token.as_str()).unwrap(), form.as_bytes());
    }

    #[test]
    fn test_encryption_is_deterministic() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let a = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        let b = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_is_url_safe() {
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt(1), &form).unwrap();
        assert!(token
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_different_accounts_get_different_nonces() {
        let salt = salt(1);
        let a = DeterministicIdentifierCipher
            .encrypt(&salt, &account_form("A-1", "SP-1"))
            .unwrap();
        let b = DeterministicIdentifierCipher
            .encrypt(&salt, &account_form("A-2", "SP-1"))
            .unwrap();
        let a = URL_SAFE_NO_PAD.decode(a.as_str()).unwrap();
        let b = URL_SAFE_NO_PAD.decode(b.as_str()).unwrap();
        assert_ne!(a[1..HEADER_LEN], b[1..HEADER_LEN]);
    }

    #[test]
    fn test_wrong_salt_fails() {
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt(1), &form).unwrap();
        assert_eq!(
            open(&salt(2), &form, token.as_str()),
            Err(PermanenceError::Decryption)
        );
    }

    #[test]
    fn test_wrong_context_fails() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        let other = account_form("A-999", "SP-2");
        assert_eq!(
            open(&salt, &other, token.as_str()),
            Err(PermanenceError::Decryption)
        );
    }

    #[test]
    fn test_kinds_use_separate_keys() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        assert_eq!(
            DeterministicIdentifierCipher.decrypt(
                &salt,
                IdentifierKind::Sub,
                form.context(),
                token.as_str()
            ),
            Err(PermanenceError::Decryption)
        );
    }

    #[test]
    fn test_every_bit_flip_is_rejected() {
        let salt = salt(1);
        let form =
            CanonicalForm::sub(&CustomerId::new("C-123"), &SubParameters::new("SP-1", "https://adr.example"))
                .unwrap();
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();

        // Tokens travel as text, so tamper with the characters themselves.
        for index in 0..token.as_str().len() {
            for bit in 0..7 {
                let mut tampered = token.as_str().as_bytes().to_vec();
                tampered[index] ^= 1 << bit;
                let tampered = String::from_utf8(tampered).unwrap();
                assert_eq!(
                    open(&salt, &form, &tampered),
                    Err(PermanenceError::Decryption),
                    "flip of bit {bit} in character {index} was accepted"
                );
            }
        }
    }

    #[test]
    fn test_every_decoded_bit_flip_is_rejected() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(token.as_str()).unwrap();

        for index in 0..raw.len() {
            for bit in 0..8 {
                let mut tampered = raw.clone();
                tampered[index] ^= 1 << bit;
                let tampered = URL_SAFE_NO_PAD.encode(tampered);
                assert_eq!(
                    open(&salt, &form, &tampered),
                    Err(PermanenceError::Decryption),
                    "flip of bit {bit} in byte {index} was accepted"
                );
            }
        }
    }

    #[test]
    fn test_malformed_tokens_fail_identically() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        let truncated = &token.as_str()[..token.as_str().len() - 4];

        for bad in ["", "not base64!", "AQ", truncated, "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"] {
            assert_eq!(
                open(&salt, &form, bad),
                Err(PermanenceError::Decryption),
                "token {bad:?} was accepted"
            );
        }
    }

    #[test]
    fn test_padded_encoding_is_rejected() {
        let salt = salt(1);
        let form = account_form("A-999", "SP-1");
        let token = DeterministicIdentifierCipher.encrypt(&salt, &form).unwrap();
        let padded = format!("{}=", token.as_str());
        assert_eq!(open(&salt, &form, &padded), Err(PermanenceError::Decryption));
    }
}
