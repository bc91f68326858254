use crate::domain::{
    CanonicalForm, ExternalToken, IdentifierKind, PermanenceError, SaltMaterial,
    SoftwareProductId,
};

/// Resolves the secret salt material for a software product.
///
/// Implementations must never fall back to a default salt: a missing entry is
/// a `PermanenceError::Configuration`.
pub trait SaltResolver {
    fn resolve(
        &self,
        software_product_id: &SoftwareProductId,
        kind: IdentifierKind,
    ) -> Result<&SaltMaterial, PermanenceError>;
}

/// Deterministic authenticated encryption of canonical identifier forms.
///
/// - `encrypt` must return the same token for the same form and salt.
/// - `decrypt` must fail with `PermanenceError::Decryption`, and nothing more
///   specific, for every malformed, truncated, forged or cross-context token.
pub trait IdentifierCipher {
    fn encrypt(
        &self,
        salt: &SaltMaterial,
        form: &CanonicalForm,
    ) -> Result<ExternalToken, PermanenceError>;

    /// Recover the canonical bytes of `token`, which must have been issued
    /// under `context` (see [`CanonicalForm::context`]).
    fn decrypt(
        &self,
        salt: &SaltMaterial,
        kind: IdentifierKind,
        context: &[u8],
        token: &str,
    ) -> Result<Vec<u8>, PermanenceError>;
}
