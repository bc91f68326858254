use crate::domain::{
    CanonicalForm, CustomerId, DecodedId, DecodedSub, ExternalToken, IdParameters,
    IdentifierKind, PermanenceError, PermanenceParameters, SubParameters,
};

use super::{IdentifierCipher, SaltResolver};

/// Issues and resolves recipient-specific identifiers.
///
/// Holds no mutable state. One instance is shared across request handlers
/// behind an `Arc`.
pub struct PermanenceService<R, C> {
    salt_resolver: R,
    cipher: C,
}

impl<R, C> PermanenceService<R, C>
where
    R: SaltResolver,
    C: IdentifierCipher,
{
    pub fn new(salt_resolver: R, cipher: C) -> Self {
        Self {
            salt_resolver,
            cipher,
        }
    }

    /// Mint the PPID a software product sees for `customer_id`.
    pub fn encrypt_sub(
        &self,
        customer_id: &CustomerId,
        params: &SubParameters,
    ) -> Result<ExternalToken, PermanenceError> {
        let form = CanonicalForm::sub(customer_id, params)?;
        let salt = self
            .salt_resolver
            .resolve(&params.software_product_id, IdentifierKind::Sub)?;
        self.cipher.encrypt(salt, &form)
    }

    /// Resolve a PPID back to the internal customer id.
    ///
    /// Fails with `InvalidSubject` when the token decrypts but was issued for
    /// another sector or product.
    pub fn decrypt_sub(
        &self,
        external_sub: &str,
        params: &SubParameters,
    ) -> Result<CustomerId, PermanenceError> {
        let context = CanonicalForm::sub_context(params)?;
        let salt = self
            .salt_resolver
            .resolve(&params.software_product_id, IdentifierKind::Sub)?;
        let plaintext = self
            .cipher
            .decrypt(salt, IdentifierKind::Sub, &context, external_sub)?;
        let decoded = DecodedSub::parse(&plaintext)?;

        if decoded.software_product_id != params.software_product_id.as_str()
            || decoded.sector_identifier_uri != params.sector_identifier_uri.as_str()
        {
            tracing::warn!(
                software_product_id = params.software_product_id.as_str(),
                "subject token issued for a different context"
            );
            return Err(PermanenceError::InvalidSubject);
        }

        Ok(CustomerId::new(decoded.customer_id))
    }

    /// Mint the opaque form of an account id or customer reference.
    pub fn encrypt_id(
        &self,
        internal_id: &str,
        params: &IdParameters,
    ) -> Result<ExternalToken, PermanenceError> {
        let form = CanonicalForm::id(internal_id, params)?;
        let salt = self
            .salt_resolver
            .resolve(&params.software_product_id, IdentifierKind::Id)?;
        self.cipher.encrypt(salt, &form)
    }

    pub fn decrypt_id(
        &self,
        external_id: &str,
        params: &IdParameters,
    ) -> Result<String, PermanenceError> {
        let context = CanonicalForm::id_context(params)?;
        let salt = self
            .salt_resolver
            .resolve(&params.software_product_id, IdentifierKind::Id)?;
        let plaintext = self
            .cipher
            .decrypt(salt, IdentifierKind::Id, &context, external_id)?;
        let decoded = DecodedId::parse(&plaintext)?;

        if decoded.software_product_id != params.software_product_id.as_str()
            || decoded.customer_id != params.customer_id.as_str()
        {
            tracing::warn!(
                software_product_id = params.software_product_id.as_str(),
                "id token issued for a different context"
            );
            return Err(PermanenceError::InvalidSubject);
        }

        Ok(decoded.internal_id)
    }

    /// Encrypt a page of ids sharing one context. Stops at the first failure.
    pub fn encrypt_ids<S: AsRef<str>>(
        &self,
        internal_ids: &[S],
        params: &IdParameters,
    ) -> Result<Vec<ExternalToken>, PermanenceError> {
        internal_ids
            .iter()
            .map(|id| self.encrypt_id(id.as_ref(), params))
            .collect()
    }

    /// Decrypt ids sharing one context. Stops at the first failure.
    pub fn decrypt_ids<S: AsRef<str>>(
        &self,
        external_ids: &[S],
        params: &IdParameters,
    ) -> Result<Vec<String>, PermanenceError> {
        external_ids
            .iter()
            .map(|id| self.decrypt_id(id.as_ref(), params))
            .collect()
    }

    pub fn encrypt(
        &self,
        internal_id: &str,
        params: &PermanenceParameters,
    ) -> Result<ExternalToken, PermanenceError> {
        match params {
            PermanenceParameters::Sub(params) => {
                self.encrypt_sub(&CustomerId::new(internal_id), params)
            }
            PermanenceParameters::Id(params) => self.encrypt_id(internal_id, params),
        }
    }

    pub fn decrypt(
        &self,
        external: &str,
        params: &PermanenceParameters,
    ) -> Result<String, PermanenceError> {
        match params {
            PermanenceParameters::Sub(params) => {
                self.decrypt_sub(external, params).map(CustomerId::into_inner)
            }
            PermanenceParameters::Id(params) => self.decrypt_id(external, params),
        }
    }
}
