//! Swaps encrypted identifiers in an authenticated principal for internal ids.

use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::application_service::permanence_service::{
    IdentifierCipher, PermanenceService, SaltResolver,
};
use crate::domain::{CustomerId, IdParameters, PermanenceError, SoftwareProductId, SubParameters};

pub const SUB: &str = "sub";
pub const SOFTWARE_ID: &str = "software_id";
pub const SECTOR_IDENTIFIER_URI: &str = "sector_identifier_uri";
pub const ACCOUNT_ID: &str = "account_id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Claims of a bearer token whose signature has already been verified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsPrincipal {
    claims: Vec<Claim>,
}

impl ClaimsPrincipal {
    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Values of every claim of `claim_type`, in token order.
    pub fn find_all(&self, claim_type: &str) -> Vec<&str> {
        self.claims
            .iter()
            .filter(|claim| claim.claim_type == claim_type)
            .map(|claim| claim.value.as_str())
            .collect()
    }

    /// The single value of `claim_type`. Repeated claims are ambiguous.
    pub fn find_single(&self, claim_type: &'static str) -> Result<Option<&str>, ClaimsTransformError> {
        match self.find_all(claim_type).as_slice() {
            [] => Ok(None),
            [value] => Ok(Some(*value)),
            _ => Err(ClaimsTransformError::AmbiguousClaim(claim_type)),
        }
    }

    fn replace_all(&mut self, claim_type: &str, mut values: impl Iterator<Item = String>) {
        for claim in self
            .claims
            .iter_mut()
            .filter(|claim| claim.claim_type == claim_type)
        {
            if let Some(value) = values.next() {
                claim.value = value;
            }
        }
    }
}

/// A request principal whose subject has been successfully decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCustomer {
    pub customer_id: CustomerId,
    pub software_product_id: SoftwareProductId,
    pub account_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimsOutcome {
    /// No subject claim: left untouched.
    Anonymous,
    Resolved(ResolvedCustomer),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClaimsTransformError {
    #[error("required claim `{0}` is missing")]
    MissingClaim(&'static str),
    #[error("claim `{0}` appears more than once")]
    AmbiguousClaim(&'static str),
    #[error(transparent)]
    Permanence(#[from] PermanenceError),
}

impl ClaimsTransformError {
    /// Whether the request should be answered with `401 invalid_token`
    /// rather than a server error.
    pub fn is_authentication_failure(&self) -> bool {
        match self {
            Self::MissingClaim(_) | Self::AmbiguousClaim(_) => true,
            Self::Permanence(e) => e.is_authentication_failure(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_authentication_failure() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

pub struct ClaimsTransformer<R, C> {
    service: Arc<PermanenceService<R, C>>,
}

impl<R, C> ClaimsTransformer<R, C>
where
    R: SaltResolver,
    C: IdentifierCipher,
{
    pub fn new(service: Arc<PermanenceService<R, C>>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &PermanenceService<R, C> {
        &self.service
    }

    /// Decrypt the `sub` and `account_id` claims in place.
    ///
    /// On error the principal is left exactly as it was; callers must then
    /// treat the request as unauthenticated.
    pub fn transform(
        &self,
        principal: &mut ClaimsPrincipal,
    ) -> Result<ClaimsOutcome, ClaimsTransformError> {
        let result = self.resolve(principal);
        match &result {
            Ok(ClaimsOutcome::Resolved(customer)) => {
                principal.replace_all(SUB, std::iter::once(customer.customer_id.as_str().to_string()));
                principal.replace_all(ACCOUNT_ID, customer.account_ids.iter().cloned());
            }
            Ok(ClaimsOutcome::Anonymous) => {}
            Err(e) => {
                let software_id = principal.find_all(SOFTWARE_ID).first().copied().unwrap_or("");
                tracing::warn!(
                    software_product_id = software_id,
                    error = %e,
                    "rejected bearer token claims"
                );
            }
        }
        result
    }

    fn resolve(&self, principal: &ClaimsPrincipal) -> Result<ClaimsOutcome, ClaimsTransformError> {
        let Some(sub) = principal.find_single(SUB)? else {
            return Ok(ClaimsOutcome::Anonymous);
        };
        let software_id = principal
            .find_single(SOFTWARE_ID)?
            .ok_or(ClaimsTransformError::MissingClaim(SOFTWARE_ID))?;
        let sector = principal
            .find_single(SECTOR_IDENTIFIER_URI)?
            .ok_or(ClaimsTransformError::MissingClaim(SECTOR_IDENTIFIER_URI))?;

        let sub_params = SubParameters::new(software_id, sector);
        let customer_id = self.service.decrypt_sub(sub, &sub_params)?;

        let id_params = IdParameters {
            customer_id: customer_id.clone(),
            software_product_id: sub_params.software_product_id,
        };
        let account_ids = self
            .service
            .decrypt_ids(&principal.find_all(ACCOUNT_ID), &id_params)?;

        Ok(ClaimsOutcome::Resolved(ResolvedCustomer {
            customer_id,
            software_product_id: id_params.software_product_id,
            account_ids,
        }))
    }
}
