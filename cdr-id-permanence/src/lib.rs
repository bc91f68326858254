//! Identity permanence for a CDR data holder.
//!
//! Internal customer and account identifiers never leave the holder in the
//! clear. Each accredited software product instead receives deterministic,
//! reversible tokens bound to its own context: a pairwise pseudonymous `sub`
//! per sector, and opaque account or customer ids per customer and product.

pub mod application_service;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application_service::permanence_service::{
    IdentifierCipher, PermanenceService, SaltResolver,
};
pub use domain::{
    CustomerId, ExternalToken, IdParameters, IdentifierKind, PermanenceError,
    PermanenceParameters, SectorIdentifierUri, SoftwareProductId, SubParameters,
};
pub use infrastructure::{DeterministicIdentifierCipher, KeyTable, PermanenceConfig};

/// Service wired with the production salt table and cipher.
pub type DefaultPermanenceService = PermanenceService<KeyTable, DeterministicIdentifierCipher>;

/// Build the production service from a loaded configuration.
pub fn permanence_service_from_config(
    config: &PermanenceConfig,
) -> Result<DefaultPermanenceService, PermanenceError> {
    let table = KeyTable::from_config(config)?;
    Ok(PermanenceService::new(table, DeterministicIdentifierCipher))
}
