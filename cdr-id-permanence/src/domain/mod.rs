pub mod canonical;
pub mod error;
pub mod parameters;
pub mod salt;
pub mod token;

pub use canonical::{CanonicalForm, DecodedId, DecodedSub, IdentifierKind};
pub use error::PermanenceError;
pub use parameters::{
    CustomerId, IdParameters, PermanenceParameters, SectorIdentifierUri, SoftwareProductId,
    SubParameters,
};
pub use salt::{SaltMaterial, MIN_SALT_LEN};
pub use token::ExternalToken;
