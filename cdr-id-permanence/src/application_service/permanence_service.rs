pub mod port;
pub mod service;

pub use port::{IdentifierCipher, SaltResolver};
pub use service::PermanenceService;
