pub mod config;
pub mod crypto;
pub mod key_table;

pub use config::{PermanenceConfig, ProductSaltConfig, SubjectSaltConfig};
pub use crypto::orchestrator::identifier_cipher::DeterministicIdentifierCipher;
pub use key_table::KeyTable;
