pub mod hash;
pub mod kdf;
pub mod orchestrator;
pub mod symmetric;
