//! Salt configuration loaded once at process start.
//!
//! ```toml
//! [subject]
//! salt = "<base64>"            # system-wide PPID salt (optional)
//!
//! [products."SP-1"]
//! id_salt = "<base64>"         # account / customer id salt (required)
//! sub_salt = "<base64>"        # per-product PPID salt (optional)
//! ```
//!
//! Salts are standard base64 and must decode to at least
//! [`MIN_SALT_LEN`](crate::domain::MIN_SALT_LEN) bytes.

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::MIN_SALT_LEN;

/// Environment variable holding the path of the TOML configuration file.
pub const CONFIG_PATH_ENV: &str = "CDR_ID_PERMANENCE_CONFIG";

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct PermanenceConfig {
    #[serde(default)]
    pub subject: SubjectSaltConfig,

    /// Salts keyed by software product id.
    #[serde(default)]
    pub products: BTreeMap<String, ProductSaltConfig>,
}

impl PermanenceConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load configuration from the file named by [`CONFIG_PATH_ENV`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).map_err(|_| ConfigError::MissingEnv(CONFIG_PATH_ENV))?;
        Self::from_file(path)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

impl std::fmt::Debug for PermanenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermanenceConfig")
            .field("subject", &self.subject)
            .field("products", &self.products)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SubjectSaltConfig {
    /// PPID salt shared by products without their own `sub_salt`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl std::fmt::Debug for SubjectSaltConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubjectSaltConfig")
            .field("salt", &self.salt.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProductSaltConfig {
    pub id_salt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_salt: Option<String>,
}

impl std::fmt::Debug for ProductSaltConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductSaltConfig")
            .field("id_salt", &"<redacted>")
            .field("sub_salt", &self.sub_salt.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

/// Fresh random salt of [`MIN_SALT_LEN`] bytes, base64 encoded.
pub fn generate_salt_base64() -> String {
    let mut salt = Zeroizing::new([0u8; MIN_SALT_LEN]);
    OsRng.fill_bytes(salt.as_mut_slice());
    BASE64_STANDARD.encode(salt.as_slice())
}
