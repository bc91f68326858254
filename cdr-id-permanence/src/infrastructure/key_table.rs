use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use super::config::PermanenceConfig;
use crate::application_service::permanence_service::SaltResolver;
use crate::domain::{IdentifierKind, PermanenceError, SaltMaterial, SoftwareProductId};

struct ProductSalts {
    id_salt: SaltMaterial,
    sub_salt: Option<SaltMaterial>,
}

/// Immutable in-memory salt table, built once at startup.
///
/// - `Id` lookups require the product's own `id_salt`.
/// - `Sub` lookups use the product's `sub_salt`, falling back to the
///   system-wide subject salt.
#[derive(Default)]
pub struct KeyTable {
    subject_salt: Option<SaltMaterial>,
    products: HashMap<SoftwareProductId, ProductSalts>,
}

impl KeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and decode every configured salt.
    ///
    /// Any unusable entry fails the whole table so a misconfigured process
    /// never starts serving.
    pub fn from_config(config: &PermanenceConfig) -> Result<Self, PermanenceError> {
        let mut table = Self::new();

        if let Some(encoded) = &config.subject.salt {
            table.subject_salt = Some(decode_salt(encoded, "subject salt")?);
        }

        for (product_id, salts) in &config.products {
            if product_id.trim().is_empty() {
                return Err(PermanenceError::Configuration(
                    "software product id must not be empty".to_string(),
                ));
            }
            let id_salt = decode_salt(&salts.id_salt, &format!("id_salt of {product_id}"))?;
            let sub_salt = salts
                .sub_salt
                .as_deref()
                .map(|encoded| decode_salt(encoded, &format!("sub_salt of {product_id}")))
                .transpose()?;
            table
                .products
                .insert(SoftwareProductId::new(product_id.as_str()), ProductSalts { id_salt, sub_salt });
        }

        tracing::info!(
            products = table.products.len(),
            subject_salt = table.subject_salt.is_some(),
            "identity permanence key table loaded"
        );
        Ok(table)
    }

    pub fn with_subject_salt(mut self, salt: SaltMaterial) -> Self {
        self.subject_salt = Some(salt);
        self
    }

    pub fn with_product(
        mut self,
        software_product_id: SoftwareProductId,
        id_salt: SaltMaterial,
        sub_salt: Option<SaltMaterial>,
    ) -> Self {
        self.products
            .insert(software_product_id, ProductSalts { id_salt, sub_salt });
        self
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }
}

impl SaltResolver for KeyTable {
    fn resolve(
        &self,
        software_product_id: &SoftwareProductId,
        kind: IdentifierKind,
    ) -> Result<&SaltMaterial, PermanenceError> {
        if software_product_id.as_str().trim().is_empty() {
            return Err(PermanenceError::Configuration(
                "software product id must not be empty".to_string(),
            ));
        }

        let product = self.products.get(software_product_id);
        let salt = match kind {
            IdentifierKind::Id => product.map(|p| &p.id_salt),
            IdentifierKind::Sub => product
                .and_then(|p| p.sub_salt.as_ref())
                .or(self.subject_salt.as_ref()),
        };

        salt.ok_or_else(|| {
            tracing::error!(
                software_product_id = software_product_id.as_str(),
                %kind,
                "no identity permanence salt configured"
            );
            PermanenceError::Configuration(format!(
                "no {kind} salt configured for software product {}",
                software_product_id.as_str()
            ))
        })
    }
}

impl std::fmt::Debug for KeyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTable")
            .field("subject_salt", &self.subject_salt.is_some())
            .field("products", &self.products.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn decode_salt(encoded: &str, what: &str) -> Result<SaltMaterial, PermanenceError> {
    let bytes = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|_| PermanenceError::Configuration(format!("{what} is not valid base64")))?;
    SaltMaterial::new(bytes)
        .map_err(|e| PermanenceError::Configuration(format!("{what}: {e}")))
}
