//! Value objects naming the context an identifier is issued in.

use serde::{Deserialize, Serialize};
use url::Url;

use super::canonical::IdentifierKind;
use super::error::PermanenceError;

/// Identifies the accredited software product a token is issued to.
///
/// This is the unit of unlinkability: tokens minted for one product never
/// resolve under another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoftwareProductId(String);

impl SoftwareProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Sector a software product is registered under (OIDC pairwise subjects).
///
/// Absolute URIs are stored in their normalized form, with scheme and host
/// lowercased, so spellings that differ only in case share one sector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct SectorIdentifierUri(String);

impl SectorIdentifierUri {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        match Url::parse(&value) {
            Ok(url) if url.has_host() => Self(url.into()),
            _ => Self(value),
        }
    }

    /// Pick the sector identifier for a client registration (OIDC Core 8.1).
    ///
    /// The sector is always a lowercased host: that of an explicit
    /// `sector_identifier_uri` when one is registered, otherwise the single
    /// host shared by every redirect URI.
    pub fn from_registration(
        sector_identifier_uri: Option<&str>,
        redirect_uris: &[&str],
    ) -> Result<Self, PermanenceError> {
        if let Some(uri) = sector_identifier_uri.filter(|uri| !uri.trim().is_empty()) {
            return host_of(uri)
                .map(Self)
                .ok_or(PermanenceError::InvalidParameters("sector_identifier_uri"));
        }

        let mut hosts = redirect_uris
            .iter()
            .map(|raw| host_of(raw).ok_or(PermanenceError::InvalidParameters("redirect_uri")));

        let first = hosts
            .next()
            .ok_or(PermanenceError::InvalidParameters("sector_identifier_uri"))??;
        for host in hosts {
            if host? != first {
                // Multiple hosts require a registered sector_identifier_uri.
                return Err(PermanenceError::InvalidParameters("sector_identifier_uri"));
            }
        }

        Ok(Self(first))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SectorIdentifierUri {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
}

/// Internal customer identifier. Never leaves the data holder unencrypted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Context of a PPID (`sub` claim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubParameters {
    pub software_product_id: SoftwareProductId,
    pub sector_identifier_uri: SectorIdentifierUri,
}

impl SubParameters {
    pub fn new(
        software_product_id: impl Into<String>,
        sector_identifier_uri: impl Into<String>,
    ) -> Self {
        Self {
            software_product_id: SoftwareProductId::new(software_product_id),
            sector_identifier_uri: SectorIdentifierUri::new(sector_identifier_uri),
        }
    }
}

/// Context of an account id or secondary customer reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParameters {
    pub customer_id: CustomerId,
    pub software_product_id: SoftwareProductId,
}

impl IdParameters {
    pub fn new(customer_id: impl Into<String>, software_product_id: impl Into<String>) -> Self {
        Self {
            customer_id: CustomerId::new(customer_id),
            software_product_id: SoftwareProductId::new(software_product_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermanenceParameters {
    Sub(SubParameters),
    Id(IdParameters),
}

impl PermanenceParameters {
    pub fn kind(&self) -> IdentifierKind {
        match self {
            Self::Sub(_) => IdentifierKind::Sub,
            Self::Id(_) => IdentifierKind::Id,
        }
    }

    pub fn software_product_id(&self) -> &SoftwareProductId {
        match self {
            Self::Sub(params) => &params.software_product_id,
            Self::Id(params) => &params.software_product_id,
        }
    }
}

impl From<SubParameters> for PermanenceParameters {
    fn from(params: SubParameters) -> Self {
        Self::Sub(params)
    }
}

impl From<IdParameters> for PermanenceParameters {
    fn from(params: IdParameters) -> Self {
        Self::Id(params)
    }
}
