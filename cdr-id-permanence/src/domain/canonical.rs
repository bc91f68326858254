//! Canonical serialization of identifier parameters.
//!
//! Every field is written as a 4-byte big-endian length followed by its UTF-8
//! bytes, after a one-byte scheme tag. Distinct field tuples therefore never
//! serialize to the same bytes, and the context fields always form a prefix of
//! the full plaintext:
//!
//! | scheme | fields (in order)                                      |
//! |--------|--------------------------------------------------------|
//! | `sub`  | sector identifier URI, software product id, customer id |
//! | `id`   | customer id, software product id, internal id          |

use super::error::PermanenceError;
use super::parameters::{CustomerId, IdParameters, SubParameters};

const LENGTH_PREFIX: usize = 4;
const FIELD_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    /// Pairwise subject identifier (PPID).
    Sub,
    /// Account ids and secondary customer references.
    Id,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Id => "id",
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Sub => b'S',
            Self::Id => b'I',
        }
    }
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic encryption input for one identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    kind: IdentifierKind,
    context_len: usize,
    bytes: Vec<u8>,
}

impl CanonicalForm {
    pub fn sub(customer_id: &CustomerId, params: &SubParameters) -> Result<Self, PermanenceError> {
        let context = Self::sub_context(params)?;
        Self::extend(IdentifierKind::Sub, context, "customer_id", customer_id.as_str())
    }

    pub fn id(internal_id: &str, params: &IdParameters) -> Result<Self, PermanenceError> {
        let context = Self::id_context(params)?;
        Self::extend(IdentifierKind::Id, context, "internal_id", internal_id)
    }

    /// Associated data for a PPID: everything except the customer id.
    pub fn sub_context(params: &SubParameters) -> Result<Vec<u8>, PermanenceError> {
        let mut out = vec![IdentifierKind::Sub.tag()];
        push_field(
            &mut out,
            "sector_identifier_uri",
            params.sector_identifier_uri.as_str(),
        )?;
        push_field(
            &mut out,
            "software_product_id",
            params.software_product_id.as_str(),
        )?;
        Ok(out)
    }

    /// Associated data for a generic id: everything except the internal id.
    pub fn id_context(params: &IdParameters) -> Result<Vec<u8>, PermanenceError> {
        let mut out = vec![IdentifierKind::Id.tag()];
        push_field(&mut out, "customer_id", params.customer_id.as_str())?;
        push_field(
            &mut out,
            "software_product_id",
            params.software_product_id.as_str(),
        )?;
        Ok(out)
    }

    fn extend(
        kind: IdentifierKind,
        mut bytes: Vec<u8>,
        name: &'static str,
        value: &str,
    ) -> Result<Self, PermanenceError> {
        let context_len = bytes.len();
        push_field(&mut bytes, name, value)?;
        Ok(Self {
            kind,
            context_len,
            bytes,
        })
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn context(&self) -> &[u8] {
        &self.bytes[..self.context_len]
    }
}

// Canonical forms carry internal ids.
impl std::fmt::Debug for CanonicalForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanonicalForm")
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Fields recovered from a decrypted PPID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSub {
    pub sector_identifier_uri: String,
    pub software_product_id: String,
    pub customer_id: String,
}

impl DecodedSub {
    pub fn parse(bytes: &[u8]) -> Result<Self, PermanenceError> {
        let [sector_identifier_uri, software_product_id, customer_id] =
            parse_fields(IdentifierKind::Sub, bytes)?;
        Ok(Self {
            sector_identifier_uri,
            software_product_id,
            customer_id,
        })
    }
}

/// Fields recovered from a decrypted generic id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedId {
    pub customer_id: String,
    pub software_product_id: String,
    pub internal_id: String,
}

impl DecodedId {
    pub fn parse(bytes: &[u8]) -> Result<Self, PermanenceError> {
        let [customer_id, software_product_id, internal_id] =
            parse_fields(IdentifierKind::Id, bytes)?;
        Ok(Self {
            customer_id,
            software_product_id,
            internal_id,
        })
    }
}

fn push_field(out: &mut Vec<u8>, name: &'static str, value: &str) -> Result<(), PermanenceError> {
    if value.trim().is_empty() {
        return Err(PermanenceError::InvalidParameters(name));
    }
    let len = u32::try_from(value.len()).map_err(|_| PermanenceError::InvalidParameters(name))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

fn parse_fields(
    kind: IdentifierKind,
    bytes: &[u8],
) -> Result<[String; FIELD_COUNT], PermanenceError> {
    let (tag, mut rest) = bytes.split_first().ok_or(PermanenceError::Decryption)?;
    if *tag != kind.tag() {
        return Err(PermanenceError::Decryption);
    }

    let mut fields: [String; FIELD_COUNT] = Default::default();
    for field in fields.iter_mut() {
        if rest.len() < LENGTH_PREFIX {
            return Err(PermanenceError::Decryption);
        }
        let (prefix, tail) = rest.split_at(LENGTH_PREFIX);
        let mut len_bytes = [0u8; LENGTH_PREFIX];
        len_bytes.copy_from_slice(prefix);
        let len = u32::from_be_bytes(len_bytes) as usize;
        if tail.len() < len {
            return Err(PermanenceError::Decryption);
        }
        let (value, tail) = tail.split_at(len);
        let value = std::str::from_utf8(value).map_err(|_| PermanenceError::Decryption)?;
        if value.trim().is_empty() {
            return Err(PermanenceError::Decryption);
        }
        *field = value.to_string();
        rest = tail;
    }

    if !rest.is_empty() {
        return Err(PermanenceError::Decryption);
    }
    Ok(fields)
}
