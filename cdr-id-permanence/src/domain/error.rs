use thiserror::Error;

/// Failures of the identity permanence core.
///
/// `Display` output is for server-side logs only. Anything that reaches a data
/// recipient must go through the presentation layer, which collapses every
/// authentication failure into a generic `invalid_token`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermanenceError {
    /// Salt material is missing or unusable. Fatal for the affected product.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A collaborator supplied an incomplete set of canonical fields.
    #[error("invalid permanence parameters: missing {0}")]
    InvalidParameters(&'static str),

    /// Malformed, forged, truncated or cross-context token.
    #[error("token could not be decrypted")]
    Decryption,

    /// The token decrypted but names a different product, sector or customer.
    #[error("token does not belong to the supplied context")]
    InvalidSubject,
}

impl PermanenceError {
    /// Whether this failure should be treated as a rejected credential rather
    /// than a server fault.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::Decryption | Self::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decryption_and_subject_mismatch_are_authentication_failures() {
        assert!(PermanenceError::Decryption.is_authentication_failure());
        assert!(PermanenceError::InvalidSubject.is_authentication_failure());
    }

    #[test]
    fn defects_are_not_authentication_failures() {
        assert!(!PermanenceError::Configuration("no salt".into()).is_authentication_failure());
        assert!(!PermanenceError::InvalidParameters("customer_id").is_authentication_failure());
    }

    #[test]
    fn decryption_message_carries_no_detail() {
        assert_eq!(
            PermanenceError::Decryption.to_string(),
            "token could not be decrypted"
        );
    }
}
