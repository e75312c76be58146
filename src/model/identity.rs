//! Identification of a segmentation implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Version of the segmentation API implemented by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

pub const API_VERSION: ApiVersion = ApiVersion {
    major: 1,
    minor: 2,
    patch: 0,
};

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Reasons a [`SubmissionIdentification`] is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IdentificationError {
    #[error("library identifier must not be empty")]
    EmptyLibraryIdentifier,

    #[error("library identifier '{0}' must contain only ASCII letters and digits")]
    InvalidLibraryIdentifier(String),

    #[error("marketing identifier '{0}' must contain only printable ASCII characters")]
    InvalidMarketingIdentifier(String),
}

/// Identifies a submitted segmentation library.
///
/// Fixed when the engine is built; reading it has no side effects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SubmissionIdentification {
    library_identifier: String,
    version: u16,
    marketing_identifier: String,
}

impl SubmissionIdentification {
    /// Creates a validated identification.
    ///
    /// `library_identifier` must be non-empty ASCII alphanumeric.
    /// `marketing_identifier` may be empty but may only hold printable ASCII
    /// and spaces.
    pub fn new(
        library_identifier: impl Into<String>,
        version: u16,
        marketing_identifier: impl Into<String>,
    ) -> Result<Self, IdentificationError> {
        let library_identifier = library_identifier.into();
        let marketing_identifier = marketing_identifier.into();

        if library_identifier.is_empty() {
            return Err(IdentificationError::EmptyLibraryIdentifier);
        }
        if !library_identifier.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentificationError::InvalidLibraryIdentifier(
                library_identifier,
            ));
        }
        if !marketing_identifier
            .chars()
            .all(|c| c.is_ascii_graphic() || c == ' ')
        {
            return Err(IdentificationError::InvalidMarketingIdentifier(
                marketing_identifier,
            ));
        }

        Ok(Self {
            library_identifier,
            version,
            marketing_identifier,
        })
    }

    /// Identification of the segmenter shipped with this crate.
    pub(crate) fn builtin() -> Self {
        Self {
            library_identifier: "slapseg".to_string(),
            version: 0x0100,
            marketing_identifier: format!("slapseg {}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn library_identifier(&self) -> &str {
        &self.library_identifier
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn marketing_identifier(&self) -> &str {
        &self.marketing_identifier
    }
}

impl fmt::Display for SubmissionIdentification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{:#06x}", self.library_identifier, self.version)?;
        if !self.marketing_identifier.is_empty() {
            write!(f, " ({})", self.marketing_identifier)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identification() {
        let id = SubmissionIdentification::new("slapseg", 0x0001, "Slap Seg 1.0").unwrap();
        assert_eq!(id.library_identifier(), "slapseg");
        assert_eq!(id.version(), 1);
        assert_eq!(id.marketing_identifier(), "Slap Seg 1.0");
        assert_eq!(id.to_string(), "slapseg v0x0001 (Slap Seg 1.0)");
    }

    #[test]
    fn test_empty_marketing_identifier_allowed() {
        assert!(SubmissionIdentification::new("abc123", 2, "").is_ok());
    }

    #[test]
    fn test_library_identifier_rejected() {
        assert_eq!(
            SubmissionIdentification::new("", 1, ""),
            Err(IdentificationError::EmptyLibraryIdentifier)
        );
        assert!(matches!(
            SubmissionIdentification::new("slap-seg", 1, ""),
            Err(IdentificationError::InvalidLibraryIdentifier(_))
        ));
        assert!(matches!(
            SubmissionIdentification::new("slap seg", 1, ""),
            Err(IdentificationError::InvalidLibraryIdentifier(_))
        ));
    }

    #[test]
    fn test_marketing_identifier_rejected() {
        assert!(matches!(
            SubmissionIdentification::new("slapseg", 1, "tab\there"),
            Err(IdentificationError::InvalidMarketingIdentifier(_))
        ));
        assert!(matches!(
            SubmissionIdentification::new("slapseg", 1, "caf\u{e9}"),
            Err(IdentificationError::InvalidMarketingIdentifier(_))
        ));
    }

    #[test]
    fn test_builtin_is_valid() {
        let builtin = SubmissionIdentification::builtin();
        let checked = SubmissionIdentification::new(
            builtin.library_identifier(),
            builtin.version(),
            builtin.marketing_identifier(),
        );
        assert_eq!(checked, Ok(builtin));
    }

    #[test]
    fn test_api_version() {
        assert_eq!(API_VERSION.to_string(), "1.2.0");
    }
}
