//! Call status and the full result of a segmentation call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use super::image::{Deficiency, Kind};
use super::position::SegmentationPosition;

/// Overall result of an API call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    #[default]
    Success = 0,
    /// Image data is corrupt or malformed.
    InvalidImageData = 1,
    /// Image is not suitable; positions are not returned.
    RequestRecapture = 2,
    /// Image is not suitable, but positions were attempted and returned.
    RequestRecaptureWithAttempt = 3,
    UnsupportedResolution = 4,
    UnsupportedSlapType = 5,
    NotImplemented = 6,
    /// Vendor-defined failure; see the message.
    VendorDefined = 7,
}

impl StatusCode {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns true for the two codes that carry deficiencies.
    pub fn is_recapture(self) -> bool {
        matches!(
            self,
            StatusCode::RequestRecapture | StatusCode::RequestRecaptureWithAttempt
        )
    }

    /// Returns true if positions accompany a status with this code.
    pub fn returns_positions(self) -> bool {
        matches!(
            self,
            StatusCode::Success | StatusCode::RequestRecaptureWithAttempt
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Reasons a [`ReturnStatus`] cannot be built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("status {0} requires at least one deficiency")]
    MissingDeficiency(StatusCode),

    #[error("status {0} cannot carry deficiencies")]
    UnexpectedDeficiency(StatusCode),
}

/// Status code, image deficiencies and an optional message.
///
/// Deficiencies are present exactly when the code is a recapture request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReturnStatus {
    code: StatusCode,
    deficiencies: BTreeSet<Deficiency>,
    #[serde(skip_serializing_if = "String::is_empty")]
    message: String,
}

impl ReturnStatus {
    /// A successful status with no message.
    pub fn success() -> Self {
        Self::default()
    }

    /// A recapture request.
    ///
    /// # Errors
    /// Fails when `code` is not a recapture code or `deficiencies` is empty.
    pub fn recapture(
        code: StatusCode,
        deficiencies: impl IntoIterator<Item = Deficiency>,
        message: impl Into<String>,
    ) -> Result<Self, StatusError> {
        let deficiencies: BTreeSet<Deficiency> = deficiencies.into_iter().collect();
        if !code.is_recapture() {
            return Err(StatusError::UnexpectedDeficiency(code));
        }
        if deficiencies.is_empty() {
            return Err(StatusError::MissingDeficiency(code));
        }
        Ok(Self {
            code,
            deficiencies,
            message: message.into(),
        })
    }

    fn plain(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            deficiencies: BTreeSet::new(),
            message: message.into(),
        }
    }

    pub fn invalid_image_data(message: impl Into<String>) -> Self {
        Self::plain(StatusCode::InvalidImageData, message)
    }

    pub fn unsupported_resolution(message: impl Into<String>) -> Self {
        Self::plain(StatusCode::UnsupportedResolution, message)
    }

    pub fn unsupported_slap_type(message: impl Into<String>) -> Self {
        Self::plain(StatusCode::UnsupportedSlapType, message)
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::plain(StatusCode::NotImplemented, message)
    }

    /// Shorthand for a [`StatusCode::VendorDefined`] status.
    pub fn vendor(message: impl Into<String>) -> Self {
        Self::plain(StatusCode::VendorDefined, message)
    }

    #[inline]
    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn deficiencies(&self) -> &BTreeSet<Deficiency> {
        &self.deficiencies
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }
}

impl fmt::Display for ReturnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if !self.deficiencies.is_empty() {
            let names: Vec<String> = self.deficiencies.iter().map(|d| format!("{:?}", d)).collect();
            write!(f, " [{}]", names.join(", "))?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// Result of segmenting one slap image.
///
/// `positions` is empty unless the status code is `Success` or
/// `RequestRecaptureWithAttempt`; otherwise it holds one entry per expected
/// position, in anatomical order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Segmentation {
    pub status: ReturnStatus,
    pub positions: Vec<SegmentationPosition>,
}

impl Segmentation {
    /// A status with no positions.
    pub fn without_positions(status: ReturnStatus) -> Self {
        Self {
            status,
            positions: Vec::new(),
        }
    }

    /// Number of successfully located positions.
    pub fn success_count(&self) -> usize {
        self.positions.iter().filter(|p| p.is_success()).count()
    }
}

/// Features supported by a segmentation implementation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Supported {
    /// Slap kinds that can be segmented; never empty.
    pub kinds: BTreeSet<Kind>,
    pub determines_orientation: bool,
}
