//! Per-finger segmentation results.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::frgp::FrictionRidgeGeneralizedPosition;
use super::quad::Quadrilateral;

/// Flat result code of one segmentation position, as written to logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResultCode {
    Success = 0,
    /// Finger not found to segment.
    FingerNotFound = 1,
    /// Finger present, but can't be segmented.
    FailedToSegment = 2,
    /// Other reason; see the message.
    VendorDefined = 3,
}

impl ResultCode {
    /// Returns the numeric code.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// The failing subset of [`ResultCode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FailureCode {
    FingerNotFound,
    FailedToSegment,
    VendorDefined,
}

impl From<FailureCode> for ResultCode {
    fn from(code: FailureCode) -> Self {
        match code {
            FailureCode::FingerNotFound => ResultCode::FingerNotFound,
            FailureCode::FailedToSegment => ResultCode::FailedToSegment,
            FailureCode::VendorDefined => ResultCode::VendorDefined,
        }
    }
}

/// Outcome of locating one expected finger.
///
/// Only a successful outcome carries geometry, so failing positions cannot
/// be mistaken for regions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PositionOutcome {
    Success {
        quad: Quadrilateral,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        message: String,
    },
    Failure {
        code: FailureCode,
        #[serde(default)]
        message: String,
    },
}

/// One expected finger slot and what was found there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationPosition {
    pub frgp: FrictionRidgeGeneralizedPosition,
    pub outcome: PositionOutcome,
}

impl SegmentationPosition {
    /// A successfully located finger.
    pub fn success(frgp: FrictionRidgeGeneralizedPosition, quad: Quadrilateral) -> Self {
        Self {
            frgp,
            outcome: PositionOutcome::Success {
                quad,
                message: String::new(),
            },
        }
    }

    /// A failed slot with the given code.
    pub fn failure(
        frgp: FrictionRidgeGeneralizedPosition,
        code: FailureCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            frgp,
            outcome: PositionOutcome::Failure {
                code,
                message: message.into(),
            },
        }
    }

    /// An expected finger that was not found.
    pub fn not_found(frgp: FrictionRidgeGeneralizedPosition, message: impl Into<String>) -> Self {
        Self::failure(frgp, FailureCode::FingerNotFound, message)
    }

    /// A finger that is present but could not be bounded.
    pub fn failed(frgp: FrictionRidgeGeneralizedPosition, message: impl Into<String>) -> Self {
        Self::failure(frgp, FailureCode::FailedToSegment, message)
    }

    /// Returns the bounding quadrilateral of a successful position.
    pub fn quad(&self) -> Option<&Quadrilateral> {
        match &self.outcome {
            PositionOutcome::Success { quad, .. } => Some(quad),
            PositionOutcome::Failure { .. } => None,
        }
    }

    /// Returns the quadrilateral, or all-zero corners for a failure.
    pub fn quad_or_zero(&self) -> Quadrilateral {
        self.quad().copied().unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PositionOutcome::Success { .. })
    }

    pub fn result_code(&self) -> ResultCode {
        match &self.outcome {
            PositionOutcome::Success { .. } => ResultCode::Success,
            PositionOutcome::Failure { code, .. } => (*code).into(),
        }
    }

    pub fn message(&self) -> &str {
        match &self.outcome {
            PositionOutcome::Success { message, .. } | PositionOutcome::Failure { message, .. } => {
                message
            }
        }
    }
}

impl fmt::Display for SegmentationPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            PositionOutcome::Success { quad, .. } => write!(
                f,
                "{:<12} tl={} tr={} bl={} br={}",
                self.frgp, quad.tl, quad.tr, quad.bl, quad.br
            ),
            PositionOutcome::Failure { code, message } => {
                write!(f, "{:<12} {:?}", self.frgp, code)?;
                if !message.is_empty() {
                    write!(f, ": {}", message)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FrictionRidgeGeneralizedPosition as Frgp;

    #[test]
    fn test_success_exposes_geometry() {
        let quad = Quadrilateral::axis_aligned(1, 2, 30, 40);
        let p = SegmentationPosition::success(Frgp::RightIndex, quad);
        assert!(p.is_success());
        assert_eq!(p.quad(), Some(&quad));
        assert_eq!(p.result_code(), ResultCode::Success);
    }

    #[test]
    fn test_failure_has_no_geometry() {
        let p = SegmentationPosition::not_found(Frgp::LeftRing, "lifted");
        assert!(!p.is_success());
        assert_eq!(p.quad(), None);
        assert_eq!(p.quad_or_zero(), Quadrilateral::default());
        assert_eq!(p.result_code(), ResultCode::FingerNotFound);
        assert_eq!(p.message(), "lifted");
    }

    #[test]
    fn test_failures_compare_without_coordinates() {
        let a = SegmentationPosition::failed(Frgp::RightRing, "merged");
        let b = SegmentationPosition::failed(Frgp::RightRing, "merged");
        assert_eq!(a, b);
        assert_eq!(a.quad_or_zero(), b.quad_or_zero());
    }

    #[test]
    fn test_json_shape() {
        let p = SegmentationPosition::not_found(Frgp::LeftThumb, "");
        let json = serde_json::to_value(&p).expect("serialize");
        assert_eq!(json["frgp"], "LeftThumb");
        assert_eq!(json["outcome"]["result"], "failure");
        assert_eq!(json["outcome"]["code"], "FingerNotFound");
    }
}
