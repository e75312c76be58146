//! Validation report types for segmentation conformance results.
//!
//! A report collects every issue found in one segmentation result so it can
//! be printed, logged, or inspected programmatically.

use std::fmt;

use crate::model::FrictionRidgeGeneralizedPosition;

/// The result of validating one segmentation.
#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    /// All issues found during validation.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Returns true if there are no issues at all.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns true if any issue with `code` was reported.
    pub fn has(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// Issues reported against one position.
    pub fn for_position(
        &self,
        frgp: FrictionRidgeGeneralizedPosition,
    ) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(move |i| i.context == IssueContext::Position { frgp })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return writeln!(f, "Validation passed: no issues found");
        }

        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):",
            self.error_count(),
            self.warning_count()
        )?;
        writeln!(f)?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    pub message: String,

    /// Where the issue occurred.
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Suspicious but within the contract.
    Warning,
    /// Breaks the output contract.
    Error,
}

/// A stable code identifying the type of validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IssueCode {
    // Per-position geometry
    /// Left corners are not left of right corners, or top corners are not
    /// above bottom corners.
    IrregularCoordinates,
    /// Corners do not form a rectangle.
    NonRectangularCoordinates,
    /// The rectangle is rotated for a slap kind that forbids rotation.
    Rotated,
    /// A corner lies outside the image.
    CoordinatesOutsideImage,
    /// Corners coincide or enclose no area.
    DegenerateQuadrilateral,

    // Result shape
    /// The number of positions differs from the number expected.
    IncorrectQuantity,
    /// A position was returned that the orientation does not expect.
    UnexpectedPosition,
    /// The same position was returned more than once.
    DuplicatePosition,
    /// Positions are not in the expected order.
    PositionOrder,
    /// Positions accompany a status that does not return them.
    PositionsWithoutAttempt,
    /// A successful status was returned without a single located finger.
    NoFingersLocated,
    /// Two located positions cover the same impression.
    OverlappingPositions,
}

/// Where a validation issue occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueContext {
    /// The segmentation as a whole.
    Segmentation,
    /// One returned position.
    Position {
        frgp: FrictionRidgeGeneralizedPosition,
    },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Segmentation => write!(f, "segmentation"),
            IssueContext::Position { frgp } => write!(f, "position {}", frgp),
        }
    }
}
