//! Conformance validation of segmentation output.
//!
//! Checks that a [`Segmentation`] honours the output contract for the image
//! it was produced from:
//! - one position per expected finger, in order, with no strays or repeats
//! - located fingers have regular, rectangular, in-image corners
//! - rectangles are upright for slap kinds that are never rotated
//! - no two located fingers cover the same impression
//!
//! Only the shape of the result is checked; whether a finger was found in the
//! right place is a matter for scoring, not validation.

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use std::collections::{BTreeSet, HashSet};

use crate::model::{
    Coordinate, Deficiency, FrictionRidgeGeneralizedPosition, Quadrilateral, Segmentation,
    SegmentationPosition, SlapImage,
};

/// Angular slack, in degrees, allowed at each corner of a rotated rectangle.
pub const DEFAULT_ANGLE_TOLERANCE_DEG: f64 = 0.3;

/// Options for validation behavior.
#[derive(Clone, Debug)]
pub struct ValidateOptions {
    /// Largest deviation from 90° accepted at a corner of a rotatable kind.
    pub angle_tolerance_deg: f64,
    /// If true, treat warnings as errors.
    pub strict: bool,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: DEFAULT_ANGLE_TOLERANCE_DEG,
            strict: false,
        }
    }
}

/// Geometry errors of a single located position.
///
/// Kept as flags so batch logs can record them as a bit string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionErrors {
    pub irregular: bool,
    pub non_rectangular: bool,
    pub rotated: bool,
    pub outside: bool,
}

impl PositionErrors {
    /// Checks a position against the image it was segmented from.
    ///
    /// Failed positions carry no geometry and never have errors. `rotated`
    /// and `outside` are only errors for slap kinds that cannot be rotated;
    /// for the other kinds a rotated rectangle may legitimately need room.
    pub fn check(position: &SegmentationPosition, image: &SlapImage, tolerance_deg: f64) -> Self {
        let Some(quad) = position.quad() else {
            return Self::default();
        };

        let fixed = !image.kind().can_be_rotated();
        Self {
            irregular: !quad.has_regular_corners(),
            non_rectangular: if fixed {
                !is_exact_rectangle(quad)
            } else {
                !quad.is_rectangular(tolerance_deg)
            },
            rotated: fixed && quad.is_rotated(),
            outside: fixed && !inside(quad, image),
        }
    }

    pub fn any(&self) -> bool {
        self.irregular || self.non_rectangular || self.rotated || self.outside
    }

    /// Bit string, most significant first: outside, rotated,
    /// non-rectangular, irregular.
    pub fn bit_string(&self) -> String {
        [self.outside, self.rotated, self.non_rectangular, self.irregular]
            .iter()
            .map(|&b| if b { '1' } else { '0' })
            .collect()
    }
}

/// Bit string of a deficiency set, most significant first (`Incomplete`
/// down to `Artifacts`).
pub fn deficiency_bit_string(deficiencies: &BTreeSet<Deficiency>) -> String {
    Deficiency::ALL
        .iter()
        .rev()
        .map(|d| if deficiencies.contains(d) { '1' } else { '0' })
        .collect()
}

/// Validates a segmentation and returns a report of all issues found.
pub fn validate_segmentation(
    image: &SlapImage,
    segmentation: &Segmentation,
    opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    let code = segmentation.status.code();
    if !code.returns_positions() {
        if !segmentation.positions.is_empty() {
            report.add(ValidationIssue::error(
                IssueCode::PositionsWithoutAttempt,
                format!(
                    "status {} returned {} position(s)",
                    code,
                    segmentation.positions.len()
                ),
                IssueContext::Segmentation,
            ));
        }
        return finish(report, opts);
    }

    let expected = FrictionRidgeGeneralizedPosition::expected_for(image.orientation());
    validate_quantity(segmentation, expected, &mut report);

    for position in &segmentation.positions {
        validate_position(position, image, opts, &mut report);
    }
    validate_overlap(segmentation, &mut report);

    if segmentation.status.is_success() && segmentation.success_count() == 0 {
        report.add(ValidationIssue::warning(
            IssueCode::NoFingersLocated,
            "status is Success but no finger was located",
            IssueContext::Segmentation,
        ));
    }

    finish(report, opts)
}

/// Returns true when the number of positions matches the orientation.
pub fn has_correct_quantity(image: &SlapImage, segmentation: &Segmentation) -> bool {
    segmentation.positions.len()
        == FrictionRidgeGeneralizedPosition::expected_for(image.orientation()).len()
}

fn validate_quantity(
    segmentation: &Segmentation,
    expected: &[FrictionRidgeGeneralizedPosition],
    report: &mut ValidationReport,
) {
    let positions = &segmentation.positions;
    if positions.len() != expected.len() {
        report.add(ValidationIssue::error(
            IssueCode::IncorrectQuantity,
            format!(
                "expected {} position(s), found {}",
                expected.len(),
                positions.len()
            ),
            IssueContext::Segmentation,
        ));
    }

    let mut seen = HashSet::new();
    for position in positions {
        let frgp = position.frgp;
        if !expected.contains(&frgp) {
            report.add(ValidationIssue::error(
                IssueCode::UnexpectedPosition,
                format!("{} is not expected for this orientation", frgp),
                IssueContext::Position { frgp },
            ));
        } else if !seen.insert(frgp) {
            report.add(ValidationIssue::error(
                IssueCode::DuplicatePosition,
                format!("{} returned more than once", frgp),
                IssueContext::Position { frgp },
            ));
        }
    }

    let returned: Vec<_> = positions.iter().map(|p| p.frgp).collect();
    if returned.len() == expected.len() && seen.len() == expected.len() && returned != expected {
        report.add(ValidationIssue::warning(
            IssueCode::PositionOrder,
            "positions are not in anatomical order",
            IssueContext::Segmentation,
        ));
    }
}

fn validate_position(
    position: &SegmentationPosition,
    image: &SlapImage,
    opts: &ValidateOptions,
    report: &mut ValidationReport,
) {
    let Some(quad) = position.quad() else {
        return;
    };
    let frgp = position.frgp;
    let context = || IssueContext::Position { frgp };

    if quad.is_degenerate() {
        report.add(ValidationIssue::error(
            IssueCode::DegenerateQuadrilateral,
            format!("corners {:?} enclose no area", quad.corners()),
            context(),
        ));
    }

    let errors = PositionErrors::check(position, image, opts.angle_tolerance_deg);
    if errors.irregular {
        report.add(ValidationIssue::error(
            IssueCode::IrregularCoordinates,
            "left corners must be left of right corners and top corners above bottom corners",
            context(),
        ));
    }
    if errors.non_rectangular {
        report.add(ValidationIssue::error(
            IssueCode::NonRectangularCoordinates,
            format!(
                "corners are not within {}° of a rectangle",
                opts.angle_tolerance_deg
            ),
            context(),
        ));
    }
    if errors.rotated {
        report.add(ValidationIssue::error(
            IssueCode::Rotated,
            format!("{} slaps must not be rotated", image.kind()),
            context(),
        ));
    }

    if errors.outside {
        report.add(ValidationIssue::error(
            IssueCode::CoordinatesOutsideImage,
            outside_message(quad, image),
            context(),
        ));
    } else if !inside(quad, image) {
        report.add(ValidationIssue::warning(
            IssueCode::CoordinatesOutsideImage,
            outside_message(quad, image),
            context(),
        ));
    }
}

/// Warns when the centre of one located finger lies inside another.
fn validate_overlap(segmentation: &Segmentation, report: &mut ValidationReport) {
    let located: Vec<(FrictionRidgeGeneralizedPosition, &Quadrilateral)> = segmentation
        .positions
        .iter()
        .filter_map(|p| p.quad().map(|q| (p.frgp, q)))
        .collect();

    for (i, &(first, a)) in located.iter().enumerate() {
        for &(second, b) in &located[i + 1..] {
            if a.contains(centre(b)) || b.contains(centre(a)) {
                report.add(ValidationIssue::warning(
                    IssueCode::OverlappingPositions,
                    format!("{} and {} cover the same finger", first, second),
                    IssueContext::Position { frgp: second },
                ));
            }
        }
    }
}

fn centre(quad: &Quadrilateral) -> Coordinate {
    let (xmin, ymin, xmax, ymax) = quad.bounds();
    Coordinate::new(xmin + (xmax - xmin) / 2, ymin + (ymax - ymin) / 2)
}

fn outside_message(quad: &Quadrilateral, image: &SlapImage) -> String {
    let (xmin, ymin, xmax, ymax) = quad.bounds();
    format!(
        "bounds ({}, {})-({}, {}) exceed {}x{} image",
        xmin,
        ymin,
        xmax,
        ymax,
        image.width(),
        image.height()
    )
}

fn inside(quad: &Quadrilateral, image: &SlapImage) -> bool {
    quad.is_within(u32::from(image.width()), u32::from(image.height()))
}

/// Every corner is an exact right angle.
fn is_exact_rectangle(quad: &Quadrilateral) -> bool {
    let c = quad.corners();
    if quad.is_degenerate() {
        return false;
    }
    (0..4).all(|i| {
        let prev = c[(i + 3) % 4];
        let here = c[i];
        let next = c[(i + 1) % 4];
        let (ax, ay) = (
            i64::from(prev.x) - i64::from(here.x),
            i64::from(prev.y) - i64::from(here.y),
        );
        let (bx, by) = (
            i64::from(next.x) - i64::from(here.x),
            i64::from(next.y) - i64::from(here.y),
        );
        ax * bx + ay * by == 0
    })
}

fn finish(mut report: ValidationReport, opts: &ValidateOptions) -> ValidationReport {
    if opts.strict {
        for issue in &mut report.issues {
            issue.severity = Severity::Error;
        }
    }
    report
}
