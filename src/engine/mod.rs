//! Slap segmentation engine.
//!
//! [`Segmenter`] is the interface a segmentation implementation offers;
//! [`SlapSegmenter`] is the implementation shipped with this crate. It runs
//! in stages:
//!
//! 1. [`foreground`]: Otsu threshold and a closed block map.
//! 2. [`cluster`]: connected components, split at valleys of their
//!    fingertip band.
//! 3. [`fit`]: minimum-area rectangle of each candidate's fingertip band,
//!    rotated according to the slap kind.
//! 4. [`assign`]: candidates mapped to expected finger positions.
//!
//! The engine holds only immutable configuration, so one instance can be
//! shared freely across threads.

pub mod assign;
pub mod cluster;
pub mod fit;
pub mod foreground;
pub mod orientation;

use std::collections::BTreeSet;
use std::path::Path;

use rayon::prelude::*;

use crate::config::EngineConfig;
use crate::error::SlapsegError;
use crate::model::{
    Deficiency, FrictionRidgeGeneralizedPosition, Orientation, Quadrilateral, RawSlapImage,
    ReturnStatus, RotationPolicy, Segmentation, SegmentationPosition, SlapImage, StatusCode,
    SubmissionIdentification, Supported,
};
use crate::validation::{PositionErrors, DEFAULT_ANGLE_TOLERANCE_DEG};
use assign::{Layout, Placement};
use fit::{Fit, Outline};

/// A slap segmentation implementation.
pub trait Segmenter: Send + Sync {
    /// Identification fixed at construction.
    fn identification(&self) -> SubmissionIdentification;

    /// Slap kinds and optional features this implementation supports.
    fn supported(&self) -> Supported;

    /// Segments the fingers of `image`.
    ///
    /// When the status is `Success` or `RequestRecaptureWithAttempt`,
    /// `positions` holds one entry per expected position of the image's
    /// orientation, in anatomical order; otherwise it is empty.
    fn segment(&self, image: &SlapImage) -> Segmentation;

    /// Validates `raw` and segments it.
    ///
    /// Malformed parts yield `InvalidImageData` and no positions.
    fn segment_raw(&self, raw: RawSlapImage) -> Segmentation {
        match SlapImage::try_from(raw) {
            Ok(image) => self.segment(&image),
            Err(err) => {
                log::warn!("rejecting image: {}", err);
                Segmentation::without_positions(ReturnStatus::invalid_image_data(err.to_string()))
            }
        }
    }

    /// Determines which hand `image` shows, ignoring its declared
    /// orientation.
    fn determine_orientation(&self, image: &SlapImage) -> (ReturnStatus, Orientation);
}

/// Stages 1-3 for one image.
#[derive(Debug)]
struct Analysis {
    fits: Vec<Fit>,
    low_contrast: bool,
    /// Median unconstrained rotation of the candidates, in degrees.
    median_rotation: f64,
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    })
}

/// The segmentation engine of this crate.
#[derive(Clone, Debug)]
pub struct SlapSegmenter {
    config: EngineConfig,
    identification: SubmissionIdentification,
}

impl Default for SlapSegmenter {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SlapSegmenter {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_identification(config, SubmissionIdentification::builtin())
    }

    pub fn with_identification(
        config: EngineConfig,
        identification: SubmissionIdentification,
    ) -> Self {
        Self {
            config,
            identification,
        }
    }

    /// Builds an engine from a configuration directory.
    ///
    /// Reads `slapseg.yaml` in `dir` when present and uses the defaults
    /// otherwise.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed, or when its
    /// `marketing_identifier` is not printable ASCII.
    pub fn from_config_dir(dir: &Path) -> Result<Self, SlapsegError> {
        let config = EngineConfig::from_dir(dir)?;
        let builtin = SubmissionIdentification::builtin();
        let identification = match config.marketing_identifier.as_deref() {
            Some(name) => SubmissionIdentification::new(
                builtin.library_identifier(),
                builtin.version(),
                name,
            )?,
            None => builtin,
        };
        Ok(Self::with_identification(config, identification))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Status for an image the engine cannot handle at all.
    fn precheck(&self, image: &SlapImage) -> Option<ReturnStatus> {
        if !self.config.kinds.contains(&image.kind()) {
            return Some(ReturnStatus::unsupported_slap_type(format!(
                "slap kind {} is not supported",
                image.kind()
            )));
        }
        if !self.config.resolution.accepts(image.ppi()) {
            return Some(ReturnStatus::unsupported_resolution(format!(
                "{} ppi is outside {}..={} ppi",
                image.ppi(),
                self.config.resolution.min_ppi,
                self.config.resolution.max_ppi
            )));
        }
        None
    }

    fn analyse(&self, image: &SlapImage, policy: RotationPolicy) -> Analysis {
        let ppi = f64::from(image.ppi());
        let fg = foreground::extract(image, &self.config.foreground);
        let clusters = cluster::detect(&fg.blocks, image.ppi(), &self.config.cluster);
        let band_px = (ppi * self.config.cluster.fingertip_length_in).round().max(1.0) as usize;
        let max_rotation = self.config.fit.max_rotation_deg;

        let outline_of = |candidate: &cluster::Candidate| {
            fit::outline(image, &fg, &clusters, candidate, band_px, max_rotation)
        };
        let outlines: Vec<Option<Outline>> = if self.config.parallel {
            clusters.candidates.par_iter().map(outline_of).collect()
        } else {
            clusters.candidates.iter().map(outline_of).collect()
        };
        let outlines: Vec<Outline> = outlines.into_iter().flatten().collect();

        let natural: Vec<f64> = outlines.iter().map(|o| o.natural_deg).collect();
        let median_rotation = median(&natural).unwrap_or(0.0);
        let snap_deg = self.config.fit.rotation_snap_deg;
        let angles: Vec<f64> = match policy {
            RotationPolicy::Upright => vec![0.0; outlines.len()],
            RotationPolicy::Shared => vec![fit::snap(median_rotation, snap_deg); outlines.len()],
            RotationPolicy::Independent => {
                natural.iter().map(|&a| fit::snap(a, snap_deg)).collect()
            }
        };

        let fits = outlines
            .into_iter()
            .zip(angles)
            .map(|(outline, angle)| Fit {
                quad: fit::rectangle(&outline.hull, angle, image.width(), image.height()),
                angle_deg: angle,
                natural_deg: outline.natural_deg,
                centroid_x: outline.centroid_x,
                top_y: outline.top_y,
            })
            .collect();

        Analysis {
            fits,
            low_contrast: fg.low_contrast,
            median_rotation,
        }
    }

    /// Checks a fitted quadrilateral before reporting it.
    ///
    /// A rotated fit whose rounded corners fall outside the rectangle
    /// tolerance is replaced by its upright bounds.
    fn position_for(
        &self,
        frgp: FrictionRidgeGeneralizedPosition,
        quad: Quadrilateral,
        image: &SlapImage,
    ) -> SegmentationPosition {
        let position = match quad_problem(&quad, image) {
            Some(message) => return SegmentationPosition::failed(frgp, message),
            None => SegmentationPosition::success(frgp, quad),
        };
        if !PositionErrors::check(&position, image, DEFAULT_ANGLE_TOLERANCE_DEG).any() {
            return position;
        }

        let (x0, y0, x1, y1) = quad.bounds();
        let upright = Quadrilateral::axis_aligned(x0, y0, x1, y1);
        log::debug!("{}: {:?} is not rectangular, using {:?}", frgp, quad, upright);
        if let Some(message) = quad_problem(&upright, image) {
            return SegmentationPosition::failed(frgp, message);
        }
        let position = SegmentationPosition::success(frgp, upright);
        if PositionErrors::check(&position, image, DEFAULT_ANGLE_TOLERANCE_DEG).any() {
            return SegmentationPosition::failed(frgp, "non-rectangular quadrilateral");
        }
        position
    }
}

/// Reason a quadrilateral cannot be reported, if any.
fn quad_problem(quad: &Quadrilateral, image: &SlapImage) -> Option<&'static str> {
    if quad.is_degenerate() {
        Some("degenerate quadrilateral")
    } else if !quad.is_simple() {
        Some("self-intersecting quadrilateral")
    } else if !quad.has_regular_corners() {
        Some("irregular corner order")
    } else if !quad.is_within(u32::from(image.width()), u32::from(image.height())) {
        Some("quadrilateral outside image")
    } else {
        None
    }
}

impl Segmenter for SlapSegmenter {
    fn identification(&self) -> SubmissionIdentification {
        self.identification.clone()
    }

    fn supported(&self) -> Supported {
        Supported {
            kinds: self.config.kinds.clone(),
            determines_orientation: self.config.determine_orientation,
        }
    }

    fn segment(&self, image: &SlapImage) -> Segmentation {
        if let Some(status) = self.precheck(image) {
            log::warn!("not segmenting: {}", status);
            return Segmentation::without_positions(status);
        }

        let analysis = self.analyse(image, image.kind().rotation());
        let layout = FrictionRidgeGeneralizedPosition::layout_for(image.orientation());
        let expected = FrictionRidgeGeneralizedPosition::expected_for(image.orientation());

        let mut fits = analysis.fits;
        let surplus = fits.len().saturating_sub(layout.len());
        if surplus > 0 {
            let mut by_area: Vec<usize> = (0..fits.len()).collect();
            by_area.sort_by(|&a, &b| fits[b].area().total_cmp(&fits[a].area()));
            let keep: BTreeSet<usize> = by_area[..layout.len()].iter().copied().collect();
            log::debug!("discarding {} smallest candidates", surplus);
            fits = fits
                .into_iter()
                .enumerate()
                .filter(|(i, _)| keep.contains(i))
                .map(|(_, f)| f)
                .collect();
        }
        fits.sort_by(|a, b| a.centroid_x.total_cmp(&b.centroid_x));

        let placements: Vec<Placement> = fits
            .iter()
            .map(|f| Placement {
                centroid_x: f.centroid_x,
                top_y: f.top_y,
            })
            .collect();
        let slots = assign::assign(
            &placements,
            &Layout {
                slots: layout,
                ppi: f64::from(image.ppi()),
                image_width: f64::from(image.width()),
            },
            &self.config.assign,
        );

        let positions: Vec<SegmentationPosition> = expected
            .iter()
            .map(|&frgp| {
                let matched = layout
                    .iter()
                    .position(|&slot| slot == frgp)
                    .and_then(|slot| slots[slot])
                    .map(|index| &fits[index]);
                match matched {
                    Some(matched) => self.position_for(frgp, matched.quad, image),
                    None => SegmentationPosition::not_found(frgp, ""),
                }
            })
            .collect();

        let found = positions.iter().filter(|p| p.is_success()).count();
        let mut deficiencies = BTreeSet::new();
        let mut notes = Vec::new();
        if analysis.low_contrast {
            deficiencies.insert(Deficiency::ImageQuality);
            notes.push("low contrast".to_string());
        }
        if analysis.median_rotation.abs() > self.config.fit.hand_geometry_max_deg {
            deficiencies.insert(Deficiency::HandGeometry);
            notes.push(format!("hand rotated {:.1} degrees", analysis.median_rotation));
        }
        if surplus > layout.len() {
            deficiencies.insert(Deficiency::Artifacts);
            notes.push(format!("{} extra impressions", surplus));
        }

        // Per-position outcomes never change the overall status.
        let status = if deficiencies.is_empty() {
            ReturnStatus::success()
        } else if !self.config.recapture_on_deficiency {
            log::debug!("ignoring image deficiencies: {}", notes.join("; "));
            ReturnStatus::success()
        } else {
            ReturnStatus::recapture(
                StatusCode::RequestRecaptureWithAttempt,
                deficiencies,
                notes.join("; "),
            )
            .unwrap_or_else(|err| ReturnStatus::vendor(err.to_string()))
        };

        log::debug!(
            "segmented {}x{} {} {} slap: {} ({} of {})",
            image.width(),
            image.height(),
            image.kind(),
            image.orientation(),
            status,
            found,
            expected.len()
        );

        if status.code().returns_positions() {
            Segmentation { status, positions }
        } else {
            Segmentation::without_positions(status)
        }
    }

    fn determine_orientation(&self, image: &SlapImage) -> (ReturnStatus, Orientation) {
        if !self.config.determine_orientation {
            return (
                ReturnStatus::not_implemented("orientation determination is disabled"),
                Orientation::default(),
            );
        }
        if let Some(status) = self.precheck(image) {
            return (status, Orientation::default());
        }

        let analysis = self.analyse(image, RotationPolicy::Independent);
        match orientation::infer(&analysis.fits, f64::from(image.ppi())) {
            Some(found) => {
                log::debug!("determined orientation {}", found);
                (ReturnStatus::success(), found)
            }
            None => {
                let status = ReturnStatus::recapture(
                    StatusCode::RequestRecaptureWithAttempt,
                    [Deficiency::Incomplete],
                    "fewer than two fingers found",
                )
                .unwrap_or_else(|err| ReturnStatus::vendor(err.to_string()));
                (status, Orientation::default())
            }
        }
    }
}
