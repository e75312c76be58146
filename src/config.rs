//! Engine configuration.
//!
//! All tunables of the segmentation engine live in [`EngineConfig`]. Lengths
//! are given in inches and converted to pixels with the resolution of each
//! image, so one configuration serves every supported ppi.
//!
//! A configuration directory may hold a `slapseg.yaml` file; any section or
//! field it omits keeps its default:
//!
//! ```yaml
//! resolution:
//!   min_ppi: 400
//!   max_ppi: 1000
//! cluster:
//!   max_finger_width_in: 0.9
//! parallel: false
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SlapsegError;
use crate::model::Kind;

/// File name looked up in a configuration directory.
pub const CONFIG_FILE_NAME: &str = "slapseg.yaml";

/// Accepted image resolutions, inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    pub min_ppi: u16,
    pub max_ppi: u16,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            min_ppi: 300,
            max_ppi: 1000,
        }
    }
}

impl ResolutionConfig {
    pub fn accepts(&self, ppi: u16) -> bool {
        (self.min_ppi..=self.max_ppi).contains(&ppi)
    }
}

/// Foreground extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForegroundConfig {
    /// Side of a square block of the block map.
    pub block_size_in: f64,
    /// Minimum ink fraction of a foreground block.
    pub min_block_fill: f64,
    /// Minimum ink fraction for scanned ink on paper.
    pub ink_min_block_fill: f64,
    /// Minimum Otsu separability (between-class over total variance).
    pub min_separability: f64,
    /// Minimum spread between the darkest and lightest gray level.
    pub min_contrast: u8,
}

impl Default for ForegroundConfig {
    fn default() -> Self {
        Self {
            block_size_in: 0.016,
            min_block_fill: 0.15,
            ink_min_block_fill: 0.25,
            min_separability: 0.5,
            min_contrast: 40,
        }
    }
}

/// Candidate detection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Components smaller than this are dropped.
    pub min_finger_area_in2: f64,
    /// Length of the fingertip band below the top of an impression.
    pub fingertip_length_in: f64,
    /// Candidates wider than this are split at column valleys.
    pub max_finger_width_in: f64,
    /// A valley splits when its depth is below this share of the smaller
    /// neighbouring peak.
    pub split_valley_ratio: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            min_finger_area_in2: 0.01,
            fingertip_length_in: 0.9,
            max_finger_width_in: 0.8,
            split_valley_ratio: 0.6,
        }
    }
}

/// Oriented quadrilateral fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Largest rotation from upright considered.
    pub max_rotation_deg: f64,
    /// Rotations smaller than this are reported upright.
    pub rotation_snap_deg: f64,
    /// A hand whose median rotation exceeds this is flagged.
    pub hand_geometry_max_deg: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_rotation_deg: 30.0,
            rotation_snap_deg: 2.0,
            hand_geometry_max_deg: 20.0,
        }
    }
}

/// Anatomical assignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignConfig {
    /// Nominal horizontal distance between neighbouring fingers.
    pub finger_pitch_in: f64,
    /// Nominal horizontal distance between the two thumbs.
    pub thumb_pitch_in: f64,
    pub arc_weight: f64,
    pub centre_weight: f64,
    pub pitch_weight: f64,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            finger_pitch_in: 0.8,
            thumb_pitch_in: 1.5,
            arc_weight: 0.25,
            centre_weight: 0.5,
            pitch_weight: 0.1,
        }
    }
}

/// Configuration of a [`SlapSegmenter`](crate::engine::SlapSegmenter).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub resolution: ResolutionConfig,
    /// Slap kinds the engine accepts.
    pub kinds: BTreeSet<Kind>,
    /// Replaces the built-in marketing identifier; printable ASCII only.
    pub marketing_identifier: Option<String>,
    pub determine_orientation: bool,
    /// Report image deficiencies (low contrast, rotated hand, extra
    /// impressions) as `RequestRecaptureWithAttempt` instead of `Success`.
    pub recapture_on_deficiency: bool,
    /// Fit candidates on the rayon thread pool.
    pub parallel: bool,
    pub foreground: ForegroundConfig,
    pub cluster: ClusterConfig,
    pub fit: FitConfig,
    pub assign: AssignConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolution: ResolutionConfig::default(),
            kinds: Kind::ALL.iter().copied().collect(),
            marketing_identifier: None,
            determine_orientation: true,
            recapture_on_deficiency: false,
            parallel: true,
            foreground: ForegroundConfig::default(),
            cluster: ClusterConfig::default(),
            fit: FitConfig::default(),
            assign: AssignConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Loads `slapseg.yaml` from `dir`, or the defaults if it is absent.
    pub fn from_dir(dir: &Path) -> Result<Self, SlapsegError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            log::debug!("no {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Loads a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, SlapsegError> {
        let data = fs::read_to_string(path).map_err(|source| SlapsegError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig =
            serde_yaml::from_str(&data).map_err(|source| SlapsegError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config
            .check()
            .map_err(|message| SlapsegError::ConfigInvalid {
                path: path.to_path_buf(),
                message,
            })?;
        Ok(config)
    }

    /// Checks value ranges, returning a description of the first problem.
    pub fn check(&self) -> Result<(), String> {
        if self.kinds.is_empty() {
            return Err("kinds must not be empty".to_string());
        }
        if self.resolution.min_ppi == 0 || self.resolution.min_ppi > self.resolution.max_ppi {
            return Err(format!(
                "resolution range {}..={} is empty",
                self.resolution.min_ppi, self.resolution.max_ppi
            ));
        }

        let positive = [
            ("foreground.block_size_in", self.foreground.block_size_in),
            ("cluster.fingertip_length_in", self.cluster.fingertip_length_in),
            ("cluster.max_finger_width_in", self.cluster.max_finger_width_in),
            ("assign.finger_pitch_in", self.assign.finger_pitch_in),
            ("assign.thumb_pitch_in", self.assign.thumb_pitch_in),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{} must be positive, got {}", name, value));
            }
        }

        let fractions = [
            ("foreground.min_block_fill", self.foreground.min_block_fill),
            ("foreground.ink_min_block_fill", self.foreground.ink_min_block_fill),
            ("foreground.min_separability", self.foreground.min_separability),
            ("cluster.split_valley_ratio", self.cluster.split_valley_ratio),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        if !(0.0..=45.0).contains(&self.fit.max_rotation_deg) {
            return Err(format!(
                "fit.max_rotation_deg must be within [0, 45], got {}",
                self.fit.max_rotation_deg
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert_eq!(config.check(), Ok(()));
        assert_eq!(config.kinds.len(), 4);
        assert!(config.resolution.accepts(500));
        assert!(!config.resolution.accepts(100));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let config = EngineConfig::from_dir(temp.path()).expect("defaults");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "resolution:\n  max_ppi: 600\nkinds: [ThreeInch]\nparallel: false\n",
        )
        .expect("write config");

        let config = EngineConfig::from_dir(temp.path()).expect("parse config");
        assert_eq!(config.resolution.min_ppi, 300);
        assert_eq!(config.resolution.max_ppi, 600);
        assert_eq!(config.kinds, BTreeSet::from([Kind::ThreeInch]));
        assert!(!config.parallel);
        assert!(!config.recapture_on_deficiency);
        assert_eq!(config.cluster, ClusterConfig::default());
    }

    #[test]
    fn test_bad_yaml_reports_path() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "resolution: [1, 2").expect("write config");

        let err = EngineConfig::from_dir(temp.path()).unwrap_err();
        assert!(matches!(err, SlapsegError::ConfigParse { .. }));
        assert!(err.to_string().contains("slapseg.yaml"));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "foreground:\n  min_block_fill: 1.5\n",
        )
        .expect("write config");

        let err = EngineConfig::from_dir(temp.path()).unwrap_err();
        assert!(matches!(err, SlapsegError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_empty_kinds_rejected() {
        let config = EngineConfig {
            kinds: BTreeSet::new(),
            ..EngineConfig::default()
        };
        assert!(config.check().is_err());
    }
}
