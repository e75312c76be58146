//! File formats around the engine.
//!
//! - [`read_slap_image`]: raw 8-bit grayscale pixel files
//! - [`manifest`]: CSV lists of images and their metadata for batch runs
//! - [`log`]: CSV logs of segmentation and orientation results
//! - [`write_segmentation_json`]: JSON rendering of a single result

pub mod log;
pub mod manifest;

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SlapsegError;
use crate::model::{CaptureTechnology, Kind, Orientation, Segmentation, SlapImage};

/// Everything about an image that its raw pixel file does not record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub width: u16,
    pub height: u16,
    pub ppi: u16,
    pub kind: Kind,
    pub capture_technology: CaptureTechnology,
    pub orientation: Orientation,
}

/// Reads a raw pixel file and pairs it with its metadata.
///
/// # Errors
/// Returns [`SlapsegError::FileRead`] if the file cannot be read and
/// [`SlapsegError::Image`] if its size does not match the metadata.
pub fn read_slap_image(path: &Path, metadata: &ImageMetadata) -> Result<SlapImage, SlapsegError> {
    let pixels = fs::read(path).map_err(|source| SlapsegError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    slap_image_from_bytes(&path.display().to_string(), metadata, pixels)
}

/// Builds an image from bytes already in memory.
pub fn slap_image_from_bytes(
    name: &str,
    metadata: &ImageMetadata,
    pixels: Vec<u8>,
) -> Result<SlapImage, SlapsegError> {
    SlapImage::new(
        metadata.width,
        metadata.height,
        metadata.ppi,
        metadata.kind,
        metadata.capture_technology,
        metadata.orientation,
        pixels,
    )
    .map_err(|source| SlapsegError::Image {
        name: name.to_string(),
        source,
    })
}

/// Writes a segmentation as pretty-printed JSON followed by a newline.
pub fn write_segmentation_json<W: Write>(
    mut writer: W,
    segmentation: &Segmentation,
) -> Result<(), SlapsegError> {
    serde_json::to_writer_pretty(&mut writer, segmentation)?;
    writeln!(writer)?;
    Ok(())
}

/// Replaces characters outside printable ASCII and space with a space so a
/// message fits on one log line.
pub fn sanitize_message(message: &str) -> String {
    message
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { ' ' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        FrictionRidgeGeneralizedPosition, Quadrilateral, ReturnStatus, SegmentationPosition,
    };
    use crate::SlapsegError;

    fn metadata() -> ImageMetadata {
        ImageMetadata {
            width: 4,
            height: 3,
            ppi: 500,
            kind: Kind::TwoInch,
            capture_technology: CaptureTechnology::Unknown,
            orientation: Orientation::Thumbs,
        }
    }

    #[test]
    fn test_read_slap_image() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("thumbs.raw");
        fs::write(&path, [255u8; 12]).expect("write raw image");

        let image = read_slap_image(&path, &metadata()).expect("read image");
        assert_eq!(image.width(), 4);
        assert_eq!(image.pixels().len(), 12);
    }

    #[test]
    fn test_read_slap_image_wrong_size() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("short.raw");
        fs::write(&path, [255u8; 11]).expect("write raw image");

        let err = read_slap_image(&path, &metadata()).unwrap_err();
        assert!(matches!(err, SlapsegError::Image { .. }));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = read_slap_image(&dir.path().join("absent.raw"), &metadata()).unwrap_err();
        assert!(matches!(err, SlapsegError::FileRead { .. }));
    }

    #[test]
    fn test_segmentation_json() {
        let segmentation = Segmentation {
            status: ReturnStatus::success(),
            positions: vec![
                SegmentationPosition::success(
                    FrictionRidgeGeneralizedPosition::LeftThumb,
                    Quadrilateral::axis_aligned(1, 2, 30, 40),
                ),
                SegmentationPosition::not_found(
                    FrictionRidgeGeneralizedPosition::RightThumb,
                    "gone",
                ),
            ],
        };
        let mut out = Vec::new();
        write_segmentation_json(&mut out, &segmentation).expect("write json");

        let value: serde_json::Value = serde_json::from_slice(&out).expect("parse json");
        assert_eq!(value["status"]["code"], "Success");
        assert_eq!(value["positions"][0]["frgp"], "LeftThumb");
        assert_eq!(value["positions"][0]["outcome"]["result"], "success");
        assert_eq!(value["positions"][1]["outcome"]["code"], "FingerNotFound");
    }

    #[test]
    fn test_sanitize_message() {
        assert_eq!(sanitize_message("plain text"), "plain text");
        assert_eq!(sanitize_message("two\nlines\ttab"), "two lines tab");
        assert_eq!(sanitize_message("caf\u{e9}"), "caf ");
        assert_eq!(sanitize_message(""), "");
    }
}
