//! Batch manifest reader.
//!
//! A manifest is a CSV file with a header row and one row per image:
//!
//! ```text
//! name,width,height,ppi,kind,capture_technology,orientation
//! r0001.raw,1600,1000,500,TwoInch,ScannedInkOnPaper,Right
//! ```
//!
//! Enumerations are written by variant name. `name` is a path relative to
//! the image directory given to the batch driver.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{read_slap_image, ImageMetadata};
use crate::error::SlapsegError;
use crate::model::{CaptureTechnology, Kind, Orientation, SlapImage};

/// A single manifest row.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestRow {
    name: String,
    width: u16,
    height: u16,
    ppi: u16,
    kind: Kind,
    capture_technology: CaptureTechnology,
    orientation: Orientation,
}

/// One image listed in a manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub metadata: ImageMetadata,
}

impl ManifestEntry {
    /// Path of the raw image inside `image_dir`.
    pub fn path(&self, image_dir: &Path) -> PathBuf {
        image_dir.join(&self.name)
    }

    /// Reads the raw image this entry describes.
    pub fn load(&self, image_dir: &Path) -> Result<SlapImage, SlapsegError> {
        read_slap_image(&self.path(image_dir), &self.metadata)
    }
}

impl From<ManifestRow> for ManifestEntry {
    fn from(row: ManifestRow) -> Self {
        Self {
            name: row.name,
            metadata: ImageMetadata {
                width: row.width,
                height: row.height,
                ppi: row.ppi,
                kind: row.kind,
                capture_technology: row.capture_technology,
                orientation: row.orientation,
            },
        }
    }
}

/// Reads a manifest file.
///
/// # Errors
/// Returns [`SlapsegError::ManifestParse`] for malformed rows and
/// [`SlapsegError::ManifestInvalid`] for empty or repeated names.
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>, SlapsegError> {
    let file = File::open(path).map_err(|source| SlapsegError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(BufReader::new(file), path)
}

/// Reads a manifest from bytes.
///
/// Useful for fuzzing and tests without file I/O.
pub fn from_manifest_slice(bytes: &[u8]) -> Result<Vec<ManifestEntry>, SlapsegError> {
    parse_manifest(bytes, Path::new("<bytes>"))
}

fn parse_manifest<R: Read>(reader: R, path: &Path) -> Result<Vec<ManifestEntry>, SlapsegError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut entries = Vec::new();
    let mut names = HashSet::new();
    for result in csv_reader.deserialize() {
        let row: ManifestRow = result.map_err(|source| SlapsegError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

        if row.name.is_empty() {
            return Err(SlapsegError::ManifestInvalid {
                path: path.to_path_buf(),
                message: format!("row {} has an empty name", entries.len() + 1),
            });
        }
        if !names.insert(row.name.clone()) {
            return Err(SlapsegError::ManifestInvalid {
                path: path.to_path_buf(),
                message: format!("image '{}' is listed more than once", row.name),
            });
        }
        entries.push(ManifestEntry::from(row));
    }

    Ok(entries)
}
