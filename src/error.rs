use std::path::PathBuf;
use thiserror::Error;

use crate::model::{IdentificationError, ImageError, StatusCode};
use crate::validation::ValidationReport;

/// The main error type for slapseg operations outside the engine.
#[derive(Debug, Error)]
pub enum SlapsegError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid image {name}: {source}")]
    Image {
        name: String,
        #[source]
        source: ImageError,
    },

    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid manifest {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    #[error("Failed to write log {path}: {source}")]
    LogWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write JSON: {0}")]
    JsonWrite(#[from] serde_json::Error),

    #[error("Invalid identification: {0}")]
    InvalidIdentification(#[from] IdentificationError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Segmentation returned {code}: {message}")]
    Segmentation { code: StatusCode, message: String },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
