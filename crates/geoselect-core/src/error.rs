//! Error types for geoselect

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoselectError {
    // Loading errors
    #[error("Failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Unsupported format '{extension}'. Supported: {}", supported.join(", "))]
    UnsupportedFormat {
        extension: String,
        supported: Vec<String>,
    },

    // CRS errors
    #[error("CRS mismatch: {source_crs} cannot be compared with {target_crs}: {reason}")]
    CrsMismatch {
        source_crs: String,
        target_crs: String,
        reason: String,
    },

    // Parameter errors
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    // Write errors
    #[error("File already exists at {path}. Set overwrite to replace it")]
    FileExists { path: PathBuf },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoselectError {
    /// Build a load error for `path`
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        GeoselectError::Load { path: path.into(), reason: reason.into() }
    }

    /// Build an invalid parameter error
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        GeoselectError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeoselectError>;
