//! Error types for the geo-eval library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for geo-eval operations.
pub type Result<T> = std::result::Result<T, GeoEvalError>;

/// Error types that can occur while building or evaluating geometry collections.
#[derive(Error, Debug)]
pub enum GeoEvalError {
    /// A required input file does not exist or cannot be opened.
    #[error("cannot open {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during JSON parsing or serialization.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error during I/O operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error while parsing a TOML configuration file.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A record's geometry could not be parsed or has invalid topology.
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    /// A record's attributes are outside their valid range.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Missing required field or property.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A CRS declaration could not be understood.
    #[error("Malformed CRS: {0}")]
    MalformedCrs(String),

    /// Reprojection was requested for an EPSG code without a known projection.
    #[error("Unsupported CRS: EPSG:{0}")]
    UnsupportedCrs(u32),

    /// A collection is declared in a different coordinate reference system than required.
    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: String, found: String },

    /// Projected coordinates were not finite.
    #[error("Reprojection failed: {0}")]
    ReprojectionFailed(String),

    /// Invalid IoU threshold or threshold range.
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// A geometry operation produced an unusable result.
    #[error("Geometry operation failed: {0}")]
    GeometryOperation(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The precision-recall plot could not be produced.
    #[error("Render error: {0}")]
    Render(String),
}
