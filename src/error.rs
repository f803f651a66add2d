//! Error types for the downscaling pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop processing of a single image.
///
/// Degenerate geometry, a missing grid hint and an empty scale search are
/// not errors; they are encoded in the return values of the stages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DownscaleError {
    /// The input file could not be opened or decoded
    #[error("Failed to decode '{}': {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// The output file could not be encoded or written
    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    /// An input pattern is not a valid glob
    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    /// Other filesystem failure (e.g. creating the output directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, DownscaleError>;
