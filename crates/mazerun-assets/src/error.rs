//! Error types for asset import and processing.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while importing or processing collision assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// An asset file could not be read.
    #[error("failed to read asset {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An asset file is not valid Wavefront OBJ.
    #[error("{path}:{line}: {reason}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// An asset file defines no faces.
    #[error("asset {path} contains no geometry")]
    Empty {
        /// File that failed.
        path: PathBuf,
    },

    /// A collision hull failed validation.
    #[error("invalid collision hull for object {object}: {reason}")]
    InvalidHull {
        /// Index of the collision object owning the hull.
        object: usize,
        /// Validation failure.
        reason: String,
    },

    /// A primitive references a hull index that does not exist.
    #[error("object {object} references hull {hull}, but only {available} hulls were imported")]
    MissingHull {
        /// Index of the collision object.
        object: usize,
        /// Referenced hull index.
        hull: u32,
        /// Number of imported hulls.
        available: usize,
    },

    /// More object kinds were loaded than the loader was sized for.
    #[error("{count} physics objects exceed the loader capacity of {max}")]
    TooManyObjects {
        /// Objects supplied.
        count: usize,
        /// Loader capacity.
        max: usize,
    },
}
