//! Error types for s2ndvi core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for raster operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster dimension mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    DimensionMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Cannot read raster {}: {reason}", path.display())]
    UnreadableRaster { path: PathBuf, reason: String },

    #[error("Cannot write raster {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("GDAL error: {0}")]
    #[cfg(feature = "gdal")]
    Gdal(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

impl Error {
    /// Wrap any error as an [`Error::UnreadableRaster`] for `path`.
    pub fn unreadable(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::UnreadableRaster {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Wrap any error as an [`Error::Write`] for `path`.
    pub fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Error::Write {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias for s2ndvi core operations
pub type Result<T> = std::result::Result<T, Error>;
