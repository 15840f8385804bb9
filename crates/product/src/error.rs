//! Error types for the NDVI pipeline

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage an error originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Locate,
    Read,
    Compute,
    Write,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Locate => "locate",
            Stage::Read => "read",
            Stage::Compute => "compute",
            Stage::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal pipeline failure. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no {marker} band file found under {}", root.display())]
    BandNotFound { marker: String, root: PathBuf },

    #[error("cannot read {}: {reason}", path.display())]
    UnreadableRaster { path: PathBuf, reason: String },

    #[error("band shapes differ: red is {red_rows}x{red_cols}, nir is {nir_rows}x{nir_cols}")]
    DimensionMismatch {
        red_rows: usize,
        red_cols: usize,
        nir_rows: usize,
        nir_cols: usize,
    },

    #[error("cannot write {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl PipelineError {
    /// Stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::BandNotFound { .. } => Stage::Locate,
            PipelineError::UnreadableRaster { .. } => Stage::Read,
            PipelineError::DimensionMismatch { .. } => Stage::Compute,
            PipelineError::Write { .. } => Stage::Write,
        }
    }
}

/// Failure to parse a Sentinel-2 product name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductNameError {
    #[error("product name has {found} fields, expected 7")]
    FieldCount { found: usize },

    #[error("invalid {field} field {value:?}: expected {expected}")]
    InvalidField {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("path {0:?} has no usable directory name")]
    NoDirectoryName(PathBuf),
}
