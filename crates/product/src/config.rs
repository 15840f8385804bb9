//! Pipeline configuration

use crate::locate::BandSelection;
use s2ndvi_core::io::CogOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Output file stem used when none is given
pub const DEFAULT_BASENAME: &str = "s2-2a-10m-ndvi";

/// Red band marker
pub const RED_MARKER: &str = "B04";

/// Near-infrared band marker
pub const NIR_MARKER: &str = "B08";

/// Resolution tag of the band files to use
pub const RESOLUTION: &str = "10m";

/// Band description written into the output
pub const NDVI_DESCRIPTION: &str = "NDVI";

/// Everything a pipeline run needs, passed explicitly to [`crate::run`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NdviConfig {
    /// Product directory searched for band files
    pub input_dir: PathBuf,
    /// Directory the output is written to, created if missing
    pub output_dir: PathBuf,
    /// Output file stem; [`DEFAULT_BASENAME`] when `None`
    pub basename: Option<String>,
    pub bands: BandSelection,
    pub cog: CogOptions,
}

impl NdviConfig {
    /// Configuration with default bands and COG options
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            basename: None,
            bands: BandSelection::default(),
            cog: CogOptions {
                description: Some(NDVI_DESCRIPTION.to_string()),
                ..CogOptions::default()
            },
        }
    }

    /// Set the output file stem
    pub fn with_basename(mut self, basename: impl Into<String>) -> Self {
        self.basename = Some(basename.into());
        self
    }

    /// Output file stem in effect
    pub fn basename(&self) -> &str {
        self.basename.as_deref().unwrap_or(DEFAULT_BASENAME)
    }

    /// Full path of the output file
    pub fn output_path(&self) -> PathBuf {
        output_path(&self.output_dir, self.basename())
    }
}

pub(crate) fn output_path(output_dir: &Path, basename: &str) -> PathBuf {
    output_dir.join(format!("{}.tif", basename))
}
