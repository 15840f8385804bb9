//! Band file discovery inside a Sentinel-2 product tree.
//!
//! A band file is matched on its file name: it must contain
//! `{marker}_{resolution}` (e.g. `B04_10m`) and carry a raster extension
//! (`jp2`, `tif` or `tiff`, any case). This selects
//! `GRANULE/*/IMG_DATA/R10m/T32TQM_20230615T101559_B04_10m.jp2` in an L2A
//! product and skips the 20 m and 60 m variants of the same band.
//!
//! When several files match, the lexicographically smallest full path is
//! used and the rest are reported with `warn!`.

use crate::config::{NIR_MARKER, RED_MARKER, RESOLUTION};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const RASTER_EXTENSIONS: [&str; 3] = ["jp2", "tif", "tiff"];

/// Band markers and resolution to look for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSelection {
    /// Red band marker (default `B04`)
    pub red: String,
    /// Near-infrared band marker (default `B08`)
    pub nir: String,
    /// Resolution tag joined to the marker (default `10m`)
    pub resolution: String,
}

impl Default for BandSelection {
    fn default() -> Self {
        Self {
            red: RED_MARKER.to_string(),
            nir: NIR_MARKER.to_string(),
            resolution: RESOLUTION.to_string(),
        }
    }
}

/// Located red and near-infrared band files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandPaths {
    pub red: PathBuf,
    pub nir: PathBuf,
}

/// Find both bands of `selection` under `root`.
pub fn locate_bands(root: &Path, selection: &BandSelection) -> Result<BandPaths, PipelineError> {
    let red = locate_band(root, &selection.red, &selection.resolution)?;
    let nir = locate_band(root, &selection.nir, &selection.resolution)?;
    Ok(BandPaths { red, nir })
}

/// Find the single file for `marker` at `resolution` under `root`.
///
/// An unreadable or missing `root` yields no candidates and therefore
/// [`PipelineError::BandNotFound`].
pub fn locate_band(root: &Path, marker: &str, resolution: &str) -> Result<PathBuf, PipelineError> {
    let needle = format!("{}_{}", marker, resolution);

    let mut candidates: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_band_file(path, &needle))
        .collect();

    candidates.sort();

    let mut iter = candidates.into_iter();
    let chosen = iter.next().ok_or_else(|| PipelineError::BandNotFound {
        marker: marker.to_string(),
        root: root.to_path_buf(),
    })?;

    let ignored: Vec<PathBuf> = iter.collect();
    if !ignored.is_empty() {
        warn!(
            band = %needle,
            chosen = %chosen.display(),
            ignored = ?ignored,
            "multiple band files match, using the first in path order"
        );
    }

    debug!(band = %needle, path = %chosen.display(), "located band");
    Ok(chosen)
}

fn is_band_file(path: &Path, needle: &str) -> bool {
    let name_matches = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.contains(needle))
        .unwrap_or(false);

    let ext_matches = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| RASTER_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false);

    name_matches && ext_matches
}
