//! The NDVI pipeline: locate, read, compute, write.

use crate::config::{output_path, NdviConfig};
use crate::error::PipelineError;
use crate::locate::{locate_bands, BandPaths};
use crate::name::ProductName;
use s2ndvi_algorithms::imagery::ndvi;
use s2ndvi_core::io::{read_geotiff, write_cog, CogOptions};
use s2ndvi_core::{Error, Raster};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub red: PathBuf,
    pub nir: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    pub cols: usize,
}

/// Run the whole pipeline for `config`.
///
/// Stages run in order and the first failure aborts the run; the output
/// file is only created once both bands have been read and combined.
pub fn run(config: &NdviConfig) -> Result<RunSummary, PipelineError> {
    info!(input = %config.input_dir.display(), "locating bands");
    let BandPaths { red, nir } = locate_bands(&config.input_dir, &config.bands)?;
    info!(red = %red.display(), nir = %nir.display(), "bands located");

    let mut red_band = read_band(&red)?;
    let nir_band = read_band(&nir)?;

    if red_band.crs().is_none() {
        if let Ok(product) = ProductName::from_dir(&config.input_dir) {
            let crs = product.utm_crs();
            warn!(band = %red.display(), crs = %crs, "red band has no CRS, using the product tile's UTM zone");
            red_band.set_crs(Some(crs));
        }
    }

    let index = compute_ndvi(&red_band, &nir_band)?;
    let output = write_index(&index, &config.output_dir, config.basename(), &config.cog)?;

    Ok(RunSummary {
        red,
        nir,
        output,
        rows: index.rows(),
        cols: index.cols(),
    })
}

/// Read band 1 of a band file, promoted to `f32`.
pub fn read_band(path: &Path) -> Result<Raster<f32>, PipelineError> {
    info!(path = %path.display(), "reading band");
    let raster: Raster<f32> = read_geotiff(path).map_err(|e| match e {
        Error::UnreadableRaster { path, reason } => PipelineError::UnreadableRaster { path, reason },
        other => PipelineError::UnreadableRaster {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;
    debug!(
        rows = raster.rows(),
        cols = raster.cols(),
        crs = ?raster.crs().map(|c| c.identifier()),
        "band read"
    );
    Ok(raster)
}

/// NDVI of `nir` against `red`, georeferenced like `red`.
pub fn compute_ndvi(red: &Raster<f32>, nir: &Raster<f32>) -> Result<Raster<f32>, PipelineError> {
    let mismatch = || PipelineError::DimensionMismatch {
        red_rows: red.rows(),
        red_cols: red.cols(),
        nir_rows: nir.rows(),
        nir_cols: nir.cols(),
    };
    if red.shape() != nir.shape() {
        return Err(mismatch());
    }

    info!(rows = red.rows(), cols = red.cols(), "computing NDVI");
    // ndvi only rejects differing shapes
    let mut index = ndvi(nir, red).map_err(|_| mismatch())?;
    index.set_transform(*red.transform());
    index.set_crs(red.crs().cloned());
    Ok(index)
}

/// Write `index` to `<output_dir>/<basename>.tif`, creating `output_dir`
/// if needed. Other files in `output_dir` are left untouched.
pub fn write_index(
    index: &Raster<f32>,
    output_dir: &Path,
    basename: &str,
    options: &CogOptions,
) -> Result<PathBuf, PipelineError> {
    let output = output_path(output_dir, basename);

    fs::create_dir_all(output_dir).map_err(|e| PipelineError::Write {
        path: output.clone(),
        reason: format!("cannot create {}: {}", output_dir.display(), e),
    })?;

    info!(path = %output.display(), "writing COG");
    write_cog(index, &output, options).map_err(|e| match e {
        Error::Write { path, reason } => PipelineError::Write { path, reason },
        other => PipelineError::Write {
            path: output.clone(),
            reason: other.to_string(),
        },
    })?;

    Ok(output)
}
