//! Spectral vegetation indices
//!
//! Indices operate on single-band rasters (one band per raster) that have
//! already been promoted to `f32`. Arithmetic is done in `f64` and the
//! result narrowed back to `f32`.

use crate::maybe_rayon::*;
use ndarray::Array2;
use s2ndvi_core::raster::Raster;
use s2ndvi_core::{Error, Result};

/// Nodata value attached to index outputs
pub const INDEX_NODATA: f32 = -9999.0;

// ---------------------------------------------------------------------------
// Generic normalized difference
// ---------------------------------------------------------------------------

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Pixels where `band_a + band_b` is exactly zero are set to `0.0`, so
/// two all-zero inputs give an all-zero output. Nodata values in the
/// inputs are not masked; NaN inputs propagate as NaN.
///
/// The output carries `band_a`'s transform and CRS, with
/// [`INDEX_NODATA`] as its nodata value.
///
/// # Errors
/// [`Error::DimensionMismatch`] when the two rasters differ in shape.
pub fn normalized_difference(band_a: &Raster<f32>, band_b: &Raster<f32>) -> Result<Raster<f32>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let a = band_a.view();
    let b = band_b.view();

    let data: Vec<f32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| ratio(a[(row, col)], b[(row, col)]))
                .collect::<Vec<_>>()
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// `(a - b) / (a + b)` with a zero-sum guard.
#[inline]
fn ratio(a: f32, b: f32) -> f32 {
    let (a, b) = (a as f64, b as f64);
    let sum = a + b;
    if sum == 0.0 {
        return 0.0;
    }
    ((a - b) / sum) as f32
}

// ---------------------------------------------------------------------------
// NDVI
// ---------------------------------------------------------------------------

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// Values range from -1 to 1:
/// - Dense vegetation: 0.6 to 0.9
/// - Sparse vegetation: 0.2 to 0.5
/// - Bare soil: 0.1 to 0.2
/// - Water/clouds: -1.0 to 0.0
///
/// For Sentinel-2, NIR is band B08 and Red is band B04, both at 10 m.
///
/// # Arguments
/// * `nir` - Near-infrared band
/// * `red` - Red band
pub fn ndvi(nir: &Raster<f32>, red: &Raster<f32>) -> Result<Raster<f32>> {
    normalized_difference(nir, red)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_dimensions(a: &Raster<f32>, b: &Raster<f32>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::DimensionMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

fn build_output(
    template: &Raster<f32>,
    rows: usize,
    cols: usize,
    data: Vec<f32>,
) -> Result<Raster<f32>> {
    let array =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    let mut output = template.with_same_meta(array)?;
    output.set_nodata(Some(INDEX_NODATA));
    Ok(output)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
