//! GeoTIFF and JPEG 2000 reading using GDAL

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use gdal::Dataset;
use std::path::Path;
use tracing::debug;

/// Read the first band of any GDAL-readable raster into a Raster
///
/// Used for Sentinel-2 `.jp2` band files, which the native decoder cannot
/// handle. Samples are read as `f64` and cast to `T`.
///
/// # Example
/// ```ignore
/// let red: Raster<f32> = read_geotiff("T32TQM_20230615T101559_B04_10m.jp2")?;
/// ```
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    read_with_gdal(path).map_err(|e| Error::unreadable(path, e))
}

fn read_with_gdal<T: RasterElement>(path: &Path) -> Result<Raster<T>> {
    let dataset = Dataset::open(path)?;
    let band = dataset.rasterband(1)?;
    let (cols, rows) = dataset.raster_size();

    let buffer = band.read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)?;
    let data: Vec<T> = buffer
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect();

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }

    if let Ok(srs) = dataset.spatial_ref() {
        if let Ok(wkt) = srs.to_wkt() {
            let mut crs = CRS::from_wkt(wkt);
            if let Ok(code) = srs.auth_code() {
                crs = crs.with_epsg(code as u32);
            }
            raster.set_crs(Some(crs));
        }
    }

    if let Some(nd) = band.no_data_value().and_then(num_traits::cast) {
        raster.set_nodata(Some(nd));
    }

    debug!(path = %path.display(), rows, cols, "read raster through GDAL");
    Ok(raster)
}
