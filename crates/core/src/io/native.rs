//! Native GeoTIFF reading (without GDAL dependency)
//!
//! Uses the `tiff` crate for decoding. Stripped and tiled layouts and the
//! common compressions are supported. Only band 1 is returned, also from
//! multi-band files. JPEG 2000 band files need the `gdal` feature.

use crate::error::{Error, Result};
use crate::io::geokeys::{self, tags};
use crate::raster::{GeoTransform, Raster, RasterElement};
use num_traits::NumCast;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

/// Read the first band of a GeoTIFF file into a Raster
///
/// Samples of any integer or float type are cast to `T`. Georeferencing
/// comes from ModelPixelScale + ModelTiepoint (or ModelTransformation),
/// the CRS from the GeoKeyDirectory, and nodata from `GDAL_NODATA`.
///
/// The file handle is owned by this function and closed before it returns.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if is_jpeg2000(path) {
        return Err(Error::unreadable(
            path,
            "JPEG 2000 bands can only be read with the `gdal` feature enabled",
        ));
    }

    let file = File::open(path).map_err(|e| Error::unreadable(path, e))?;
    let raster = decode_geotiff(BufReader::new(file)).map_err(|e| Error::unreadable(path, e))?;
    debug!(
        path = %path.display(),
        rows = raster.rows(),
        cols = raster.cols(),
        "decoded GeoTIFF"
    );
    Ok(raster)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn is_jpeg2000(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jp2"))
        .unwrap_or(false)
}

/// Internal: decode a GeoTIFF from any `Read + Seek` source
fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?
        .with_limits(Limits::unlimited());

    // Fails for sample layouts the decoder cannot expand
    let color = decoder
        .colortype()
        .map_err(|e| Error::UnsupportedDataType(format!("Cannot read sample layout: {}", e)))?;
    let stride = band_stride(&mut decoder);
    debug!(color = ?color, stride, "sample layout");

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;

    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;

    let data: Vec<T> = match result {
        DecodingResult::U8(buf) => first_band(buf, stride),
        DecodingResult::U16(buf) => first_band(buf, stride),
        DecodingResult::U32(buf) => first_band(buf, stride),
        DecodingResult::U64(buf) => first_band(buf, stride),
        DecodingResult::I8(buf) => first_band(buf, stride),
        DecodingResult::I16(buf) => first_band(buf, stride),
        DecodingResult::I32(buf) => first_band(buf, stride),
        DecodingResult::I64(buf) => first_band(buf, stride),
        DecodingResult::F32(buf) => first_band(buf, stride),
        DecodingResult::F64(buf) => first_band(buf, stride),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

/// Distance between consecutive band-1 samples in the decoded buffer.
///
/// Pixel-interleaved images hold `SamplesPerPixel` values per pixel. For
/// band-separate images the decoder only returns the first plane.
fn band_stride<R: Read + Seek>(decoder: &mut Decoder<R>) -> usize {
    let planar = find_u32(decoder, tags::PLANAR_CONFIG).unwrap_or(1);
    if planar == 2 {
        return 1;
    }
    find_u32(decoder, tags::SAMPLES_PER_PIXEL)
        .map(|n| n.max(1) as usize)
        .unwrap_or(1)
}

/// Band 1 of a pixel-interleaved buffer, cast to `T`
fn first_band<S, T>(buf: Vec<S>, stride: usize) -> Vec<T>
where
    S: NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .step_by(stride)
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn find_u32<R: Read + Seek>(decoder: &mut Decoder<R>, tag: u16) -> Option<u32> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(tag))
        .ok()
        .flatten()
        .and_then(|v| v.into_u32().ok())
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, tag: u16) -> Option<Vec<f64>> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(tag))
        .ok()
        .flatten()
        .and_then(|v| v.into_f64_vec().ok())
}

fn find_ascii<R: Read + Seek>(decoder: &mut Decoder<R>, tag: u16) -> Option<String> {
    decoder
        .find_tag(Tag::from_u16_exhaustive(tag))
        .ok()
        .flatten()
        .and_then(|v| v.into_string().ok())
}

/// Read the geotransform from ModelPixelScale + ModelTiepoint, falling
/// back to ModelTransformation.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = find_f64_vec(decoder, tags::MODEL_PIXEL_SCALE);
    let tiepoint = find_f64_vec(decoder, tags::MODEL_TIEPOINT);

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if let Some(gt) = GeoTransform::from_tiepoint_and_scale(&tiepoint, &scale) {
            return Some(gt);
        }
    }

    find_f64_vec(decoder, tags::MODEL_TRANSFORMATION)
        .and_then(|m| GeoTransform::from_model_transformation(&m))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<crate::CRS> {
    let directory = decoder
        .find_tag(Tag::from_u16_exhaustive(tags::GEO_KEY_DIRECTORY))
        .ok()
        .flatten()
        .and_then(|v| v.into_u32_vec().ok())?;
    let ascii = find_ascii(decoder, tags::GEO_ASCII_PARAMS);
    geokeys::decode(&directory, ascii.as_deref())
}

fn read_nodata<R: Read + Seek, T: RasterElement>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = find_ascii(decoder, tags::GDAL_NODATA)?;
    let value: f64 = text.trim_end_matches('\0').trim().parse().ok()?;
    num_traits::cast(value)
}
