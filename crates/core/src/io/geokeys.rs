//! GeoTIFF tag ids and GeoKeyDirectory encoding.
//!
//! Only the keys needed to carry a CRS through a read / write cycle are
//! handled: model type, raster type, citation and the EPSG code keys.

use crate::crs::CRS;
use tracing::warn;

/// TIFF and GeoTIFF tag ids used by the reader and the COG writer.
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 254;
    pub const IMAGE_WIDTH: u16 = 256;
    pub const IMAGE_LENGTH: u16 = 257;
    pub const BITS_PER_SAMPLE: u16 = 258;
    pub const COMPRESSION: u16 = 259;
    pub const PHOTOMETRIC: u16 = 262;
    pub const SAMPLES_PER_PIXEL: u16 = 277;
    pub const PLANAR_CONFIG: u16 = 284;
    pub const TILE_WIDTH: u16 = 322;
    pub const TILE_LENGTH: u16 = 323;
    pub const TILE_OFFSETS: u16 = 324;
    pub const TILE_BYTE_COUNTS: u16 = 325;
    pub const SAMPLE_FORMAT: u16 = 339;
    pub const MODEL_PIXEL_SCALE: u16 = 33550;
    pub const MODEL_TIEPOINT: u16 = 33922;
    pub const MODEL_TRANSFORMATION: u16 = 34264;
    pub const GEO_KEY_DIRECTORY: u16 = 34735;
    pub const GEO_ASCII_PARAMS: u16 = 34737;
    pub const GDAL_METADATA: u16 = 42112;
    pub const GDAL_NODATA: u16 = 42113;
}

/// GeoKey ids.
mod keys {
    pub const GT_MODEL_TYPE: u16 = 1024;
    pub const GT_RASTER_TYPE: u16 = 1025;
    pub const GT_CITATION: u16 = 1026;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;
}

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Encoded GeoKeyDirectory plus the optional GeoAsciiParams payload.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeys {
    pub directory: Vec<u16>,
    pub ascii: Option<String>,
}

/// Encode a CRS as GeoKeyDirectory entries.
///
/// An EPSG code is written as `ProjectedCSTypeGeoKey` or
/// `GeographicTypeGeoKey`. A CRS without an EPSG code that fits the key
/// is stored only as a WKT citation in GeoAsciiParams: [`decode`]
/// recovers it, but GDAL and other GeoTIFF readers report an undefined
/// projection. A warning is logged when that happens.
pub fn encode(crs: Option<&CRS>) -> GeoKeys {
    let mut entries: Vec<[u16; 4]> = Vec::new();
    let mut ascii = None;

    if let Some(crs) = crs {
        let model = if crs.is_geographic() {
            MODEL_TYPE_GEOGRAPHIC
        } else {
            MODEL_TYPE_PROJECTED
        };
        entries.push([keys::GT_MODEL_TYPE, 0, 1, model]);
        entries.push([keys::GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);

        match epsg_key(crs) {
            Some(code) => {
                let key = if crs.is_geographic() {
                    keys::GEOGRAPHIC_TYPE
                } else {
                    keys::PROJECTED_CS_TYPE
                };
                entries.push([key, 0, 1, code]);
            }
            None => {
                warn!(
                    crs = %crs,
                    "CRS has no EPSG code, other GeoTIFF readers will not recognise the projection"
                );
                if let Some(wkt) = crs.wkt() {
                    let citation = format!("{}|", wkt);
                    let count = u16::try_from(citation.len()).unwrap_or(u16::MAX);
                    entries.push([keys::GT_CITATION, tags::GEO_ASCII_PARAMS, count, 0]);
                    ascii = Some(citation);
                }
            }
        }
    } else {
        entries.push([keys::GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA]);
    }

    entries.sort_by_key(|e| e[0]);

    let mut directory = vec![1, 1, 0, entries.len() as u16];
    for entry in entries {
        directory.extend_from_slice(&entry);
    }

    GeoKeys { directory, ascii }
}

/// EPSG code as a GeoKey value, if the CRS has one that fits
fn epsg_key(crs: &CRS) -> Option<u16> {
    crs.epsg().and_then(|code| u16::try_from(code).ok())
}

/// Decode a CRS from GeoKeyDirectory values and GeoAsciiParams.
///
/// Looks for `ProjectedCSTypeGeoKey` (3072) or `GeographicTypeGeoKey`
/// (2048); falls back to a WKT citation when no EPSG code is present.
pub fn decode(directory: &[u32], ascii: Option<&str>) -> Option<CRS> {
    // [version, revision, minor, count, key_id, location, count, value, ...]
    if directory.len() < 4 {
        return None;
    }
    let num_keys = directory[3] as usize;
    let mut citation = None;

    for i in 0..num_keys {
        let base = 4 + i * 4;
        if base + 4 > directory.len() {
            break;
        }
        let key_id = directory[base] as u16;
        let location = directory[base + 1] as u16;
        let count = directory[base + 2] as usize;
        let value = directory[base + 3];

        match key_id {
            keys::PROJECTED_CS_TYPE | keys::GEOGRAPHIC_TYPE
                if location == 0 && value > 0 && value != 32767 =>
            {
                return Some(CRS::from_epsg(value));
            }
            keys::GT_CITATION if location == tags::GEO_ASCII_PARAMS => {
                citation = ascii.and_then(|s| {
                    let start = value as usize;
                    s.get(start..start + count)
                        .map(|c| c.trim_end_matches(&['|', '\0'][..]).to_string())
                });
            }
            _ => {}
        }
    }

    citation
        .filter(|c| looks_like_wkt(c))
        .map(CRS::from_wkt)
}

fn looks_like_wkt(s: &str) -> bool {
    ["PROJCS[", "GEOGCS[", "PROJCRS[", "GEOGCRS[", "COMPD_CS["]
        .iter()
        .any(|prefix| s.starts_with(prefix))
}
