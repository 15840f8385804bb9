//! # s2ndvi Core
//!
//! Core types and I/O for the s2ndvi toolchain.
//!
//! This crate provides:
//! - `Raster<T>`: Generic georeferenced raster grid
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `CRS`: Coordinate Reference System descriptor
//! - GeoTIFF reading and Cloud Optimized GeoTIFF writing

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::io::{read_geotiff, write_cog, CogOptions, Compression};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
}
