//! I/O operations for reading band rasters and writing COG output

mod cog;
#[cfg(feature = "gdal")]
mod gdal_io;
pub mod geokeys;
#[cfg_attr(feature = "gdal", allow(dead_code))]
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::read_geotiff;

#[cfg(not(feature = "gdal"))]
pub use native::read_geotiff;

// COG output always goes through the native writer
pub use cog::{
    write_cog, write_cog_to_buffer, CogOptions, Compression, OverviewResampling, DEFAULT_TILE_SIZE,
};

// Buffer-based I/O (always available, no filesystem dependency)
pub use native::read_geotiff_from_buffer;
