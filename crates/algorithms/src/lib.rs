//! # s2ndvi Algorithms
//!
//! Raster algorithms for the s2ndvi toolchain.
//!
//! ## Available Algorithm Categories
//!
//! - **imagery**: Normalized difference and NDVI

pub mod imagery;
pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::imagery::{ndvi, normalized_difference, INDEX_NODATA};
    pub use s2ndvi_core::prelude::*;
}
