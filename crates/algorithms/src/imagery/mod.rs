//! Imagery analysis algorithms
//!
//! - Normalized difference: generic two-band index
//! - NDVI: near-infrared against red

mod indices;

pub use indices::{ndvi, normalized_difference, INDEX_NODATA};
