//! # s2ndvi Product
//!
//! Sentinel-2 product handling and the NDVI pipeline.
//!
//! ```ignore
//! use s2ndvi_product::{run, NdviConfig};
//!
//! let config = NdviConfig::new("S2A_MSIL2A_20230615T101559_N0509_R065_T32TQM_20230615T141414.SAFE", "out");
//! let summary = run(&config)?;
//! println!("{}", summary.output.display());
//! ```

pub mod config;
pub mod error;
pub mod locate;
pub mod name;
pub mod pipeline;

pub use config::{NdviConfig, DEFAULT_BASENAME};
pub use error::{PipelineError, ProductNameError, Stage};
pub use locate::{locate_band, locate_bands, BandPaths, BandSelection};
pub use name::ProductName;
pub use pipeline::{compute_ndvi, read_band, run, write_index, RunSummary};
