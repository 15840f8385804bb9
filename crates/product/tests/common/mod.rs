//! Synthetic Sentinel-2 product fixtures

#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tiff::encoder::colortype::Gray16;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

pub const PRODUCT: &str = "S2A_MSIL2A_20230615T101559_N0509_R065_T32TQM_20230615T141414.SAFE";
pub const GRANULE: &str = "GRANULE/L2A_T32TQM_A041780_20230615T101559/IMG_DATA/R10m";

/// Write a single-band `u16` GeoTIFF with a 10 m UTM 32N georeference.
pub fn write_band(path: &Path, rows: u32, cols: u32, data: &[u16], epsg: Option<u16>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<Gray16>(cols, rows).unwrap();

    let scale = [10.0f64, 10.0, 0.0];
    let tiepoint = [0.0f64, 0.0, 0.0, 600000.0, 5000040.0, 0.0];
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(33550), &scale[..])
        .unwrap();
    image
        .encoder()
        .write_tag(Tag::from_u16_exhaustive(33922), &tiepoint[..])
        .unwrap();
    if let Some(code) = epsg {
        let keys: [u16; 16] = [1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, code];
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(34735), &keys[..])
            .unwrap();
    }
    image.write_data(data).unwrap();
}

/// Lay out a product directory with red and NIR 10 m bands as GeoTIFFs.
pub fn make_product(
    root: &Path,
    shape: (u32, u32),
    red: &[u16],
    nir: &[u16],
    epsg: Option<u16>,
) -> PathBuf {
    let product = root.join(PRODUCT);
    let img = product.join(GRANULE);
    let (rows, cols) = shape;
    write_band(&img.join("T32TQM_20230615T101559_B04_10m.tif"), rows, cols, red, epsg);
    write_band(&img.join("T32TQM_20230615T101559_B08_10m.tif"), rows, cols, nir, epsg);
    product
}
