//! End-to-end runs of the NDVI pipeline on synthetic products

mod common;

use approx::assert_relative_eq;
use common::{make_product, write_band, GRANULE};
use s2ndvi_core::io::{read_geotiff_from_buffer, CogOptions, Compression};
use s2ndvi_core::Raster;
use s2ndvi_product::{run, NdviConfig, PipelineError, Stage};
use std::fs;
use std::io::Cursor;
use tiff::decoder::Decoder;
use tiff::tags::Tag;

const RED: [u16; 4] = [100, 200, 0, 0];
const NIR: [u16; 4] = [300, 200, 0, 100];

fn read_output(path: &std::path::Path) -> Raster<f32> {
    read_geotiff_from_buffer(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn two_by_two_product() {
    let dir = tempfile::tempdir().unwrap();
    let product = make_product(dir.path(), (2, 2), &RED, &NIR, Some(32632));
    let out_dir = dir.path().join("out");

    let summary = run(&NdviConfig::new(&product, &out_dir)).unwrap();
    assert_eq!(summary.output, out_dir.join("s2-2a-10m-ndvi.tif"));
    assert_eq!((summary.rows, summary.cols), (2, 2));
    assert!(summary.red.ends_with("T32TQM_20230615T101559_B04_10m.tif"));

    let ndvi = read_output(&summary.output);
    assert_eq!(ndvi.data().iter().copied().collect::<Vec<_>>(), vec![0.5, 0.0, 0.0, 1.0]);
    assert_eq!(ndvi.transform().to_gdal(), [600000.0, 10.0, 0.0, 5000040.0, 0.0, -10.0]);
    assert_eq!(ndvi.crs().and_then(|c| c.epsg()), Some(32632));
    assert_eq!(ndvi.nodata(), Some(-9999.0));
}

#[test]
fn reflectance_product_within_tolerance() {
    let dir = tempfile::tempdir().unwrap();
    let red = [1234, 850, 3000, 1];
    let nir = [4321, 2600, 1200, 7];
    let product = make_product(dir.path(), (2, 2), &red, &nir, Some(32632));

    let summary = run(&NdviConfig::new(&product, dir.path().join("out"))).unwrap();
    let ndvi = read_output(&summary.output);

    let expected = [3087.0 / 5555.0, 1750.0 / 3450.0, -1800.0 / 4200.0, 0.75];
    for (value, expected) in ndvi.data().iter().zip(expected) {
        assert_relative_eq!(*value as f64, expected, epsilon = 1e-6);
    }
}

#[test]
fn explicit_basename() {
    let dir = tempfile::tempdir().unwrap();
    let product = make_product(dir.path(), (2, 2), &RED, &NIR, Some(32632));
    let out_dir = dir.path().join("out");

    let summary = run(&NdviConfig::new(&product, &out_dir).with_basename("field")).unwrap();
    assert_eq!(summary.output, out_dir.join("field.tif"));
    assert!(summary.output.is_file());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let product = make_product(dir.path(), (2, 2), &RED, &NIR, Some(32632));
    let config = NdviConfig::new(&product, dir.path().join("out"));

    let first = fs::read(run(&config).unwrap().output).unwrap();
    let second = fs::read(run(&config).unwrap().output).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_red_band_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let product = dir.path().join("product");
    write_band(
        &product.join(GRANULE).join("T32TQM_20230615T101559_B08_10m.tif"),
        2,
        2,
        &NIR,
        Some(32632),
    );
    let out_dir = dir.path().join("out");

    let err = run(&NdviConfig::new(&product, &out_dir)).unwrap_err();
    assert_eq!(err.stage(), Stage::Locate);
    match err {
        PipelineError::BandNotFound { marker, .. } => assert_eq!(marker, "B04"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out_dir.join("s2-2a-10m-ndvi.tif").exists());
}

#[test]
fn mismatched_bands_fail_in_compute() {
    let dir = tempfile::tempdir().unwrap();
    let product = dir.path().join("product");
    let img = product.join(GRANULE);
    write_band(&img.join("B04_10m.tif"), 2, 2, &RED, Some(32632));
    write_band(&img.join("B08_10m.tif"), 2, 3, &[1, 2, 3, 4, 5, 6], Some(32632));
    let out_dir = dir.path().join("out");

    let err = run(&NdviConfig::new(&product, &out_dir)).unwrap_err();
    assert_eq!(err.stage(), Stage::Compute);
    assert!(!out_dir.exists());
}

#[test]
fn corrupt_band_is_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let product = make_product(dir.path(), (2, 2), &RED, &NIR, Some(32632));
    let red = product.join(GRANULE).join("T32TQM_20230615T101559_B04_10m.tif");
    fs::write(&red, b"truncated").unwrap();

    let err = run(&NdviConfig::new(&product, dir.path().join("out"))).unwrap_err();
    match err {
        PipelineError::UnreadableRaster { path, .. } => assert_eq!(path, red),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unrelated_output_files_survive() {
    let dir = tempfile::tempdir().unwrap();
    let product = make_product(dir.path(), (2, 2), &RED, &NIR, Some(32632));
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).unwrap();
    fs::write(out_dir.join("notes.txt"), b"keep me").unwrap();
    fs::write(out_dir.join("s2-2a-10m-ndvi.tif"), b"stale output").unwrap();

    let summary = run(&NdviConfig::new(&product, &out_dir)).unwrap();

    assert_eq!(fs::read(out_dir.join("notes.txt")).unwrap(), b"keep me");
    let ndvi = read_output(&summary.output);
    assert_eq!(ndvi.get(0, 0).unwrap(), 0.5);
    assert_eq!(fs::read_dir(&out_dir).unwrap().count(), 2);
}

#[test]
fn missing_crs_falls_back_to_tile_zone() {
    let dir = tempfile::tempdir().unwrap();
    let product = make_product(dir.path(), (2, 2), &RED, &NIR, None);

    let summary = run(&NdviConfig::new(&product, dir.path().join("out"))).unwrap();
    let ndvi = read_output(&summary.output);
    assert_eq!(ndvi.crs().and_then(|c| c.epsg()), Some(32632));
}

#[test]
fn output_is_tiled_with_overviews() {
    let dir = tempfile::tempdir().unwrap();
    let (rows, cols) = (40u32, 70u32);
    let red: Vec<u16> = (0..rows * cols).map(|i| (i % 1000) as u16).collect();
    let nir: Vec<u16> = (0..rows * cols).map(|i| (3000 - i % 1000) as u16).collect();
    let product = make_product(dir.path(), (rows, cols), &red, &nir, Some(32632));

    let mut config = NdviConfig::new(&product, dir.path().join("out"));
    config.cog = CogOptions {
        tile_size: 32,
        ..config.cog
    };
    let summary = run(&config).unwrap();

    let bytes = fs::read(&summary.output).unwrap();
    let mut decoder = Decoder::new(Cursor::new(&bytes)).unwrap();
    assert_eq!(decoder.dimensions().unwrap(), (70, 40));
    assert_eq!(decoder.get_tag_u32(Tag::TileWidth).unwrap(), 32);
    assert_eq!(decoder.get_tag_u32(Tag::TileLength).unwrap(), 32);
    assert_eq!(
        decoder.get_tag_u32(Tag::Compression).unwrap(),
        Compression::Lzw.tiff_code() as u32
    );

    // 70x40 -> 35x20 -> 18x10
    let mut sizes = Vec::new();
    while decoder.more_images() {
        decoder.next_image().unwrap();
        sizes.push(decoder.dimensions().unwrap());
    }
    assert_eq!(sizes, vec![(35, 20), (18, 10)]);
}
