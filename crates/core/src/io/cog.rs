//! Cloud Optimized GeoTIFF writer (without GDAL dependency)
//!
//! Writes a single-band `f32` raster as a classic little-endian TIFF with
//! square tiles, per-tile compression and internal overviews. All IFDs
//! sit directly after the header, followed by tile data from the smallest
//! overview up to full resolution, so a reader can fetch the directory
//! and any coarse level with a few small range requests.
//!
//! The encoder writes no timestamps or other run-dependent values:
//! encoding the same raster twice gives byte-identical files.

use crate::error::{Error, Result};
use crate::io::geokeys::{self, tags};
use crate::raster::{Raster, RasterElement};
use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default tile edge in pixels
pub const DEFAULT_TILE_SIZE: usize = 512;

/// Tile compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Compression {
    None,
    #[default]
    Lzw,
    Deflate,
}

impl Compression {
    /// TIFF `Compression` tag value
    pub fn tiff_code(self) -> u16 {
        match self {
            Compression::None => 1,
            Compression::Lzw => 5,
            Compression::Deflate => 8,
        }
    }
}

/// Resampling used to build overview levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverviewResampling {
    /// Top-left sample of each 2x2 block
    Nearest,
    /// Mean of the valid samples of each 2x2 block
    #[default]
    Average,
}

/// Options for writing Cloud Optimized GeoTIFF files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CogOptions {
    /// Tile compression (default: LZW)
    pub compression: Compression,
    /// Tile width and height in pixels, a multiple of 16 (default: 512)
    pub tile_size: usize,
    /// Build internal overviews until a level fits in one tile
    pub overviews: bool,
    /// Overview resampling method
    pub resampling: OverviewResampling,
    /// Band description, stored in `GDAL_METADATA`
    pub description: Option<String>,
}

impl Default for CogOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            tile_size: DEFAULT_TILE_SIZE,
            overviews: true,
            resampling: OverviewResampling::default(),
            description: None,
        }
    }
}

impl CogOptions {
    /// Reject configurations the TIFF format cannot represent
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 || self.tile_size % 16 != 0 || self.tile_size > 4096 {
            return Err(Error::InvalidParameter {
                name: "tile_size",
                value: self.tile_size.to_string(),
                reason: "must be a non-zero multiple of 16, at most 4096".to_string(),
            });
        }
        Ok(())
    }

    /// Number of overview levels that would be built for a `rows x cols` raster
    pub fn overview_count(&self, rows: usize, cols: usize) -> usize {
        if !self.overviews {
            return 0;
        }
        let (mut r, mut c) = (rows, cols);
        let mut count = 0;
        while r > self.tile_size || c > self.tile_size {
            r = r.div_ceil(2);
            c = c.div_ceil(2);
            count += 1;
        }
        count
    }
}

/// Write a Raster to a Cloud Optimized GeoTIFF file.
///
/// The file is first written next to `path` and renamed into place once
/// complete, so a failed write never leaves a truncated `path` behind and
/// never touches other files in the directory.
pub fn write_cog<T, P>(raster: &Raster<T>, path: P, options: &CogOptions) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    options.validate().map_err(|e| Error::write(path, e))?;

    let staging = staging_path(path);
    let result = write_staged(raster, &staging, options)
        .and_then(|()| fs::rename(&staging, path).map_err(Error::from));

    if let Err(e) = result {
        let _ = fs::remove_file(&staging);
        return Err(Error::write(path, e));
    }
    Ok(())
}

fn write_staged<T: RasterElement>(raster: &Raster<T>, staging: &Path, options: &CogOptions) -> Result<()> {
    let file = File::create(staging)?;
    let mut writer = BufWriter::new(file);
    encode_cog(raster, &mut writer, options)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?
        .sync_all()?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write a Raster to an in-memory Cloud Optimized GeoTIFF buffer
pub fn write_cog_to_buffer<T>(raster: &Raster<T>, options: &CogOptions) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    options.validate()?;
    let mut buf = Vec::new();
    encode_cog(raster, Cursor::new(&mut buf), options)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// One pyramid level with its compressed tiles in row-major tile order.
struct EncodedLevel {
    width: u32,
    height: u32,
    tiles: Vec<Vec<u8>>,
}

/// Internal: encode a Raster as COG into any `Write` sink
fn encode_cog<T, W>(raster: &Raster<T>, mut writer: W, options: &CogOptions) -> Result<()>
where
    T: RasterElement,
    W: Write,
{
    let (rows, cols) = raster.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let nodata = raster.nodata().and_then(|v| v.to_f64());
    let fill = nodata.map(|v| v as f32).unwrap_or(f32::NAN);

    let base: Array2<f32> = raster
        .data()
        .mapv(|v| num_traits::cast::<T, f32>(v).unwrap_or(f32::NAN));
    let pyramid = build_pyramid(base, options, nodata);

    let levels = pyramid
        .iter()
        .map(|level| encode_level(level.view(), options, fill))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        levels = levels.len(),
        tiles = levels.iter().map(|l| l.tiles.len()).sum::<usize>(),
        "encoded COG pyramid"
    );

    // IFD sizes depend only on entry counts, so measure them with
    // placeholder offsets first.
    let placeholder: Vec<Ifd> = levels
        .iter()
        .enumerate()
        .map(|(i, level)| build_ifd(i, level, vec![0; level.tiles.len()], raster, options, nodata))
        .collect();

    let mut ifd_offsets = Vec::with_capacity(levels.len());
    let mut cursor: u64 = 8;
    for ifd in &placeholder {
        ifd_offsets.push(cursor);
        cursor += ifd.encoded_len() as u64;
    }

    // Tile data: smallest overview first, full resolution last
    let mut tile_offsets: Vec<Vec<u64>> = vec![Vec::new(); levels.len()];
    for (i, level) in levels.iter().enumerate().rev() {
        for tile in &level.tiles {
            tile_offsets[i].push(cursor);
            cursor += tile.len() as u64;
        }
    }

    if cursor > u32::MAX as u64 {
        return Err(Error::Other(format!(
            "encoded size of {} bytes exceeds the 4 GiB classic TIFF limit",
            cursor
        )));
    }

    let mut head = Vec::with_capacity(ifd_offsets.last().copied().unwrap_or(8) as usize + 1024);
    head.extend_from_slice(b"II");
    head.write_u16::<LittleEndian>(42)?;
    head.write_u32::<LittleEndian>(8)?;

    for (i, level) in levels.iter().enumerate() {
        let offsets = tile_offsets[i].iter().map(|&o| o as u32).collect();
        let ifd = build_ifd(i, level, offsets, raster, options, nodata);
        let next = ifd_offsets.get(i + 1).copied().unwrap_or(0) as u32;
        ifd.encode(ifd_offsets[i] as u32, next, &mut head)?;
    }

    writer.write_all(&head)?;
    for level in levels.iter().rev() {
        for tile in &level.tiles {
            writer.write_all(tile)?;
        }
    }

    Ok(())
}

/// Full-resolution level followed by successive 2x reductions until a
/// level fits inside a single tile.
fn build_pyramid(base: Array2<f32>, options: &CogOptions, nodata: Option<f64>) -> Vec<Array2<f32>> {
    let (rows, cols) = base.dim();
    let count = options.overview_count(rows, cols);

    let mut levels = Vec::with_capacity(count + 1);
    levels.push(base);
    for i in 0..count {
        let next = downsample(levels[i].view(), options.resampling, nodata);
        levels.push(next);
    }
    levels
}

/// Halve a level in both dimensions (rounding up).
///
/// NaN and nodata samples are skipped when averaging; a block without any
/// valid sample becomes nodata.
fn downsample(src: ArrayView2<f32>, resampling: OverviewResampling, nodata: Option<f64>) -> Array2<f32> {
    let (rows, cols) = src.dim();
    let fill = nodata.map(|nd| nd as f32).unwrap_or(f32::NAN);
    let is_valid = |v: f32| {
        !v.is_nan() && nodata.map_or(true, |nd| (v as f64 - nd).abs() > f64::EPSILON)
    };

    Array2::from_shape_fn((rows.div_ceil(2), cols.div_ceil(2)), |(r, c)| {
        let (r0, c0) = (r * 2, c * 2);
        match resampling {
            OverviewResampling::Nearest => src[(r0, c0)],
            OverviewResampling::Average => {
                let mut sum = 0.0f64;
                let mut n = 0u32;
                for rr in r0..(r0 + 2).min(rows) {
                    for cc in c0..(c0 + 2).min(cols) {
                        let v = src[(rr, cc)];
                        if is_valid(v) {
                            sum += v as f64;
                            n += 1;
                        }
                    }
                }
                if n == 0 {
                    fill
                } else {
                    (sum / n as f64) as f32
                }
            }
        }
    })
}

/// Cut a level into padded tiles and compress each one.
fn encode_level(level: ArrayView2<f32>, options: &CogOptions, fill: f32) -> Result<EncodedLevel> {
    let ts = options.tile_size;
    let (rows, cols) = level.dim();
    let tiles_down = rows.div_ceil(ts);
    let tiles_across = cols.div_ceil(ts);

    let mut tiles = Vec::with_capacity(tiles_down * tiles_across);
    let mut raw: Vec<u8> = Vec::with_capacity(ts * ts * 4);

    for tile_row in 0..tiles_down {
        for tile_col in 0..tiles_across {
            raw.clear();
            for y in 0..ts {
                let row = tile_row * ts + y;
                for x in 0..ts {
                    let col = tile_col * ts + x;
                    let v = if row < rows && col < cols {
                        level[(row, col)]
                    } else {
                        fill
                    };
                    raw.extend_from_slice(&v.to_le_bytes());
                }
            }
            tiles.push(compress(&raw, options.compression)?);
        }
    }

    Ok(EncodedLevel {
        width: cols as u32,
        height: rows as u32,
        tiles,
    })
}

fn compress(raw: &[u8], compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(raw.to_vec()),
        Compression::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(raw)?;
            Ok(encoder.finish()?)
        }
        Compression::Lzw => {
            let mut encoder =
                weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
            encoder
                .encode(raw)
                .map_err(|e| Error::Other(format!("LZW encoding failed: {}", e)))
        }
    }
}

fn build_ifd<T: RasterElement>(
    index: usize,
    level: &EncodedLevel,
    tile_offsets: Vec<u32>,
    raster: &Raster<T>,
    options: &CogOptions,
    nodata: Option<f64>,
) -> Ifd {
    let ts = options.tile_size as u32;
    let mut ifd = Ifd::default();

    // 1 = reduced-resolution copy of another image in this file
    let subfile_type = if index == 0 { 0 } else { 1 };
    ifd.push(tags::NEW_SUBFILE_TYPE, TagValue::Long(vec![subfile_type]));
    ifd.push(tags::IMAGE_WIDTH, TagValue::Long(vec![level.width]));
    ifd.push(tags::IMAGE_LENGTH, TagValue::Long(vec![level.height]));
    ifd.push(tags::BITS_PER_SAMPLE, TagValue::Short(vec![32]));
    ifd.push(tags::COMPRESSION, TagValue::Short(vec![options.compression.tiff_code()]));
    // BlackIsZero
    ifd.push(tags::PHOTOMETRIC, TagValue::Short(vec![1]));
    ifd.push(tags::SAMPLES_PER_PIXEL, TagValue::Short(vec![1]));
    // Chunky
    ifd.push(tags::PLANAR_CONFIG, TagValue::Short(vec![1]));
    ifd.push(tags::TILE_WIDTH, TagValue::Long(vec![ts]));
    ifd.push(tags::TILE_LENGTH, TagValue::Long(vec![ts]));
    ifd.push(tags::TILE_OFFSETS, TagValue::Long(tile_offsets));
    ifd.push(
        tags::TILE_BYTE_COUNTS,
        TagValue::Long(level.tiles.iter().map(|t| t.len() as u32).collect()),
    );
    // IEEE floating point
    ifd.push(tags::SAMPLE_FORMAT, TagValue::Short(vec![3]));

    if index == 0 {
        let gt = raster.transform();
        match gt.tiepoint_and_scale() {
            Some((tiepoint, scale)) => {
                ifd.push(tags::MODEL_PIXEL_SCALE, TagValue::Double(scale.to_vec()));
                ifd.push(tags::MODEL_TIEPOINT, TagValue::Double(tiepoint.to_vec()));
            }
            None => {
                ifd.push(
                    tags::MODEL_TRANSFORMATION,
                    TagValue::Double(gt.model_transformation().to_vec()),
                );
            }
        }

        let keys = geokeys::encode(raster.crs());
        ifd.push(tags::GEO_KEY_DIRECTORY, TagValue::Short(keys.directory));
        if let Some(ascii) = keys.ascii {
            ifd.push(tags::GEO_ASCII_PARAMS, TagValue::Ascii(ascii));
        }

        if let Some(description) = &options.description {
            ifd.push(tags::GDAL_METADATA, TagValue::Ascii(gdal_metadata(description)));
        }
        if let Some(nd) = nodata {
            ifd.push(tags::GDAL_NODATA, TagValue::Ascii(format!("{}", nd)));
        }
    }

    ifd
}

/// GDAL_METADATA XML carrying the band description
fn gdal_metadata(description: &str) -> String {
    let escaped = description
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    format!(
        "<GDALMetadata>\n  <Item name=\"DESCRIPTION\" sample=\"0\" role=\"description\">{}</Item>\n</GDALMetadata>\n",
        escaped
    )
}

// ---------------------------------------------------------------------------
// IFD serialization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum TagValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Double(Vec<f64>),
    Ascii(String),
}

impl TagValue {
    fn type_id(&self) -> u16 {
        match self {
            TagValue::Ascii(_) => 2,
            TagValue::Short(_) => 3,
            TagValue::Long(_) => 4,
            TagValue::Double(_) => 12,
        }
    }

    fn count(&self) -> u32 {
        match self {
            TagValue::Short(v) => v.len() as u32,
            TagValue::Long(v) => v.len() as u32,
            TagValue::Double(v) => v.len() as u32,
            // NUL terminator included
            TagValue::Ascii(s) => s.len() as u32 + 1,
        }
    }

    fn byte_len(&self) -> usize {
        match self {
            TagValue::Short(v) => v.len() * 2,
            TagValue::Long(v) => v.len() * 4,
            TagValue::Double(v) => v.len() * 8,
            TagValue::Ascii(s) => s.len() + 1,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        match self {
            TagValue::Short(v) => v.iter().try_for_each(|&x| out.write_u16::<LittleEndian>(x)),
            TagValue::Long(v) => v.iter().try_for_each(|&x| out.write_u32::<LittleEndian>(x)),
            TagValue::Double(v) => v.iter().try_for_each(|&x| out.write_f64::<LittleEndian>(x)),
            TagValue::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
                Ok(())
            }
        }
    }
}

#[derive(Debug, Default)]
struct Ifd {
    entries: Vec<(u16, TagValue)>,
}

impl Ifd {
    fn push(&mut self, tag: u16, value: TagValue) {
        self.entries.push((tag, value));
    }

    /// Bytes taken by the directory plus its out-of-line values
    fn encoded_len(&self) -> usize {
        let external: usize = self
            .entries
            .iter()
            .map(|(_, v)| v.byte_len())
            .filter(|&len| len > 4)
            .map(|len| len + len % 2)
            .sum();
        2 + self.entries.len() * 12 + 4 + external
    }

    /// Append this IFD, located at `offset`, to `out`. Values longer than
    /// four bytes follow the directory, each starting on a word boundary.
    fn encode(&self, offset: u32, next_ifd: u32, out: &mut Vec<u8>) -> Result<()> {
        let mut entries: Vec<&(u16, TagValue)> = self.entries.iter().collect();
        entries.sort_by_key(|(tag, _)| *tag);

        let external_start = offset as usize + 2 + entries.len() * 12 + 4;
        let mut external: Vec<u8> = Vec::new();

        out.write_u16::<LittleEndian>(entries.len() as u16)?;
        for (tag, value) in entries {
            out.write_u16::<LittleEndian>(*tag)?;
            out.write_u16::<LittleEndian>(value.type_id())?;
            out.write_u32::<LittleEndian>(value.count())?;

            if value.byte_len() <= 4 {
                let mut inline = Vec::with_capacity(4);
                value.write_to(&mut inline)?;
                inline.resize(4, 0);
                out.extend_from_slice(&inline);
            } else {
                out.write_u32::<LittleEndian>((external_start + external.len()) as u32)?;
                value.write_to(&mut external)?;
                if external.len() % 2 == 1 {
                    external.push(0);
                }
            }
        }
        out.write_u32::<LittleEndian>(next_ifd)?;
        out.extend_from_slice(&external);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::CRS;
    use crate::raster::GeoTransform;
    use approx::assert_relative_eq;
    use tiff::decoder::{Decoder, DecodingResult};
    use tiff::tags::Tag;

    fn ramp(rows: usize, cols: usize) -> Raster<f32> {
        let data = (0..rows * cols).map(|i| i as f32 / 100.0).collect();
        let mut r = Raster::from_vec(data, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(600000.0, 5000040.0, 10.0, -10.0));
        r.set_crs(Some(CRS::from_epsg(32632)));
        r.set_nodata(Some(-9999.0));
        r
    }

    fn small_tiles(compression: Compression) -> CogOptions {
        CogOptions {
            compression,
            tile_size: 16,
            ..CogOptions::default()
        }
    }

    fn decode_f32(decoder: &mut Decoder<Cursor<&Vec<u8>>>) -> Vec<f32> {
        match decoder.read_image().unwrap() {
            DecodingResult::F32(v) => v,
            other => panic!("expected f32 samples, got {:?}", std::mem::discriminant(&other)),
        }
    }

    #[test]
    fn test_defaults() {
        let opts = CogOptions::default();
        assert_eq!(opts.tile_size, 512);
        assert_eq!(opts.compression, Compression::Lzw);
        assert!(opts.overviews);
    }

    #[test]
    fn test_invalid_tile_size() {
        let opts = CogOptions {
            tile_size: 100,
            ..CogOptions::default()
        };
        assert!(matches!(opts.validate(), Err(Error::InvalidParameter { .. })));
        assert!(write_cog_to_buffer(&ramp(4, 4), &opts).is_err());
    }

    #[test]
    fn test_overview_count() {
        let opts = small_tiles(Compression::None);
        assert_eq!(opts.overview_count(16, 16), 0);
        assert_eq!(opts.overview_count(17, 5), 1);
        assert_eq!(opts.overview_count(40, 33), 2);

        let s2 = CogOptions::default();
        // 10980 -> 5490 -> 2745 -> 1373 -> 687 -> 344
        assert_eq!(s2.overview_count(10980, 10980), 5);
    }

    #[test]
    fn test_layout_and_pixels() {
        for compression in [Compression::None, Compression::Lzw, Compression::Deflate] {
            let raster = ramp(40, 33);
            let bytes = write_cog_to_buffer(&raster, &small_tiles(compression)).unwrap();

            let mut decoder = Decoder::new(Cursor::new(&bytes)).unwrap();
            assert_eq!(decoder.dimensions().unwrap(), (33, 40));
            assert_eq!(decoder.get_tag_u32(Tag::TileWidth).unwrap(), 16);
            assert_eq!(decoder.get_tag_u32(Tag::TileLength).unwrap(), 16);
            assert_eq!(
                decoder.get_tag_u32(Tag::Compression).unwrap(),
                compression.tiff_code() as u32
            );

            let pixels = decode_f32(&mut decoder);
            assert_eq!(pixels.len(), 40 * 33);
            assert_eq!(pixels[0], 0.0);
            assert_eq!(pixels[40 * 33 - 1], (40 * 33 - 1) as f32 / 100.0);

            // Two overview levels: 20x17, then 10x9
            assert!(decoder.more_images());
            decoder.next_image().unwrap();
            assert_eq!(decoder.dimensions().unwrap(), (17, 20));
            assert_eq!(decoder.get_tag_u32(Tag::from_u16_exhaustive(tags::NEW_SUBFILE_TYPE)).unwrap(), 1);

            assert!(decoder.more_images());
            decoder.next_image().unwrap();
            assert_eq!(decoder.dimensions().unwrap(), (9, 10));
            assert!(!decoder.more_images());
        }
    }

    #[test]
    fn test_tile_data_follows_all_ifds() {
        let bytes = write_cog_to_buffer(&ramp(40, 33), &small_tiles(Compression::None)).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&bytes)).unwrap();
        let full_res_offsets = decoder.get_tag_u32_vec(Tag::TileOffsets).unwrap();
        decoder.next_image().unwrap();
        let overview_offsets = decoder.get_tag_u32_vec(Tag::TileOffsets).unwrap();

        // Overview data is stored before full resolution data
        assert!(overview_offsets.iter().max() < full_res_offsets.iter().min());
        // 3 x 3 tiles of 16 x 16 x 4 bytes at full resolution
        assert_eq!(full_res_offsets.len(), 9);
        assert_eq!(bytes.len() as u32, full_res_offsets[8] + 16 * 16 * 4);
    }

    #[test]
    fn test_average_overview_values() {
        let raster = ramp(32, 32);
        let bytes = write_cog_to_buffer(&raster, &small_tiles(Compression::Deflate)).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&bytes)).unwrap();
        decoder.next_image().unwrap();
        let overview = decode_f32(&mut decoder);

        // Mean of cells (0,0), (0,1), (1,0), (1,1)
        let expected = (0.0 + 0.01 + 0.32 + 0.33) / 4.0;
        assert_relative_eq!(overview[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_downsample_skips_nodata() {
        let src = Array2::from_shape_vec((2, 3), vec![1.0, -9999.0, 5.0, 3.0, f32::NAN, -9999.0])
            .unwrap();
        let avg = downsample(src.view(), OverviewResampling::Average, Some(-9999.0));
        assert_eq!(avg.dim(), (1, 2));
        assert_eq!(avg[(0, 0)], 2.0);
        assert_eq!(avg[(0, 1)], 5.0);

        let all_nodata = Array2::from_elem((2, 2), -9999.0f32);
        let avg = downsample(all_nodata.view(), OverviewResampling::Average, Some(-9999.0));
        assert_eq!(avg[(0, 0)], -9999.0);

        let nearest = downsample(src.view(), OverviewResampling::Nearest, None);
        assert_eq!(nearest[(0, 1)], 5.0);
    }

    #[test]
    fn test_georeferencing_survives() {
        let raster = ramp(20, 20);
        let bytes = write_cog_to_buffer(&raster, &small_tiles(Compression::Lzw)).unwrap();
        let back: Raster<f32> = crate::io::read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.transform(), raster.transform());
        assert_eq!(back.crs().and_then(|c| c.epsg()), Some(32632));
        assert_eq!(back.nodata(), Some(-9999.0));
        assert_eq!(back.get(19, 19).unwrap(), raster.get(19, 19).unwrap());
    }

    #[test]
    fn test_rotated_transform_uses_matrix() {
        let mut raster = ramp(4, 4);
        let mut gt = *raster.transform();
        gt.row_rotation = 0.25;
        raster.set_transform(gt);

        let bytes = write_cog_to_buffer(&raster, &small_tiles(Compression::None)).unwrap();
        let back: Raster<f32> = crate::io::read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.transform(), &gt);
    }

    #[test]
    fn test_description_metadata() {
        let opts = CogOptions {
            description: Some("NDVI".to_string()),
            ..small_tiles(Compression::None)
        };
        let bytes = write_cog_to_buffer(&ramp(4, 4), &opts).unwrap();
        let mut decoder = Decoder::new(Cursor::new(&bytes)).unwrap();
        let xml = decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(tags::GDAL_METADATA))
            .unwrap();
        assert!(xml.contains(">NDVI</Item>"));
    }

    #[test]
    fn test_deterministic_output() {
        let raster = ramp(40, 33);
        let opts = small_tiles(Compression::Lzw);
        let a = write_cog_to_buffer(&raster, &opts).unwrap();
        let b = write_cog_to_buffer(&raster, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_cog_replaces_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.tif");
        let neighbour = dir.path().join("keep.txt");
        fs::write(&target, b"stale").unwrap();
        fs::write(&neighbour, b"unrelated").unwrap();

        write_cog(&ramp(4, 4), &target, &small_tiles(Compression::Lzw)).unwrap();

        assert_eq!(fs::read(&neighbour).unwrap(), b"unrelated");
        assert!(!dir.path().join("out.tif.partial").exists());
        let back: Raster<f32> = crate::io::read_geotiff_from_buffer(&fs::read(&target).unwrap()).unwrap();
        assert_eq!(back.shape(), (4, 4));
    }

    #[test]
    fn test_write_cog_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.tif");
        let err = write_cog(&ramp(4, 4), &target, &CogOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
    }
}
