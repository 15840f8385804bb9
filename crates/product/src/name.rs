//! Sentinel-2 product name parsing.
//!
//! Product directories follow the grammar
//!
//! ```text
//! MMM_MSIXXX_YYYYMMDDTHHMMSS_Nxxyy_ROOO_Txxxxx_YYYYMMDDTHHMMSS[.SAFE]
//! ```
//!
//! e.g. `S2A_MSIL2A_20230615T101559_N0509_R065_T32TQM_20230615T141414.SAFE`:
//!
//! | field | example | meaning |
//! |---|---|---|
//! | mission | `S2A` | satellite unit |
//! | product level | `MSIL2A` | processing level (`L1C` or `L2A`) |
//! | sensing time | `20230615T101559` | datatake sensing start (UTC) |
//! | baseline | `N0509` | processing baseline |
//! | relative orbit | `R065` | relative orbit number |
//! | tile | `T32TQM` | MGRS tile: UTM zone, latitude band, grid square |
//! | discriminator | `20230615T141414` | product generation time |

use crate::error::ProductNameError;
use chrono::NaiveDateTime;
use s2ndvi_core::CRS;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Sentinel-2 satellite unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mission {
    S2A,
    S2B,
    S2C,
}

/// Processing level of the product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingLevel {
    /// Top-of-atmosphere reflectance
    L1C,
    /// Bottom-of-atmosphere reflectance
    L2A,
}

/// Parsed Sentinel-2 product identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductName {
    pub mission: Mission,
    pub level: ProcessingLevel,
    pub sensing_time: NaiveDateTime,
    /// Processing baseline including the `N` prefix, e.g. `N0509`
    pub baseline: String,
    pub relative_orbit: u16,
    /// MGRS tile without the `T` prefix, e.g. `32TQM`
    pub tile_id: String,
    pub discriminator: NaiveDateTime,
}

impl ProductName {
    /// Parse a product name, with or without a trailing `.SAFE`.
    pub fn parse(name: &str) -> Result<Self, ProductNameError> {
        let name = name.trim_end_matches(&['/', '\\'][..]);
        let name = name.strip_suffix(".SAFE").unwrap_or(name);

        let fields: Vec<&str> = name.split('_').collect();
        let [mission, level, sensing, baseline, orbit, tile, discriminator] = fields.as_slice() else {
            return Err(ProductNameError::FieldCount {
                found: fields.len(),
            });
        };

        Ok(Self {
            mission: parse_mission(mission)?,
            level: parse_level(level)?,
            sensing_time: parse_time("sensing time", sensing)?,
            baseline: parse_baseline(baseline)?,
            relative_orbit: parse_orbit(orbit)?,
            tile_id: parse_tile(tile)?,
            discriminator: parse_time("discriminator", discriminator)?,
        })
    }

    /// Parse the final component of a product directory path.
    pub fn from_dir(path: &Path) -> Result<Self, ProductNameError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ProductNameError::NoDirectoryName(path.to_path_buf()))?;
        Self::parse(name)
    }

    /// Output file stem derived from tile and sensing time, e.g.
    /// `32TQM_20230615T101559_ndvi`.
    pub fn output_basename(&self) -> String {
        format!(
            "{}_{}_ndvi",
            self.tile_id,
            self.sensing_time.format(TIME_FORMAT)
        )
    }

    /// UTM zone number of the tile (1 to 60)
    pub fn utm_zone(&self) -> u8 {
        // Validated during parsing
        self.tile_id[..2].parse().unwrap_or(0)
    }

    /// Whether the tile lies in the northern hemisphere
    pub fn is_northern(&self) -> bool {
        self.tile_id.as_bytes()[2] >= b'N'
    }

    /// WGS 84 / UTM CRS the product's 10 m bands are delivered in
    pub fn utm_crs(&self) -> CRS {
        CRS::utm(self.utm_zone(), self.is_northern())
    }
}

impl FromStr for ProductName {
    type Err = ProductNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Mission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mission::S2A => "S2A",
            Mission::S2B => "S2B",
            Mission::S2C => "S2C",
        })
    }
}

impl fmt::Display for ProcessingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProcessingLevel::L1C => "L1C",
            ProcessingLevel::L2A => "L2A",
        })
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_MSI{}_{}_{}_R{:03}_T{}_{}",
            self.mission,
            self.level,
            self.sensing_time.format(TIME_FORMAT),
            self.baseline,
            self.relative_orbit,
            self.tile_id,
            self.discriminator.format(TIME_FORMAT)
        )
    }
}

fn invalid(field: &'static str, value: &str, expected: &'static str) -> ProductNameError {
    ProductNameError::InvalidField {
        field,
        value: value.to_string(),
        expected,
    }
}

fn parse_mission(s: &str) -> Result<Mission, ProductNameError> {
    match s {
        "S2A" => Ok(Mission::S2A),
        "S2B" => Ok(Mission::S2B),
        "S2C" => Ok(Mission::S2C),
        _ => Err(invalid("mission", s, "S2A, S2B or S2C")),
    }
}

fn parse_level(s: &str) -> Result<ProcessingLevel, ProductNameError> {
    match s {
        "MSIL1C" => Ok(ProcessingLevel::L1C),
        "MSIL2A" => Ok(ProcessingLevel::L2A),
        _ => Err(invalid("product level", s, "MSIL1C or MSIL2A")),
    }
}

fn parse_time(field: &'static str, s: &str) -> Result<NaiveDateTime, ProductNameError> {
    if s.len() != 15 {
        return Err(invalid(field, s, "YYYYMMDDTHHMMSS"));
    }
    NaiveDateTime::parse_from_str(s, TIME_FORMAT).map_err(|_| invalid(field, s, "YYYYMMDDTHHMMSS"))
}

fn parse_baseline(s: &str) -> Result<String, ProductNameError> {
    match s.strip_prefix('N') {
        Some(digits) if digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()) => {
            Ok(s.to_string())
        }
        _ => Err(invalid("baseline", s, "N followed by 4 digits")),
    }
}

fn parse_orbit(s: &str) -> Result<u16, ProductNameError> {
    const EXPECTED: &str = "R followed by 3 digits";
    match s.strip_prefix('R') {
        Some(digits) if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.parse().map_err(|_| invalid("relative orbit", s, EXPECTED))
        }
        _ => Err(invalid("relative orbit", s, EXPECTED)),
    }
}

fn parse_tile(s: &str) -> Result<String, ProductNameError> {
    const EXPECTED: &str = "T, UTM zone 01-60, latitude band C-X, 2-letter grid square";
    let tile = s
        .strip_prefix('T')
        .filter(|t| t.len() == 5 && t.is_ascii())
        .ok_or_else(|| invalid("tile", s, EXPECTED))?;

    let bytes = tile.as_bytes();
    let zone_ok = tile[..2]
        .parse::<u8>()
        .map(|z| (1..=60).contains(&z))
        .unwrap_or(false);
    let band_ok = matches!(bytes[2], b'C'..=b'X') && bytes[2] != b'I' && bytes[2] != b'O';
    let square_ok = bytes[3..].iter().all(|b| b.is_ascii_uppercase());

    if zone_ok && band_ok && square_ok {
        Ok(tile.to_string())
    } else {
        Err(invalid("tile", s, EXPECTED))
    }
}
