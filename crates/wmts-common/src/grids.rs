//! Known LV95 tile grids.
//!
//! Both grids share origin, extent and tile size; they differ only in
//! their zoom tables. The tables are built once per process.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::tile::{zoom_table, IndexRounding, TileGrid, TileGridConfig, ZoomLevel};
use crate::{BBox, Crs};

/// Minimum X of the Swiss grid extent in LV95
pub const LV95_MIN_X: f64 = 2_420_000.0;
pub const LV95_MIN_Y: f64 = 1_030_000.0;
pub const LV95_MAX_X: f64 = 2_900_000.0;
pub const LV95_MAX_Y: f64 = 1_350_000.0;

pub const DEFAULT_TILE_SIZE: u32 = 256;

/// swisstopo TileMatrixSet 2056_28 (eCH-0056 cell sizes).
const SWISSTOPO_28_LEVELS: [ZoomLevel; 29] = [
    ZoomLevel::with_matrix(4000.0, 1.0, 1.0).with_scale_denominator(14285714.285714287),
    ZoomLevel::with_matrix(3750.0, 1.0, 1.0).with_scale_denominator(13392857.142857144),
    ZoomLevel::with_matrix(3500.0, 1.0, 1.0).with_scale_denominator(12500000.000000002),
    ZoomLevel::with_matrix(3250.0, 1.0, 1.0).with_scale_denominator(11607142.857142858),
    ZoomLevel::with_matrix(3000.0, 1.0, 1.0).with_scale_denominator(10714285.714285715),
    ZoomLevel::with_matrix(2750.0, 1.0, 1.0).with_scale_denominator(9821428.571428573),
    ZoomLevel::with_matrix(2500.0, 1.0, 1.0).with_scale_denominator(8928571.42857143),
    ZoomLevel::with_matrix(2250.0, 1.0, 1.0).with_scale_denominator(8035714.285714286),
    ZoomLevel::with_matrix(2000.0, 1.0, 1.0).with_scale_denominator(7142857.142857144),
    ZoomLevel::with_matrix(1750.0, 2.0, 1.0).with_scale_denominator(6250000.000000001),
    ZoomLevel::with_matrix(1500.0, 2.0, 1.0).with_scale_denominator(5357142.857142857),
    ZoomLevel::with_matrix(1250.0, 2.0, 1.0).with_scale_denominator(4464285.714285715),
    ZoomLevel::with_matrix(1000.0, 2.0, 2.0).with_scale_denominator(3571428.571428572),
    ZoomLevel::with_matrix(750.0, 3.0, 2.0).with_scale_denominator(2678571.4285714286),
    ZoomLevel::with_matrix(650.0, 3.0, 2.0).with_scale_denominator(2321428.571428572),
    ZoomLevel::with_matrix(500.0, 4.0, 3.0).with_scale_denominator(1785714.285714286),
    ZoomLevel::with_matrix(250.0, 8.0, 5.0).with_scale_denominator(892857.142857143),
    ZoomLevel::with_matrix(100.0, 19.0, 13.0).with_scale_denominator(357142.85714285716),
    ZoomLevel::with_matrix(50.0, 38.0, 25.0).with_scale_denominator(178571.42857142858),
    ZoomLevel::with_matrix(20.0, 94.0, 63.0).with_scale_denominator(71428.57142857143),
    ZoomLevel::with_matrix(10.0, 188.0, 125.0).with_scale_denominator(35714.28571428572),
    ZoomLevel::with_matrix(5.0, 375.0, 250.0).with_scale_denominator(17857.14285714286),
    ZoomLevel::with_matrix(2.5, 750.0, 500.0).with_scale_denominator(8928.57142857143),
    ZoomLevel::with_matrix(2.0, 938.0, 625.0).with_scale_denominator(7142.857142857143),
    ZoomLevel::with_matrix(1.5, 1250.0, 834.0).with_scale_denominator(5357.142857142858),
    ZoomLevel::with_matrix(1.0, 1875.0, 1250.0).with_scale_denominator(3571.4285714285716),
    ZoomLevel::with_matrix(0.5, 3750.0, 2500.0).with_scale_denominator(1785.7142857142858),
    ZoomLevel::with_matrix(0.25, 7500.0, 5000.0).with_scale_denominator(892.8571428571429),
    // 357.14285714285717 * 0.00028, as published
    ZoomLevel::with_matrix(0.09999999999999999, 18750.0, 12500.0)
        .with_scale_denominator(357.14285714285717),
];

/// swissgrid_05, the 9-level grid used by the Lausanne tile server.
///
/// Matrix dimensions are not listed; they follow from the grid extent.
/// These derived bounds can be fractional and differ from the published
/// Lausanne table (37.5 rather than 38 columns at zoom 0, so column 38 is
/// rejected).
const LAUSANNE_05_LEVELS: [ZoomLevel; 9] = [
    ZoomLevel::new(50.0).with_scale_denominator(178571.42857142858),
    ZoomLevel::new(20.0).with_scale_denominator(71428.57142857143),
    ZoomLevel::new(10.0).with_scale_denominator(35714.28571428572),
    ZoomLevel::new(5.0).with_scale_denominator(17857.14285714286),
    ZoomLevel::new(2.5).with_scale_denominator(8928.57142857143),
    ZoomLevel::new(1.0).with_scale_denominator(3571.4285714285716),
    ZoomLevel::new(0.5).with_scale_denominator(1785.7142857142858),
    ZoomLevel::new(0.25).with_scale_denominator(892.8571428571429),
    ZoomLevel::new(0.1).with_scale_denominator(357.14285714285717),
];

/// Named grid configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridName {
    /// 29 zoom levels, 4000 m to 0.1 m per pixel
    Swisstopo28,
    /// 9 zoom levels, 50 m to 0.1 m per pixel
    Lausanne05,
}

impl GridName {
    pub fn identifier(&self) -> &'static str {
        match self {
            GridName::Swisstopo28 => "2056_28",
            GridName::Lausanne05 => "swissgrid_05",
        }
    }

    /// A fresh configuration, for callers that want to replace parts of it.
    pub fn config(&self) -> TileGridConfig {
        let levels: &[ZoomLevel] = match self {
            GridName::Swisstopo28 => &SWISSTOPO_28_LEVELS,
            GridName::Lausanne05 => &LAUSANNE_05_LEVELS,
        };

        lv95_config(self.identifier(), zoom_table(levels.iter().copied()))
    }

    /// The shared, process-wide grid.
    pub fn grid(&self) -> &'static TileGrid {
        match self {
            GridName::Swisstopo28 => &SWISSTOPO_28,
            GridName::Lausanne05 => &LAUSANNE_05,
        }
    }
}

impl fmt::Display for GridName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GridName::Swisstopo28 => "swisstopo28",
            GridName::Lausanne05 => "lausanne05",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for GridName {
    type Err = UnknownGridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "swisstopo28" | "2056_28" => Ok(GridName::Swisstopo28),
            "lausanne05" | "swissgrid_05" => Ok(GridName::Lausanne05),
            _ => Err(UnknownGridError(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown tile grid: {0}. Expected 'swisstopo28' or 'lausanne05'")]
pub struct UnknownGridError(pub String);

/// LV95 grid configuration around an arbitrary zoom table.
pub fn lv95_config(identifier: &str, zoom_levels: crate::tile::ZoomTable) -> TileGridConfig {
    TileGridConfig {
        identifier: identifier.to_string(),
        crs: Crs::LV95,
        top_left: (LV95_MIN_X, LV95_MAX_Y),
        tile_size: DEFAULT_TILE_SIZE,
        extent: BBox::new(LV95_MIN_X, LV95_MIN_Y, LV95_MAX_X, LV95_MAX_Y),
        zoom_levels,
        rounding: IndexRounding::Floor,
    }
}

pub static SWISSTOPO_28: Lazy<TileGrid> = Lazy::new(|| {
    TileGrid::new(GridName::Swisstopo28.config()).expect("built-in swisstopo28 table is valid")
});

pub static LAUSANNE_05: Lazy<TileGrid> = Lazy::new(|| {
    TileGrid::new(GridName::Lausanne05.config()).expect("built-in lausanne05 table is valid")
});
