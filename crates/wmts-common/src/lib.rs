//! Tile grid model shared by the WMTS proxy crates.
//!
//! Converts between LV95 ground coordinates, tile indices and tile
//! bounding boxes for a fixed-origin, multi-resolution grid.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grids;
pub mod tile;

pub use bbox::{BBox, BboxParseError};
pub use crs::Crs;
pub use error::{GridConfigError, TileGridError, TileGridResult};
pub use grids::{GridName, LAUSANNE_05, SWISSTOPO_28};
pub use tile::{IndexRounding, TileCoord, TileGrid, TileGridConfig, ZoomLevel, ZoomTable};
