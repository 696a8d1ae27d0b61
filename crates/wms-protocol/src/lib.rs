//! OGC WMS/WMTS protocol pieces for the tile proxy.
//!
//! Supports:
//! - WMS 1.3.0 GetMap parameter sets for a tile bbox
//! - WMTS 1.0.0 TileMatrixSet zoom table import

pub mod getmap;
pub mod tile_matrix_set;

pub use getmap::{build_params, GetMapParams, GutterPolicy, WmsParamBuilder};
pub use tile_matrix_set::{parse_zoom_table, TileMatrixSetError};
