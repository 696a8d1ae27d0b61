//! HTTP request handlers.

pub mod grid;
pub mod health;
pub mod tiles;

pub use grid::grid_handler;
pub use health::{health_handler, metrics_handler};
pub use tiles::{cover_handler, locate_handler, tile_handler, tile_wms_handler};
