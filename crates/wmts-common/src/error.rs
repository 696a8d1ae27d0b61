//! Error types for tile grid lookups.

use thiserror::Error;

/// Result type alias using TileGridError.
pub type TileGridResult<T> = Result<T, TileGridError>;

/// An invalid tile request.
///
/// Every variant describes a caller input problem and carries the valid
/// range so the message is actionable on its own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileGridError {
    #[error("Unsupported zoom level. Please choose between 0 and {max_zoom}.")]
    UnsupportedZoom { zoom: i64, max_zoom: u32 },

    #[error("Invalid column index. Please choose between 0 and {max_cols}.")]
    InvalidColumn { col: i64, max_cols: f64 },

    #[error("Invalid row index. Please choose between 0 and {max_rows}.")]
    InvalidRow { row: i64, max_rows: f64 },
}

impl TileGridError {
    /// Short machine-readable name of the failure, used for metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            TileGridError::UnsupportedZoom { .. } => "unsupported_zoom",
            TileGridError::InvalidColumn { .. } => "invalid_column",
            TileGridError::InvalidRow { .. } => "invalid_row",
        }
    }
}

/// A grid configuration that cannot describe a usable tile grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridConfigError {
    #[error("Tile grid '{0}' has no zoom levels")]
    EmptyZoomTable(String),

    #[error("Tile size must be positive")]
    ZeroTileSize,

    #[error("Zoom level {zoom} has non-positive cell size {cell_size}")]
    InvalidCellSize { zoom: u32, cell_size: f64 },
}
