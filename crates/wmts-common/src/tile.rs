//! WMTS tile grid: zoom table, coordinate/tile conversion and tile bounds.
//!
//! A [`TileGrid`] is built from a [`TileGridConfig`]; the algorithms are the
//! same for every grid and only the configuration data differs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GridConfigError, TileGridError, TileGridResult};
use crate::{BBox, Crs};

/// Largest tile offset that is refined against tile edges (2^53).
const SNAP_LIMIT: f64 = 9_007_199_254_740_992.0;

/// OGC WMTS reference pixel size (0.28 mm), in meters.
pub const WMTS_REF_PIXEL_SIZE_M: f64 = 0.00028;

/// Scale denominator for a cell size in meters per pixel.
pub fn scale_denominator(cell_size: f64) -> f64 {
    cell_size / WMTS_REF_PIXEL_SIZE_M
}

/// Cell size in meters per pixel for a scale denominator.
pub fn cell_size_from_scale(scale_denominator: f64) -> f64 {
    scale_denominator * WMTS_REF_PIXEL_SIZE_M
}

/// One row of a grid's resolution table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLevel {
    /// Ground meters per pixel.
    pub cell_size: f64,

    /// Maximum tile column count. Derived from the grid extent when absent.
    pub matrix_width: Option<f64>,

    /// Maximum tile row count. Derived from the grid extent when absent.
    pub matrix_height: Option<f64>,

    /// Published scale denominator, if the table carries one.
    pub scale_denominator: Option<f64>,
}

impl ZoomLevel {
    /// A level known only by its cell size.
    pub const fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            matrix_width: None,
            matrix_height: None,
            scale_denominator: None,
        }
    }

    /// A level with explicit matrix dimensions.
    pub const fn with_matrix(cell_size: f64, matrix_width: f64, matrix_height: f64) -> Self {
        Self {
            cell_size,
            matrix_width: Some(matrix_width),
            matrix_height: Some(matrix_height),
            scale_denominator: None,
        }
    }

    pub const fn with_scale_denominator(mut self, scale_denominator: f64) -> Self {
        self.scale_denominator = Some(scale_denominator);
        self
    }

    /// Scale denominator, computed from the cell size when not published.
    pub fn scale_denominator(&self) -> f64 {
        self.scale_denominator
            .unwrap_or_else(|| scale_denominator(self.cell_size))
    }
}

/// Zoom levels keyed by zoom number.
pub type ZoomTable = BTreeMap<u32, ZoomLevel>;

/// Build a zoom table from levels listed in zoom order, starting at 0.
pub fn zoom_table(levels: impl IntoIterator<Item = ZoomLevel>) -> ZoomTable {
    (0u32..).zip(levels).collect()
}

/// How a fractional tile offset is turned into an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexRounding {
    /// Round toward negative infinity, snapped to the computed tile edges.
    #[default]
    Floor,
    /// Round toward zero, as a plain integer cast does.
    Truncate,
}

/// A tile coordinate (zoom/col/row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub zoom: u32,
    pub col: i64,
    pub row: i64,
}

impl TileCoord {
    pub fn new(zoom: u32, col: i64, row: i64) -> Self {
        Self { zoom, col, row }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.col, self.row)
    }
}

/// Everything that distinguishes one tile grid from another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGridConfig {
    /// Identifier (TileMatrixSet name)
    pub identifier: String,

    /// Coordinate reference system of the grid
    pub crs: Crs,

    /// Ground coordinate of pixel (0, 0)
    pub top_left: (f64, f64),

    /// Tile width and height in pixels
    pub tile_size: u32,

    /// Total ground extent of the grid, independent of the zoom table
    pub extent: BBox,

    /// Resolution table
    pub zoom_levels: ZoomTable,

    /// Rounding used by coordinate to tile conversion
    #[serde(default)]
    pub rounding: IndexRounding,
}

/// A multi-resolution tile grid over one projected CRS.
///
/// Immutable once built; all lookups are pure functions of the
/// configuration and their arguments.
#[derive(Debug, Clone)]
pub struct TileGrid {
    config: TileGridConfig,
}

impl TileGrid {
    /// Validate a configuration and build the grid.
    pub fn new(config: TileGridConfig) -> Result<Self, GridConfigError> {
        if config.zoom_levels.is_empty() {
            return Err(GridConfigError::EmptyZoomTable(config.identifier));
        }
        if config.tile_size == 0 {
            return Err(GridConfigError::ZeroTileSize);
        }
        if let Some((&zoom, level)) = config
            .zoom_levels
            .iter()
            .find(|(_, level)| !(level.cell_size > 0.0))
        {
            return Err(GridConfigError::InvalidCellSize {
                zoom,
                cell_size: level.cell_size,
            });
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &TileGridConfig {
        &self.config
    }

    pub fn identifier(&self) -> &str {
        &self.config.identifier
    }

    pub fn crs(&self) -> Crs {
        self.config.crs
    }

    pub fn tile_size(&self) -> u32 {
        self.config.tile_size
    }

    pub fn top_left(&self) -> (f64, f64) {
        self.config.top_left
    }

    /// The grid's fixed total extent.
    pub fn extent(&self) -> BBox {
        self.config.extent
    }

    pub fn zoom_levels(&self) -> &ZoomTable {
        &self.config.zoom_levels
    }

    /// Largest zoom key in the resolution table.
    pub fn max_zoom(&self) -> u32 {
        self.config
            .zoom_levels
            .keys()
            .next_back()
            .copied()
            .unwrap_or_default()
    }

    /// Error for a zoom level that is not in the table.
    ///
    /// Takes a signed zoom so callers can report negative request values.
    pub fn unsupported_zoom(&self, zoom: i64) -> TileGridError {
        TileGridError::UnsupportedZoom {
            zoom,
            max_zoom: self.max_zoom(),
        }
    }

    /// Look up a zoom level.
    pub fn level(&self, zoom: u32) -> TileGridResult<&ZoomLevel> {
        self.config
            .zoom_levels
            .get(&zoom)
            .ok_or_else(|| self.unsupported_zoom(i64::from(zoom)))
    }

    /// Ground size of one tile side at `zoom`.
    pub fn tile_span(&self, zoom: u32) -> TileGridResult<f64> {
        let level = self.level(zoom)?;
        Ok(self.tile_size_f64() * level.cell_size)
    }

    /// Total grid width in ground units.
    pub fn grid_width(&self) -> f64 {
        self.config.extent.width()
    }

    /// Total grid height in ground units.
    pub fn grid_height(&self) -> f64 {
        self.config.extent.height()
    }

    /// Maximum column count at `zoom`: the table's matrix width, or the
    /// grid width divided by the tile span.
    pub fn max_cols(&self, zoom: u32) -> TileGridResult<f64> {
        let level = self.level(zoom)?;
        Ok(level
            .matrix_width
            .unwrap_or_else(|| self.grid_width() / (self.tile_size_f64() * level.cell_size)))
    }

    /// Maximum row count at `zoom`: the table's matrix height, or the
    /// grid height divided by the tile span.
    pub fn max_rows(&self, zoom: u32) -> TileGridResult<f64> {
        let level = self.level(zoom)?;
        Ok(level
            .matrix_height
            .unwrap_or_else(|| self.grid_height() / (self.tile_size_f64() * level.cell_size)))
    }

    /// Column and row of the tile containing ground point `(x, y)`.
    ///
    /// No bounds check is done: the result may lie outside the matrix. Use
    /// [`TileGrid::is_valid_tile`] to check it.
    pub fn tile_index_from_coordinate(&self, x: f64, y: f64, zoom: u32) -> TileGridResult<(i64, i64)> {
        let span = self.tile_span(zoom)?;
        let (origin_x, origin_y) = self.config.top_left;
        let col_offset = (x - origin_x) / span;
        let row_offset = (origin_y - y) / span;

        match self.config.rounding {
            IndexRounding::Truncate => Ok((col_offset.trunc() as i64, row_offset.trunc() as i64)),
            IndexRounding::Floor => {
                let tile_size = self.tile_size_f64();
                let cell_size = self.level(zoom)?.cell_size;
                // Edges computed the same way tile_bounding_box computes them.
                let left_edge = |col: i64| origin_x + col as f64 * tile_size * cell_size;
                let top_edge = |row: i64| origin_y - row as f64 * tile_size * cell_size;

                // Past 2^53 the offset has no fractional part left to correct
                // and the float-to-int cast may saturate.
                let mut col = col_offset.floor() as i64;
                if col_offset.abs() < SNAP_LIMIT {
                    if left_edge(col + 1) <= x {
                        col += 1;
                    } else if left_edge(col) > x {
                        col -= 1;
                    }
                }

                let mut row = row_offset.floor() as i64;
                if row_offset.abs() < SNAP_LIMIT {
                    if top_edge(row + 1) >= y {
                        row += 1;
                    } else if top_edge(row) < y {
                        row -= 1;
                    }
                }

                Ok((col, row))
            }
        }
    }

    /// The tile containing ground point `(x, y)` as a [`TileCoord`].
    pub fn tile_at(&self, x: f64, y: f64, zoom: u32) -> TileGridResult<TileCoord> {
        let (col, row) = self.tile_index_from_coordinate(x, y, zoom)?;
        Ok(TileCoord { zoom, col, row })
    }

    /// Check whether a tile index is inside the grid.
    ///
    /// The upper bound is inclusive: an index equal to the column or row
    /// count is accepted.
    pub fn is_valid_tile(&self, zoom: u32, col: i64, row: i64) -> bool {
        self.check_tile(zoom, col, row).is_ok()
    }

    fn check_tile(&self, zoom: u32, col: i64, row: i64) -> TileGridResult<()> {
        let max_cols = self.max_cols(zoom)?;
        if col < 0 || col as f64 > max_cols {
            return Err(TileGridError::InvalidColumn { col, max_cols });
        }

        let max_rows = self.max_rows(zoom)?;
        if row < 0 || row as f64 > max_rows {
            return Err(TileGridError::InvalidRow { row, max_rows });
        }

        Ok(())
    }

    /// Ground bounding box of a tile.
    ///
    /// Fails with the first failing check, in order: zoom, column, row.
    pub fn tile_bounding_box(&self, zoom: u32, col: i64, row: i64) -> TileGridResult<BBox> {
        self.check_tile(zoom, col, row)?;

        let cell_size = self.level(zoom)?.cell_size;
        let tile_size = self.tile_size_f64();
        let (origin_x, origin_y) = self.config.top_left;

        let x_min = origin_x + col as f64 * tile_size * cell_size;
        let y_max = origin_y - row as f64 * tile_size * cell_size;
        let x_max = x_min + tile_size * cell_size;
        let y_min = y_max - tile_size * cell_size;

        Ok(BBox::new(x_min, y_min, x_max, y_max))
    }

    /// Bounding box for a [`TileCoord`].
    pub fn tile_bbox(&self, coord: &TileCoord) -> TileGridResult<BBox> {
        self.tile_bounding_box(coord.zoom, coord.col, coord.row)
    }

    /// Smallest tile-aligned bbox at `zoom` covering `image`.
    ///
    /// The tiles under the image's top-left and bottom-right corners are
    /// located and merged with the image bbox.
    pub fn covering_bbox(&self, image: &BBox, zoom: u32) -> TileGridResult<BBox> {
        let top_left = self.tile_at(image.min_x(), image.max_y(), zoom)?;
        let bottom_right = self.tile_at(image.max_x(), image.min_y(), zoom)?;

        let top_left = self.tile_bbox(&top_left)?;
        let bottom_right = self.tile_bbox(&bottom_right)?;

        Ok(image.union(&top_left).union(&bottom_right))
    }

    /// [`TileGrid::covering_bbox`] for every zoom in the table.
    pub fn covering_bboxes(&self, image: &BBox) -> TileGridResult<BTreeMap<u32, BBox>> {
        self.config
            .zoom_levels
            .keys()
            .map(|&zoom| Ok((zoom, self.covering_bbox(image, zoom)?)))
            .collect()
    }

    fn tile_size_f64(&self) -> f64 {
        self.config.tile_size as f64
    }
}
