//! Grid description handler.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;
use wmts_common::{BBox, TileGridError};

use crate::error::WmtsError;
use crate::handlers::tiles::DataResponse;
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomInfo {
    pub zoom: u32,
    pub cell_size: f64,
    pub scale_denominator: f64,
    pub tile_span: f64,
    pub max_cols: f64,
    pub max_rows: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridInfo {
    pub identifier: String,
    pub crs: String,
    pub tile_size: u32,
    pub top_left: [f64; 2],
    pub extent: BBox,
    pub max_zoom: u32,
    pub width: f64,
    pub height: f64,
    pub zoom_levels: Vec<ZoomInfo>,
}

/// GET /grid
pub async fn grid_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<DataResponse<GridInfo>>, WmtsError> {
    metrics::record_request("grid");
    let grid = &state.grid;

    let zoom_levels = grid
        .zoom_levels()
        .iter()
        .map(|(&zoom, level)| -> Result<ZoomInfo, TileGridError> {
            Ok(ZoomInfo {
                zoom,
                cell_size: level.cell_size,
                scale_denominator: level.scale_denominator(),
                tile_span: grid.tile_span(zoom)?,
                max_cols: grid.max_cols(zoom)?,
                max_rows: grid.max_rows(zoom)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        // Every zoom comes from the grid's own table
        .map_err(|err| WmtsError::Internal(format!("Inconsistent zoom table: {}", err)))?;

    let (x, y) = grid.top_left();
    Ok(DataResponse::new(GridInfo {
        identifier: grid.identifier().to_string(),
        crs: grid.crs().to_string(),
        tile_size: grid.tile_size(),
        top_left: [x, y],
        extent: grid.extent(),
        max_zoom: grid.max_zoom(),
        width: grid.grid_width(),
        height: grid.grid_height(),
        zoom_levels,
    }))
}
