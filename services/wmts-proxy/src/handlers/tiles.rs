//! Tile lookup handlers.
//!
//! Extractor rejections are taken as `Result` and converted into
//! [`WmtsError`], so every failure answers with the same JSON body.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Extension, Path, Query,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use wms_protocol::{GetMapParams, GutterPolicy};
use wmts_common::{BBox, TileCoord};

use crate::error::WmtsError;
use crate::metrics;
use crate::state::{AppState, WmsOptions};

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

#[derive(Debug, Serialize)]
pub struct TileData {
    pub zoom: u32,
    pub col: i64,
    pub row: i64,
    pub bbox: BBox,
}

impl TileData {
    fn new(coord: TileCoord, bbox: BBox) -> Self {
        Self {
            zoom: coord.zoom,
            col: coord.col,
            row: coord.row,
            bbox,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WmsTileData {
    #[serde(flatten)]
    pub tile: TileData,
    pub params: GetMapParams,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct CoverData {
    pub zoom: u32,
    pub image: BBox,
    pub bbox: BBox,
}

// ============================================================================
// Query types
// ============================================================================

/// Query of `/locate/:zoom`. Coordinates are parsed by hand so a missing or
/// malformed value gets a parameter-specific message.
#[derive(Debug, Default, Deserialize)]
pub struct LocateQuery {
    pub x: Option<String>,
    pub y: Option<String>,
    pub layers: Option<String>,
    pub gutter: Option<u32>,
    pub format: Option<String>,
    pub gutter_policy: Option<GutterPolicy>,
}

impl LocateQuery {
    fn coordinate(value: Option<&str>, param: &str) -> Result<f64, WmtsError> {
        let value = value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| WmtsError::MissingParameter(param.to_string()))?;
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(WmtsError::InvalidParameter {
                param: param.to_string(),
                message: format!("'{}' is not a coordinate", value),
            }),
        }
    }

    fn options(self) -> WmsOptions {
        WmsOptions {
            layers: self.layers,
            gutter: self.gutter,
            format: self.format,
            gutter_policy: self.gutter_policy,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CoverQuery {
    pub bbox: Option<String>,
}

fn wms_tile_data(state: &AppState, coord: TileCoord, bbox: BBox, options: &WmsOptions) -> WmsTileData {
    let params = state.getmap(&bbox, options);
    let url = params.url(&state.backend_url);
    debug!(tile = %coord, url = %url, "Built WMS GetMap request");

    WmsTileData {
        tile: TileData::new(coord, bbox),
        params,
        url,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tiles/:zoom/:col/:row
#[instrument(skip(state))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<(i64, i64, i64)>, PathRejection>,
) -> Result<Json<DataResponse<TileData>>, WmtsError> {
    metrics::record_request("tile");
    let Path((zoom, col, row)) = path?;

    let (coord, bbox) = state.tile(zoom, col, row)?;
    Ok(DataResponse::new(TileData::new(coord, bbox)))
}

/// GET /tiles/:zoom/:col/:row/wms
#[instrument(skip(state))]
pub async fn tile_wms_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<(i64, i64, i64)>, PathRejection>,
    query: Result<Query<WmsOptions>, QueryRejection>,
) -> Result<Json<DataResponse<WmsTileData>>, WmtsError> {
    metrics::record_request("tile_wms");
    let Path((zoom, col, row)) = path?;
    let Query(options) = query?;

    let (coord, bbox) = state.tile(zoom, col, row)?;
    Ok(DataResponse::new(wms_tile_data(&state, coord, bbox, &options)))
}

/// GET /locate/:zoom?x=&y=
#[instrument(skip(state))]
pub async fn locate_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<LocateQuery>, QueryRejection>,
) -> Result<Json<DataResponse<WmsTileData>>, WmtsError> {
    metrics::record_request("locate");
    let Path(zoom) = path?;
    let Query(query) = query?;

    let zoom = state.zoom(zoom)?;
    let x = LocateQuery::coordinate(query.x.as_deref(), "x")?;
    let y = LocateQuery::coordinate(query.y.as_deref(), "y")?;

    let coord = state.grid.tile_at(x, y, zoom)?;
    let bbox = state.grid.tile_bbox(&coord)?;
    Ok(DataResponse::new(wms_tile_data(
        &state,
        coord,
        bbox,
        &query.options(),
    )))
}

/// GET /cover/:zoom?bbox=minx,miny,maxx,maxy
#[instrument(skip(state))]
pub async fn cover_handler(
    Extension(state): Extension<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<CoverQuery>, QueryRejection>,
) -> Result<Json<DataResponse<CoverData>>, WmtsError> {
    metrics::record_request("cover");
    let Path(zoom) = path?;
    let Query(query) = query?;

    let zoom = state.zoom(zoom)?;
    let bbox = query
        .bbox
        .ok_or_else(|| WmtsError::MissingParameter("bbox".to_string()))?;
    let image = BBox::from_wms_string(&bbox)?;

    let cover = state.grid.covering_bbox(&image, zoom)?;
    Ok(DataResponse::new(CoverData {
        zoom,
        image,
        bbox: cover,
    }))
}
