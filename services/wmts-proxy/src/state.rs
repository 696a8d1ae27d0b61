//! Application state for the WMTS proxy.

use std::borrow::Cow;

use serde::Deserialize;
use tracing::info;
use wms_protocol::{parse_zoom_table, GetMapParams, GutterPolicy, WmsParamBuilder};
use wmts_common::grids::lv95_config;
use wmts_common::{BBox, TileCoord, TileGrid, TileGridError};

use crate::config::{ConfigError, ServiceConfig};

/// Shared application state, built once at startup.
pub struct AppState {
    /// Tile grid serving all lookups.
    pub grid: Cow<'static, TileGrid>,

    /// Base URL of the downstream WMS.
    pub backend_url: String,

    /// Layers used when a request names none.
    pub default_layers: String,

    /// GetMap builder carrying the configured format and gutter policy.
    pub wms: WmsParamBuilder,
}

impl AppState {
    /// Build the state from environment configuration.
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(ServiceConfig::from_env()?)
    }

    pub fn from_config(config: ServiceConfig) -> Result<Self, ConfigError> {
        let grid = match &config.tile_matrix_set_xml {
            Some(path) => {
                let xml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                let zoom_levels =
                    parse_zoom_table(&xml).map_err(|source| ConfigError::TileMatrixSet {
                        path: path.clone(),
                        source,
                    })?;

                info!(
                    path = ?path,
                    levels = zoom_levels.len(),
                    "Loaded zoom table from tile matrix set"
                );

                let grid = TileGrid::new(lv95_config(config.grid.identifier(), zoom_levels))?;
                Cow::Owned(grid)
            }
            None => Cow::Borrowed(config.grid.grid()),
        };

        info!(
            grid = %config.grid,
            identifier = grid.identifier(),
            max_zoom = grid.max_zoom(),
            backend = %config.backend_url,
            "Tile grid ready"
        );

        let wms = WmsParamBuilder::new()
            .with_crs(grid.crs())
            .with_format(&config.image_format)
            .with_gutter_policy(config.gutter_policy);

        Ok(Self {
            grid,
            backend_url: config.backend_url,
            default_layers: config.default_layers,
            wms,
        })
    }

    /// Convert a path zoom into a grid zoom; negative values are unsupported.
    pub fn zoom(&self, zoom: i64) -> Result<u32, TileGridError> {
        u32::try_from(zoom).map_err(|_| self.grid.unsupported_zoom(zoom))
    }

    /// Resolve and validate a tile from raw path segments.
    pub fn tile(&self, zoom: i64, col: i64, row: i64) -> Result<(TileCoord, BBox), TileGridError> {
        let coord = TileCoord::new(self.zoom(zoom)?, col, row);
        let bbox = self.grid.tile_bbox(&coord)?;
        Ok((coord, bbox))
    }

    /// GetMap parameters for a tile-sized image.
    ///
    /// Options given with the request replace the configured defaults.
    pub fn getmap(&self, bbox: &BBox, options: &WmsOptions) -> GetMapParams {
        let layers = options
            .layers
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(self.default_layers.as_str());
        let size = self.grid.tile_size();
        let gutter = options.gutter.unwrap_or(0);

        if options.format.is_none() && options.gutter_policy.is_none() {
            return self.wms.build(bbox, layers, gutter, size, size);
        }

        let mut builder = self.wms.clone();
        if let Some(format) = options.format.as_deref() {
            builder = builder.with_format(format);
        }
        if let Some(policy) = options.gutter_policy {
            builder = builder.with_gutter_policy(policy);
        }
        builder.build(bbox, layers, gutter, size, size)
    }
}

/// Per-request GetMap options, all optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WmsOptions {
    pub layers: Option<String>,
    pub gutter: Option<u32>,
    pub format: Option<String>,
    pub gutter_policy: Option<GutterPolicy>,
}
