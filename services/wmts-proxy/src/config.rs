//! Service configuration loaded from environment variables.

use std::path::PathBuf;

use thiserror::Error;
use wms_protocol::{GutterPolicy, TileMatrixSetError};
use wmts_common::grids::UnknownGridError;
use wmts_common::{GridConfigError, GridName};

pub const DEFAULT_LAYERS: &str = "fonds_geo_osm_bdcad_couleur";
pub const DEFAULT_IMAGE_FORMAT: &str = "png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("WMS_BACKEND must be set to the base URL of the WMS server")]
    MissingBackend,

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: &'static str, message: String },

    #[error("Failed to read tile matrix set {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid tile matrix set {path:?}: {source}")]
    TileMatrixSet {
        path: PathBuf,
        #[source]
        source: TileMatrixSetError,
    },

    #[error(transparent)]
    Grid(#[from] GridConfigError),
}

impl From<UnknownGridError> for ConfigError {
    fn from(err: UnknownGridError) -> Self {
        ConfigError::InvalidValue {
            var: "TILE_GRID",
            message: err.to_string(),
        }
    }
}

/// Runtime settings of the proxy.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Base URL of the downstream WMS.
    pub backend_url: String,

    /// Layers requested when a call does not name any.
    pub default_layers: String,

    /// Built-in grid whose origin and extent are served.
    pub grid: GridName,

    /// WMTS capabilities file whose zoom table replaces the built-in one.
    pub tile_matrix_set_xml: Option<PathBuf>,

    pub gutter_policy: GutterPolicy,

    pub image_format: String,
}

impl ServiceConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_url = non_empty("WMS_BACKEND").ok_or(ConfigError::MissingBackend)?;

        let grid = match non_empty("TILE_GRID") {
            Some(name) => name.parse::<GridName>()?,
            None => GridName::Swisstopo28,
        };

        let gutter_policy = match non_empty("WMS_GUTTER_POLICY") {
            Some(policy) => policy
                .parse::<GutterPolicy>()
                .map_err(|message| ConfigError::InvalidValue {
                    var: "WMS_GUTTER_POLICY",
                    message,
                })?,
            None => GutterPolicy::default(),
        };

        Ok(Self {
            backend_url,
            default_layers: non_empty("WMS_LAYERS").unwrap_or_else(|| DEFAULT_LAYERS.to_string()),
            grid,
            tile_matrix_set_xml: non_empty("TILE_MATRIX_SET_XML").map(PathBuf::from),
            gutter_policy,
            image_format: non_empty("WMS_IMAGE_FORMAT")
                .unwrap_or_else(|| DEFAULT_IMAGE_FORMAT.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            ServiceConfig::from_lookup(lookup(&[("WMS_BACKEND", "https://wms.example.org/wms")]))
                .unwrap();

        assert_eq!(config.backend_url, "https://wms.example.org/wms");
        assert_eq!(config.default_layers, DEFAULT_LAYERS);
        assert_eq!(config.grid, GridName::Swisstopo28);
        assert_eq!(config.gutter_policy, GutterPolicy::PreserveBbox);
        assert_eq!(config.image_format, "png");
        assert!(config.tile_matrix_set_xml.is_none());
    }

    #[test]
    fn test_backend_is_required() {
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingBackend)
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[("WMS_BACKEND", "  ")])),
            Err(ConfigError::MissingBackend)
        ));
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("WMS_BACKEND", "http://localhost/wms"),
            ("WMS_LAYERS", "a,b"),
            ("TILE_GRID", "lausanne05"),
            ("WMS_GUTTER_POLICY", "expand"),
            ("WMS_IMAGE_FORMAT", "jpeg"),
            ("TILE_MATRIX_SET_XML", "/etc/wmts/capabilities.xml"),
        ]))
        .unwrap();

        assert_eq!(config.default_layers, "a,b");
        assert_eq!(config.grid, GridName::Lausanne05);
        assert_eq!(config.gutter_policy, GutterPolicy::ExpandBbox);
        assert_eq!(config.image_format, "jpeg");
        assert_eq!(
            config.tile_matrix_set_xml,
            Some(PathBuf::from("/etc/wmts/capabilities.xml"))
        );
    }

    #[test]
    fn test_unknown_grid() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("WMS_BACKEND", "http://localhost/wms"),
            ("TILE_GRID", "webmercator"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "TILE_GRID", .. }));
    }

    #[test]
    fn test_unknown_gutter_policy() {
        let err = ServiceConfig::from_lookup(lookup(&[
            ("WMS_BACKEND", "http://localhost/wms"),
            ("WMS_GUTTER_POLICY", "sideways"),
        ]))
        .unwrap_err();
        assert!(err.to_string().starts_with("Invalid value for WMS_GUTTER_POLICY"));
    }
}
