//! WMS 1.3.0 GetMap request parameters.
//!
//! Builds the ordered parameter set sent to the downstream WMS for one tile.
//! Nothing here performs I/O; callers serialize the parameters into a URL.

use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use wmts_common::{BBox, Crs};

pub const WMS_SERVICE: &str = "WMS";
pub const WMS_VERSION: &str = "1.3.0";
pub const DEFAULT_FORMAT: &str = "png";

/// How a gutter relates to the ground footprint of the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GutterPolicy {
    /// Only the image grows; BBOX stays the tile footprint.
    #[default]
    #[serde(alias = "pixel", alias = "preserve")]
    PreserveBbox,
    /// BBOX grows with the image so the ground resolution is unchanged.
    #[serde(alias = "expand")]
    ExpandBbox,
}

impl FromStr for GutterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pixel" | "preserve" | "preserve_bbox" => Ok(GutterPolicy::PreserveBbox),
            "expand" | "expand_bbox" => Ok(GutterPolicy::ExpandBbox),
            other => Err(format!(
                "Unknown gutter policy: {}. Expected 'pixel' or 'expand'",
                other
            )),
        }
    }
}

/// Ordered GetMap query parameters.
///
/// Keys keep insertion order, which is the order they are written to the
/// query string.
#[derive(Debug, Clone, PartialEq)]
pub struct GetMapParams {
    pairs: Vec<(&'static str, String)>,
    bbox: BBox,
}

impl GetMapParams {
    /// Value for a key, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.pairs.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.pairs.iter().map(|(k, _)| *k).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The bbox written to `BBOX`, after any gutter expansion.
    pub fn bbox(&self) -> BBox {
        self.bbox
    }

    /// `key=value` pairs joined with `&`, values written verbatim.
    pub fn to_query_string(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append the query string to a backend base URL.
    ///
    /// Uses `&` when the base already carries a query string, `?` otherwise.
    pub fn url(&self, base: &str) -> String {
        let separator = if base.ends_with('?') || base.ends_with('&') {
            ""
        } else if base.contains('?') {
            "&"
        } else {
            "?"
        };
        format!("{}{}{}", base, separator, self.to_query_string())
    }
}

impl fmt::Display for GetMapParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Serializes as a JSON object with keys in request order.
impl Serialize for GetMapParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in &self.pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Builder for [`GetMapParams`].
#[derive(Debug, Clone)]
pub struct WmsParamBuilder {
    crs: Crs,
    format: String,
    gutter_policy: GutterPolicy,
}

impl Default for WmsParamBuilder {
    fn default() -> Self {
        Self {
            crs: Crs::LV95,
            format: DEFAULT_FORMAT.to_string(),
            gutter_policy: GutterPolicy::default(),
        }
    }
}

impl WmsParamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    /// Image format, either bare ("png") or as a MIME type ("image/png").
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = format
            .strip_prefix("image/")
            .unwrap_or(format)
            .to_string();
        self
    }

    pub fn with_gutter_policy(mut self, gutter_policy: GutterPolicy) -> Self {
        self.gutter_policy = gutter_policy;
        self
    }

    pub fn gutter_policy(&self) -> GutterPolicy {
        self.gutter_policy
    }

    /// Build the parameter set for one tile.
    ///
    /// `width`/`height` are the tile's pixel size; the requested image is
    /// `gutter` pixels larger on every side.
    pub fn build(&self, bbox: &BBox, layers: &str, gutter: u32, width: u32, height: u32) -> GetMapParams {
        let bbox = match self.gutter_policy {
            GutterPolicy::ExpandBbox if gutter > 0 && width > 0 && height > 0 => {
                let dx = gutter as f64 * bbox.width() / width as f64;
                let dy = gutter as f64 * bbox.height() / height as f64;
                bbox.expand(dx, dy)
            }
            _ => *bbox,
        };

        let transparent = if self.format == "png" { "true" } else { "false" };

        let pairs = vec![
            ("SERVICE", WMS_SERVICE.to_string()),
            ("VERSION", WMS_VERSION.to_string()),
            ("REQUEST", "GetMap".to_string()),
            ("FORMAT", format!("image/{}", self.format)),
            ("TRANSPARENT", transparent.to_string()),
            ("LAYERS", layers.to_string()),
            ("WIDTH", padded_size(width, gutter).to_string()),
            ("HEIGHT", padded_size(height, gutter).to_string()),
            ("CRS", self.crs.to_string()),
            ("STYLES", String::new()),
            ("BBOX", bbox.to_string()),
        ];

        GetMapParams { pairs, bbox }
    }
}

/// Image side length with a gutter on both ends. Widened to u64 so any
/// `u32` gutter fits.
fn padded_size(size: u32, gutter: u32) -> u64 {
    u64::from(size) + 2 * u64::from(gutter)
}

/// GetMap parameters with the default CRS and gutter policy.
pub fn build_params(
    bbox: &BBox,
    layers: &str,
    gutter: u32,
    width: u32,
    height: u32,
    format: &str,
) -> GetMapParams {
    WmsParamBuilder::new()
        .with_format(format)
        .build(bbox, layers, gutter, width, height)
}
