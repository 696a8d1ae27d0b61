//! HTTP route tests, driven through the router without a listener.

use std::io::Write;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use wms_protocol::GutterPolicy;
use wmts_common::GridName;
use wmts_proxy::build_router;
use wmts_proxy::config::{ConfigError, ServiceConfig};
use wmts_proxy::state::AppState;

const BACKEND: &str = "https://wms.example.org/wms";

fn config(grid: GridName) -> ServiceConfig {
    ServiceConfig {
        backend_url: BACKEND.to_string(),
        default_layers: "fonds_geo_osm_bdcad_couleur".to_string(),
        grid,
        tile_matrix_set_xml: None,
        gutter_policy: GutterPolicy::PreserveBbox,
        image_format: "png".to_string(),
    }
}

fn app(config: ServiceConfig) -> Router {
    let state = AppState::from_config(config).unwrap();
    build_router(Arc::new(state), None)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// ============================================================================
// Health and grid
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(config(GridName::Swisstopo28)), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_grid_description() {
    let (status, body) = get(app(config(GridName::Swisstopo28)), "/grid").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["identifier"], "2056_28");
    assert_eq!(data["crs"], "EPSG:2056");
    assert_eq!(data["maxZoom"], 28);
    assert_eq!(data["width"], 480000.0);
    assert_eq!(data["height"], 320000.0);

    let levels = data["zoomLevels"].as_array().unwrap();
    assert_eq!(levels.len(), 29);
    assert_eq!(levels[28]["maxCols"], 18750.0);
    assert_eq!(levels[28]["maxRows"], 12500.0);
}

#[tokio::test]
async fn test_metrics_route_requires_recorder() {
    let (status, _) = get(app(config(GridName::Swisstopo28)), "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Tile bounding boxes
// ============================================================================

#[tokio::test]
async fn test_tile_bbox() {
    let (status, body) = get(app(config(GridName::Swisstopo28)), "/tiles/28/4570/7650").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "data": {
                "zoom": 28,
                "col": 4570,
                "row": 7650,
                "bbox": [2536992.0, 1154134.4, 2537017.6, 1154160.0]
            }
        })
    );
}

#[tokio::test]
async fn test_unsupported_zoom() {
    let app = app(config(GridName::Swisstopo28));

    for uri in ["/tiles/129/4570/7650", "/tiles/-1/0/0"] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            body["detail"],
            "Error: Unsupported zoom level. Please choose between 0 and 28."
        );
    }
}

#[tokio::test]
async fn test_invalid_column_and_row() {
    let app = app(config(GridName::Swisstopo28));

    let (status, body) = get(app.clone(), "/tiles/28/20000/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Error: Invalid column index. Please choose between 0 and 18750."
    );
    assert_eq!(body["code"], "TileOutOfRange");

    let (status, body) = get(app, "/tiles/28/0/-3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Error: Invalid row index. Please choose between 0 and 12500."
    );
}

#[tokio::test]
async fn test_non_numeric_path_is_bad_request() {
    let (status, body) = get(app(config(GridName::Swisstopo28)), "/tiles/abc/0/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidParameterValue");
}

// ============================================================================
// WMS requests
// ============================================================================

#[tokio::test]
async fn test_tile_wms_request() {
    let (status, body) = get(
        app(config(GridName::Swisstopo28)),
        "/tiles/28/4570/7650/wms?layers=a,b&gutter=20",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["zoom"], 28);
    assert_eq!(data["params"]["LAYERS"], "a,b");
    assert_eq!(data["params"]["WIDTH"], "296");
    assert_eq!(data["params"]["HEIGHT"], "296");
    assert_eq!(data["params"]["FORMAT"], "image/png");
    assert_eq!(data["params"]["TRANSPARENT"], "true");
    assert_eq!(data["params"]["CRS"], "EPSG:2056");
    assert_eq!(
        data["params"]["BBOX"],
        "2536992,1154134.4,2537017.6,1154160"
    );

    let url = data["url"].as_str().unwrap();
    assert!(url.starts_with("https://wms.example.org/wms?SERVICE=WMS&VERSION=1.3.0&REQUEST=GetMap&"));
    assert!(url.ends_with("&BBOX=2536992,1154134.4,2537017.6,1154160"));
}

#[tokio::test]
async fn test_tile_wms_uses_default_layers() {
    let (_, body) = get(app(config(GridName::Swisstopo28)), "/tiles/20/10/10/wms").await;
    assert_eq!(body["data"]["params"]["LAYERS"], "fonds_geo_osm_bdcad_couleur");
    assert_eq!(body["data"]["params"]["WIDTH"], "256");
}

#[tokio::test]
async fn test_tile_wms_expand_gutter() {
    // Lausanne zoom 5 is 1 m per pixel, so 20 px of gutter is 20 m per side
    let (status, body) = get(
        app(config(GridName::Lausanne05)),
        "/tiles/5/464/761/wms?gutter=20&gutter_policy=expand&format=jpeg",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let params = &body["data"]["params"];
    assert_eq!(params["BBOX"], "2538764,1154908,2539060,1155204");
    assert_eq!(params["FORMAT"], "image/jpeg");
    assert_eq!(params["TRANSPARENT"], "false");
    assert_eq!(body["data"]["bbox"], json!([2538784.0, 1154928.0, 2539040.0, 1155184.0]));
}

#[tokio::test]
async fn test_oversized_gutter_keeps_full_width() {
    let (status, body) = get(
        app(config(GridName::Swisstopo28)),
        "/tiles/28/4570/7650/wms?gutter=4294967295",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["params"]["WIDTH"], "8589934846");
    assert_eq!(body["data"]["params"]["HEIGHT"], "8589934846");
}

#[tokio::test]
async fn test_gutter_beyond_u32_is_rejected() {
    let (status, body) = get(
        app(config(GridName::Swisstopo28)),
        "/tiles/28/4570/7650/wms?gutter=4294967296",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidParameterValue");
}

#[tokio::test]
async fn test_backend_with_query_string() {
    let mut config = config(GridName::Swisstopo28);
    config.backend_url = "https://wms.example.org/mapserv_proxy?ogcserver=main".to_string();

    let (_, body) = get(app(config), "/tiles/0/0/0/wms").await;
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("https://wms.example.org/mapserv_proxy?ogcserver=main&SERVICE=WMS&"));
}

// ============================================================================
// Coordinate lookup and covering
// ============================================================================

#[tokio::test]
async fn test_locate() {
    let (status, body) = get(
        app(config(GridName::Lausanne05)),
        "/locate/7?x=2538817&y=1163422",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["col"], 1856);
    assert_eq!(body["data"]["row"], 2915);
    assert!(body["data"]["url"].as_str().unwrap().starts_with(BACKEND));
}

#[tokio::test]
async fn test_locate_missing_and_invalid_coordinates() {
    let app = app(config(GridName::Lausanne05));

    let (status, body) = get(app.clone(), "/locate/7?y=1163422").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Error: Missing required parameter: x");
    assert_eq!(body["code"], "MissingParameterValue");

    let (status, body) = get(app.clone(), "/locate/7?x=east&y=1163422").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "InvalidParameterValue");

    // Outside the grid extent
    let (status, body) = get(app, "/locate/7?x=2000000&y=1163422").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "TileOutOfRange");
}

#[tokio::test]
async fn test_locate_far_away_coordinates() {
    let app = app(config(GridName::Swisstopo28));

    for uri in [
        "/locate/28?x=1e300&y=1200000",
        "/locate/28?x=-1e300&y=1200000",
        "/locate/28?x=2500000&y=1e300",
        "/locate/28?x=2500000&y=-1e300",
    ] {
        let (status, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "TileOutOfRange", "{uri}");
    }
}

#[tokio::test]
async fn test_cover() {
    let (status, body) = get(
        app(config(GridName::Lausanne05)),
        "/cover/5?bbox=2539000,1154000,2540000,1155000",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["bbox"],
        json!([2538784.0, 1153904.0, 2540064.0, 1155184.0])
    );
    assert_eq!(
        body["data"]["image"],
        json!([2539000.0, 1154000.0, 2540000.0, 1155000.0])
    );
}

#[tokio::test]
async fn test_cover_rejects_bad_bbox() {
    let app = app(config(GridName::Lausanne05));

    let (status, body) = get(app.clone(), "/cover/5?bbox=1,2,3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Error: Invalid BBOX"));

    let (status, body) = get(app, "/cover/5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Error: Missing required parameter: bbox");
}

// ============================================================================
// Zoom table import
// ============================================================================

const TWO_LEVEL_MATRIX_SET: &str = r#"<Capabilities xmlns="http://www.opengis.net/wmts/1.0">
  <Contents>
    <TileMatrixSet>
      <TileMatrix>
        <ScaleDenominator>14285714.285714287</ScaleDenominator>
        <MatrixWidth>1</MatrixWidth>
        <MatrixHeight>1</MatrixHeight>
      </TileMatrix>
      <TileMatrix>
        <ScaleDenominator>357.14285714285717</ScaleDenominator>
        <MatrixWidth>18750</MatrixWidth>
        <MatrixHeight>12500</MatrixHeight>
      </TileMatrix>
    </TileMatrixSet>
  </Contents>
</Capabilities>"#;

#[tokio::test]
async fn test_zoom_table_from_tile_matrix_set() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TWO_LEVEL_MATRIX_SET.as_bytes()).unwrap();

    let mut config = config(GridName::Swisstopo28);
    config.tile_matrix_set_xml = Some(file.path().to_path_buf());
    let app = app(config);

    let (status, body) = get(app.clone(), "/tiles/1/4570/7650").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["bbox"],
        json!([2536992.0, 1154134.4, 2537017.6, 1154160.0])
    );

    let (status, body) = get(app, "/tiles/2/0/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["detail"],
        "Error: Unsupported zoom level. Please choose between 0 and 1."
    );
}

#[test]
fn test_missing_tile_matrix_set_file() {
    let mut config = config(GridName::Swisstopo28);
    config.tile_matrix_set_xml = Some("/nonexistent/capabilities.xml".into());

    assert!(matches!(
        AppState::from_config(config),
        Err(ConfigError::Io { .. })
    ));
}
