//! Error type for proxy requests and its HTTP rendering.

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use wmts_common::{BboxParseError, TileGridError};

use crate::metrics;

#[derive(Debug, Error)]
pub enum WmtsError {
    #[error(transparent)]
    Tile(#[from] TileGridError),

    #[error("Invalid BBOX: {0}")]
    Bbox(#[from] BboxParseError),

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl WmtsError {
    /// OGC exception code for this error.
    pub fn exception_code(&self) -> &'static str {
        match self {
            WmtsError::Tile(TileGridError::UnsupportedZoom { .. }) => "InvalidParameterValue",
            WmtsError::Tile(_) => "TileOutOfRange",
            WmtsError::Bbox(_) | WmtsError::InvalidParameter { .. } => "InvalidParameterValue",
            WmtsError::MissingParameter(_) => "MissingParameterValue",
            WmtsError::Internal(_) => "NoApplicableCode",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            WmtsError::Tile(_)
            | WmtsError::Bbox(_)
            | WmtsError::MissingParameter(_)
            | WmtsError::InvalidParameter { .. } => 400,
            WmtsError::Internal(_) => 500,
        }
    }

    /// Metric label for the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            WmtsError::Tile(err) => err.kind(),
            WmtsError::Bbox(_) => "invalid_bbox",
            WmtsError::MissingParameter(_) => "missing_parameter",
            WmtsError::InvalidParameter { .. } => "invalid_parameter",
            WmtsError::Internal(_) => "internal",
        }
    }
}

impl From<PathRejection> for WmtsError {
    fn from(rejection: PathRejection) -> Self {
        WmtsError::InvalidParameter {
            param: "path".to_string(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for WmtsError {
    fn from(rejection: QueryRejection) -> Self {
        WmtsError::InvalidParameter {
            param: "query".to_string(),
            message: rejection.body_text(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: &'static str,
}

impl IntoResponse for WmtsError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "Rejected request");
        }
        metrics::record_error(self.kind());

        let body = ErrorBody {
            detail: format!("Error: {}", self),
            code: self.exception_code(),
        };
        (status, Json(body)).into_response()
    }
}
