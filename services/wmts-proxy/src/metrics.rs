//! Request counters exported through the Prometheus recorder.

use ::metrics::{counter, describe_counter};

pub const TILE_REQUESTS_TOTAL: &str = "wmts_tile_requests_total";
pub const TILE_ERRORS_TOTAL: &str = "wmts_tile_errors_total";

/// Register metric descriptions with the installed recorder.
pub fn describe() {
    describe_counter!(TILE_REQUESTS_TOTAL, "Tile lookups by endpoint");
    describe_counter!(TILE_ERRORS_TOTAL, "Rejected or failed tile lookups by error kind");
}

pub fn record_request(endpoint: &'static str) {
    counter!(TILE_REQUESTS_TOTAL, "endpoint" => endpoint).increment(1);
}

pub fn record_error(kind: &'static str) {
    counter!(TILE_ERRORS_TOTAL, "kind" => kind).increment(1);
}
