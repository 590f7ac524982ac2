use axum::{Extension, Json, http::StatusCode};

use crate::{
    feed::LiveFeed,
    handlers::{ApiError, api_error},
    models::DeviceLocationSummary,
};

/// Latest multi-location snapshot. A failed recomputation is reported as 503
/// so clients can tell it apart from an empty result.
pub async fn summary_handler(
    Extension(feed): Extension<LiveFeed>,
) -> Result<Json<Vec<DeviceLocationSummary>>, ApiError> {
    match feed.current() {
        Ok(summaries) => Ok(Json(Vec::clone(&summaries))),
        Err(e) => Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string())),
    }
}
