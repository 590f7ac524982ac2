use axum::{Json, http::StatusCode};

use crate::{error::TrackerError, models::ErrorResponse};

pub mod feed;
pub mod list_detections;
pub mod list_devices;
pub mod post_sighting;
pub mod purge_device;
pub mod summary;

pub use feed::feed_handler;
pub use list_detections::list_detections_handler;
pub use list_devices::list_devices_handler;
pub use post_sighting::post_sighting_handler;
pub use purge_device::purge_device_handler;
pub use summary::summary_handler;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            status: status.as_u16(),
            error: error.into(),
        }),
    )
}

impl From<TrackerError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: TrackerError) -> Self {
        let status = match &err {
            e if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            TrackerError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, err.to_string())
    }
}
