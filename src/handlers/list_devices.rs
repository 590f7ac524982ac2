use axum::{Extension, Json};
use tracing::error;

use crate::{handlers::ApiError, models::Device, repositories::detection::DetectionRepo};

pub async fn list_devices_handler(
    Extension(repo): Extension<DetectionRepo>,
) -> Result<Json<Vec<Device>>, ApiError> {
    let devices = repo.list_devices().await.map_err(|e| {
        error!(msg = "Failed to list devices", error = %e);
        e
    })?;

    Ok(Json(devices))
}
