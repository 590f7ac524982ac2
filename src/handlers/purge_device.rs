use axum::{Extension, extract::Path, http::StatusCode};
use tracing::info;

use crate::{
    feed::LiveFeed,
    handlers::{ApiError, api_error},
    models::MacAddress,
    repositories::detection::DetectionRepo,
};

pub async fn purge_device_handler(
    Path(mac): Path<String>,
    Extension(repo): Extension<DetectionRepo>,
    Extension(feed): Extension<LiveFeed>,
) -> Result<StatusCode, ApiError> {
    let mac = MacAddress::parse(&mac)?;

    if !repo.purge_device(mac.as_str()).await? {
        info!(msg = "Device not found", %mac);
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Device {} not found", mac),
        ));
    }

    feed.notify_changed();
    info!(msg = "Purged device", %mac);

    Ok(StatusCode::NO_CONTENT)
}
