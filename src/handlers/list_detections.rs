use axum::{Extension, Json, extract::Path};
use tracing::info;

use crate::{
    handlers::ApiError,
    models::{Detection, MacAddress},
    repositories::detection::DetectionRepo,
};

pub async fn list_detections_handler(
    Path(mac): Path<String>,
    Extension(repo): Extension<DetectionRepo>,
) -> Result<Json<Vec<Detection>>, ApiError> {
    let mac = MacAddress::parse(&mac)?;
    let detections = repo.list_detections(mac.as_str()).await?;

    info!(
        msg = "Fetched detections",
        %mac,
        count = detections.len(),
    );

    Ok(Json(detections))
}
