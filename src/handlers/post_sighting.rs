use axum::{Extension, Json, http::StatusCode};
use time::OffsetDateTime;

use crate::{
    handlers::{ApiError, api_error},
    ingest::{IngestCoordinator, IngestOutcome},
    models::{SightingRequest, SightingResponse},
    sources::{LocationFix, SightingEvent},
};

/// Scan adapter over HTTP. A request may carry its own fix; without one the
/// coordinator asks the configured location source.
pub async fn post_sighting_handler(
    Extension(coordinator): Extension<IngestCoordinator>,
    Json(req): Json<SightingRequest>,
) -> Result<(StatusCode, Json<SightingResponse>), ApiError> {
    let event = SightingEvent {
        mac_address: req.mac_address,
        observed_at: req.observed_at.unwrap_or_else(OffsetDateTime::now_utc),
    };

    let outcome = match (req.latitude, req.longitude) {
        (Some(latitude), Some(longitude)) => {
            coordinator
                .ingest_with_fix(event, Some(LocationFix::new(latitude, longitude)))
                .await?
        }
        (None, None) => coordinator.ingest(event).await?,
        _ => {
            return Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "latitude and longitude must be given together",
            ));
        }
    };

    Ok(match outcome {
        IngestOutcome::Recorded {
            mac_address,
            location,
        } => (
            StatusCode::ACCEPTED,
            Json(SightingResponse {
                status: "recorded".to_string(),
                mac_address: Some(mac_address.to_string()),
                location: Some(location),
            }),
        ),
        IngestOutcome::Skipped => (
            StatusCode::OK,
            Json(SightingResponse {
                status: "skipped".to_string(),
                mac_address: None,
                location: None,
            }),
        ),
    })
}
