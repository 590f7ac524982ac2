use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::handlers::{
    feed_handler, list_detections_handler, list_devices_handler, post_sighting_handler,
    purge_device_handler, summary_handler,
};

pub struct App;

impl App {
    pub fn new() -> Self {
        Self
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(|| async { "tailgate" }))
            .route("/api/sightings", post(post_sighting_handler))
            .route("/api/devices", get(list_devices_handler))
            .route("/api/devices/{mac}", delete(purge_device_handler))
            .route("/api/devices/{mac}/detections", get(list_detections_handler))
            .route("/api/summary", get(summary_handler))
            .route("/api/feed", get(feed_handler))
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
