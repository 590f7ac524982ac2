use axum::{Extension, middleware::AddExtension};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower::Layer;

use crate::repositories::detection::{DetectionRepo, SqliteDetectionRepo};

#[derive(Clone)]
pub struct DetectionRepoLayer(pub DetectionRepo);

impl DetectionRepoLayer {
    pub fn sqlite(pool: Arc<SqlitePool>) -> Self {
        Self(Arc::new(SqliteDetectionRepo::new(pool)))
    }
}

impl<S> Layer<S> for DetectionRepoLayer {
    type Service = AddExtension<S, DetectionRepo>;

    fn layer(&self, inner: S) -> Self::Service {
        Extension(self.0.clone()).layer(inner)
    }
}
