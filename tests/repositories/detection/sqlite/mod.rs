use std::sync::Arc;

use sqlx::SqlitePool;
use tailgate_server::{db::apply_migrations, repositories::detection::SqliteDetectionRepo};

mod list_devices;
mod upsert_device;

async fn connect() -> anyhow::Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    apply_migrations(&pool).await?;
    Ok(pool)
}

async fn setup() -> (SqlitePool, SqliteDetectionRepo) {
    let pool = connect().await.unwrap();
    let repo = SqliteDetectionRepo::new(Arc::new(pool.clone()));
    (pool, repo)
}
