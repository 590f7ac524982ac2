use std::time::Duration;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};
use tracing::info;

use crate::error::Result;

pub async fn connect(path: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                // A returned write has reached disk
                .synchronous(SqliteSynchronous::Full)
                .busy_timeout(Duration::from_secs(5)),
        )
        .await?;

    Ok(pool)
}

pub async fn apply_migrations(pool: &SqlitePool) -> Result<()> {
    let before_count: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        Err(sqlx::Error::Database(_)) => 0,
        Err(e) => return Err(e.into()),
    };

    sqlx::migrate!("./migrations").run(pool).await?;

    let after_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    let limit = after_count - before_count;

    let new_migrations: Vec<(i64, String)> = sqlx::query_as(
        "SELECT version, description FROM _sqlx_migrations ORDER BY version DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    for (version, description) in new_migrations {
        info!(
            msg = "Applied database migration",
            version = %version,
            description = %description,
        );
    }

    Ok(())
}
