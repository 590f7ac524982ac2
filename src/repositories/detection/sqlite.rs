use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;
use tracing::instrument;

use crate::{
    error::{Result, TrackerError},
    models::{Detection, Device, DeviceLocationSummary, MacAddress},
};

use super::DetectionRepository;

const UPSERT_DEVICE: &str =
    "INSERT INTO devices (mac_address) VALUES (?) ON CONFLICT (mac_address) DO NOTHING";

const INSERT_DETECTION: &str =
    "INSERT INTO detections (device_mac_address, location, time) VALUES (?, ?, ?)";

#[derive(FromRow)]
struct DetectionRecord {
    id: i64,
    device_mac_address: String,
    location: String,
    time: i64,
}

#[derive(FromRow)]
struct SummaryRecord {
    mac_address: String,
    location_count: i64,
    locations: String,
}

pub struct SqliteDetectionRepo(Arc<SqlitePool>);

impl SqliteDetectionRepo {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self(pool)
    }
}

fn to_millis(time: OffsetDateTime) -> i64 {
    (time.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(millis: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .map_err(|e| TrackerError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[async_trait]
impl DetectionRepository for SqliteDetectionRepo {
    #[instrument(name = "sqlite_detection_repo.upsert_device", skip(self))]
    async fn upsert_device(&self, mac: &str) -> Result<()> {
        let mac = MacAddress::parse(mac)?;
        let mac = mac.as_str();

        sqlx::query(UPSERT_DEVICE)
            .bind(mac)
            .execute(&*self.0)
            .await
            .map_err(|e| TrackerError::from_sqlx(e, Some(mac)))?;

        Ok(())
    }

    #[instrument(name = "sqlite_detection_repo.insert_detection", skip(self))]
    async fn insert_detection(
        &self,
        mac: &str,
        location: &str,
        time: OffsetDateTime,
    ) -> Result<()> {
        let mac = MacAddress::parse(mac)?;
        let mac = mac.as_str();

        sqlx::query(INSERT_DETECTION)
            .bind(mac)
            .bind(location)
            .bind(to_millis(time))
            .execute(&*self.0)
            .await
            .map_err(|e| TrackerError::from_sqlx(e, Some(mac)))?;

        Ok(())
    }

    #[instrument(name = "sqlite_detection_repo.record_detection", skip(self))]
    async fn record_detection(
        &self,
        mac: &str,
        location: &str,
        time: OffsetDateTime,
    ) -> Result<()> {
        let mac = MacAddress::parse(mac)?;
        let mac = mac.as_str();
        let classify = |e: sqlx::Error| TrackerError::from_sqlx(e, Some(mac));

        // Dropping the transaction on any early return rolls both writes back
        let mut tx = self.0.begin().await.map_err(classify)?;

        sqlx::query(UPSERT_DEVICE)
            .bind(mac)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        sqlx::query(INSERT_DETECTION)
            .bind(mac)
            .bind(location)
            .bind(to_millis(time))
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await.map_err(classify)?;

        Ok(())
    }

    #[instrument(name = "sqlite_detection_repo.list_devices", skip(self))]
    async fn list_devices(&self) -> Result<Vec<Device>> {
        let devices = sqlx::query_scalar::<_, String>(
            "SELECT mac_address FROM devices ORDER BY mac_address ASC",
        )
        .fetch_all(&*self.0)
        .await?
        .into_iter()
        .map(|mac_address| Device { mac_address })
        .collect();

        Ok(devices)
    }

    #[instrument(name = "sqlite_detection_repo.list_detections", skip(self))]
    async fn list_detections(&self, mac: &str) -> Result<Vec<Detection>> {
        sqlx::query_as::<_, DetectionRecord>(
            r#"
            SELECT id, device_mac_address, location, time
            FROM detections
            WHERE device_mac_address = ?
            ORDER BY time, id
            "#,
        )
        .bind(mac)
        .fetch_all(&*self.0)
        .await?
        .into_iter()
        .map(|record| {
            Ok(Detection {
                id: record.id,
                device_mac_address: record.device_mac_address,
                location: record.location,
                time: from_millis(record.time)?,
            })
        })
        .collect()
    }

    #[instrument(name = "sqlite_detection_repo.summarize_multi_location_devices", skip(self))]
    async fn summarize_multi_location_devices(&self) -> Result<Vec<DeviceLocationSummary>> {
        // Counting DISTINCT location keeps repeated pings at one spot from
        // inflating the count
        Ok(sqlx::query_as::<_, SummaryRecord>(
            r#"
            SELECT
                device_mac_address AS mac_address,
                COUNT(DISTINCT location) AS location_count,
                GROUP_CONCAT(DISTINCT location) AS locations
            FROM detections
            GROUP BY device_mac_address
            HAVING COUNT(DISTINCT location) > 1
            ORDER BY location_count DESC, device_mac_address ASC
            "#,
        )
        .fetch_all(&*self.0)
        .await?
        .into_iter()
        .map(|record| {
            // Geohash characters never include ',', so splitting is lossless
            let mut locations: Vec<String> =
                record.locations.split(',').map(str::to_string).collect();
            locations.sort_unstable();

            DeviceLocationSummary {
                mac_address: record.mac_address,
                distinct_location_count: record.location_count,
                locations,
            }
        })
        .collect())
    }

    #[instrument(name = "sqlite_detection_repo.purge_device", skip(self))]
    async fn purge_device(&self, mac: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE mac_address = ?")
            .bind(mac)
            .execute(&*self.0)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
