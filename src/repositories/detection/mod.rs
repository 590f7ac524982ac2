use async_trait::async_trait;
use mockall::automock;
use time::OffsetDateTime;

use crate::{
    error::Result,
    models::{Detection, Device, DeviceLocationSummary},
};

pub mod sqlite;
pub use sqlite::SqliteDetectionRepo;

#[async_trait]
#[automock]
pub trait DetectionRepository: Send + Sync {
    /// Insert a device if it is not already known. Repeated calls are no-ops.
    async fn upsert_device(&self, mac: &str) -> Result<()>;

    /// Append a detection. Fails with `ForeignKeyViolation` if the device row
    /// does not exist.
    async fn insert_detection(&self, mac: &str, location: &str, time: OffsetDateTime)
    -> Result<()>;

    /// Upsert the device and append its detection in one transaction
    async fn record_detection(&self, mac: &str, location: &str, time: OffsetDateTime)
    -> Result<()>;

    /// List all devices, ordered by MAC address
    async fn list_devices(&self) -> Result<Vec<Device>>;

    /// List the detections of one device, oldest first
    async fn list_detections(&self, mac: &str) -> Result<Vec<Detection>>;

    /// Devices seen at more than one distinct location, most locations first,
    /// ties ordered by MAC address
    async fn summarize_multi_location_devices(&self) -> Result<Vec<DeviceLocationSummary>>;

    /// Delete a device and, through the cascade, all of its detections.
    /// Returns whether the device existed.
    async fn purge_device(&self, mac: &str) -> Result<bool>;
}

pub type DetectionRepo = std::sync::Arc<dyn DetectionRepository + Send + Sync>;
