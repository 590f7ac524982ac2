use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Result, TrackerError};

/// Bluetooth hardware address, trimmed and upper-cased so the same radio
/// always maps to the same device row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(TrackerError::InvalidMacAddress(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub mac_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub id: i64,
    pub device_mac_address: String,
    pub location: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
}

/// A device seen at more than one distinct geohash cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceLocationSummary {
    pub mac_address: String,
    pub distinct_location_count: i64,
    /// Sorted, without duplicates
    pub locations: Vec<String>,
}

impl DeviceLocationSummary {
    pub fn serialized_locations(&self) -> String {
        self.locations.join(",")
    }
}

pub type Summaries = Arc<Vec<DeviceLocationSummary>>;

#[derive(Debug, Deserialize)]
pub struct SightingRequest {
    pub mac_address: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub observed_at: Option<OffsetDateTime>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SightingResponse {
    pub status: String,
    pub mac_address: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
}
