//! Input adapters for sightings and position fixes.

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};
use tracing::debug;

/// One raw observation of a device. Scanners may report the same device any
/// number of times, in any order.
#[derive(Debug, Clone)]
pub struct SightingEvent {
    pub mac_address: String,
    pub observed_at: OffsetDateTime,
}

impl SightingEvent {
    pub fn now(mac_address: impl Into<String>) -> Self {
        Self {
            mac_address: mac_address.into(),
            observed_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
#[automock]
pub trait LocationSource: Send + Sync {
    /// Best-effort current position. `Ok(None)` when no fix is available.
    /// Every call asks for a fresh fix.
    async fn current_location(&self) -> anyhow::Result<Option<LocationFix>>;
}

/// Position of a scanner that never moves.
pub struct StaticLocationSource(pub LocationFix);

#[async_trait]
impl LocationSource for StaticLocationSource {
    async fn current_location(&self) -> anyhow::Result<Option<LocationFix>> {
        Ok(Some(self.0))
    }
}

/// For deployments where every sighting carries its own fix.
pub struct NoLocationSource;

#[async_trait]
impl LocationSource for NoLocationSource {
    async fn current_location(&self) -> anyhow::Result<Option<LocationFix>> {
        Ok(None)
    }
}

/// Scan adapter for line-oriented scanner output: the first whitespace
/// separated token of each line is taken as a MAC address, the rest is
/// ignored. Returns the number of sightings queued once the input ends or the
/// queue closes.
pub async fn read_sightings<R>(
    reader: R,
    sightings: mpsc::Sender<SightingEvent>,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(mac) = line.split_whitespace().next() else {
            continue;
        };
        if sightings.send(SightingEvent::now(mac)).await.is_err() {
            debug!(msg = "Sighting queue closed, stopping reader");
            break;
        }
        count += 1;
    }

    Ok(count)
}
