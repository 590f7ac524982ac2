//! Turns raw sightings into persisted detections.

use std::{sync::Arc, time::Duration};

use time::OffsetDateTime;
use tokio::{sync::mpsc, task::JoinSet, time::timeout};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    error::Result,
    feed::LiveFeed,
    geohash::{self, PRECISION},
    models::MacAddress,
    repositories::detection::DetectionRepo,
    sources::{LocationFix, LocationSource, SightingEvent},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    Recorded {
        mac_address: MacAddress,
        location: String,
    },
    /// No position fix was available
    Skipped,
}

#[derive(Clone)]
pub struct IngestCoordinator {
    repo: DetectionRepo,
    locations: Arc<dyn LocationSource>,
    feed: LiveFeed,
    location_timeout: Duration,
}

impl IngestCoordinator {
    pub fn new(
        repo: DetectionRepo,
        locations: Arc<dyn LocationSource>,
        feed: LiveFeed,
        location_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            locations,
            feed,
            location_timeout,
        }
    }

    /// Ingest a sighting, asking the location source for a fix.
    pub async fn ingest(&self, event: SightingEvent) -> Result<IngestOutcome> {
        let mac = MacAddress::parse(&event.mac_address)?;
        let fix = self.resolve_location().await;
        self.record(mac, event.observed_at, fix).await
    }

    /// Ingest a sighting whose adapter already resolved (or failed to resolve)
    /// a fix.
    pub async fn ingest_with_fix(
        &self,
        event: SightingEvent,
        fix: Option<LocationFix>,
    ) -> Result<IngestOutcome> {
        let mac = MacAddress::parse(&event.mac_address)?;
        self.record(mac, event.observed_at, fix).await
    }

    async fn resolve_location(&self) -> Option<LocationFix> {
        match timeout(self.location_timeout, self.locations.current_location()).await {
            Ok(Ok(fix)) => fix,
            Ok(Err(e)) => {
                warn!(msg = "Location lookup failed", error = %e);
                None
            }
            Err(_) => {
                warn!(
                    msg = "Location lookup timed out",
                    timeout_ms = self.location_timeout.as_millis() as u64
                );
                None
            }
        }
    }

    #[instrument(name = "ingest.record", skip_all, fields(mac = %mac))]
    async fn record(
        &self,
        mac: MacAddress,
        observed_at: OffsetDateTime,
        fix: Option<LocationFix>,
    ) -> Result<IngestOutcome> {
        let Some(fix) = fix else {
            debug!(msg = "No location fix, skipping sighting");
            return Ok(IngestOutcome::Skipped);
        };

        let location = geohash::encode(fix.latitude, fix.longitude, PRECISION)?;

        self.repo
            .record_detection(mac.as_str(), &location, observed_at)
            .await?;
        self.feed.notify_changed();

        info!(msg = "Recorded detection", %location);

        Ok(IngestOutcome::Recorded {
            mac_address: mac,
            location,
        })
    }

    /// Handle one sighting, logging rather than returning failures.
    pub async fn handle(&self, event: SightingEvent) {
        match self.ingest(event).await {
            Ok(_) => {}
            Err(e) if e.is_input_error() => {
                warn!(msg = "Rejected sighting", error = %e);
            }
            Err(e) => {
                error!(msg = "Failed to record sighting", error = %e);
            }
        }
    }

    /// Drain a queue of sightings until every sender is gone. Each sighting
    /// runs as its own task so slow location lookups overlap.
    pub async fn run(self, mut sightings: mpsc::Receiver<SightingEvent>) {
        let mut tasks = JoinSet::new();

        while let Some(event) = sightings.recv().await {
            let coordinator = self.clone();
            tasks.spawn(async move { coordinator.handle(event).await });

            // Reap finished tasks so the set does not grow unbounded
            while tasks.try_join_next().is_some() {}
        }

        while tasks.join_next().await.is_some() {}
        info!(msg = "Sighting queue closed");
    }
}
