use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use mockall::predicate;
use tailgate_server::{
    error::TrackerError,
    feed::LiveFeed,
    geohash::{PRECISION, encode},
    ingest::{IngestCoordinator, IngestOutcome},
    models::MacAddress,
    repositories::detection::DetectionRepository,
    sources::{LocationFix, MockLocationSource, NoLocationSource, SightingEvent, StaticLocationSource},
};

use super::{feed_for, mock_repo, sqlite_repo};

const TIMEOUT: Duration = Duration::from_millis(100);

#[tokio::test]
async fn skipped_without_fix_writes_nothing() {
    let mut repo = mock_repo();
    repo.expect_record_detection().times(0);
    repo.expect_upsert_device().times(0);
    repo.expect_insert_detection().times(0);

    let (repo, feed) = feed_for(repo).await;
    let mut rx = feed.watch();
    rx.borrow_and_update();

    let coordinator = IngestCoordinator::new(repo, Arc::new(NoLocationSource), feed, TIMEOUT);

    let outcome = coordinator
        .ingest(SightingEvent::now("AA:BB:CC:DD:EE:FF"))
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);

    let outcome = coordinator
        .ingest_with_fix(SightingEvent::now("AA:BB:CC:DD:EE:FF"), None)
        .await
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn skipped_when_location_lookup_fails() {
    let mut locations = MockLocationSource::new();
    locations
        .expect_current_location()
        .times(1)
        .returning(|| Box::pin(async { Err(anyhow!("permission denied")) }));

    let mut repo = mock_repo();
    repo.expect_record_detection().times(0);
    let (repo, feed) = feed_for(repo).await;

    let coordinator = IngestCoordinator::new(repo, Arc::new(locations), feed, TIMEOUT);

    let outcome = coordinator.ingest(SightingEvent::now("AA:BB")).await.unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);
}

#[tokio::test]
async fn skipped_when_location_lookup_times_out() {
    let mut locations = MockLocationSource::new();
    locations
        .expect_current_location()
        .times(1)
        .returning(|| Box::pin(std::future::pending::<anyhow::Result<Option<LocationFix>>>()));

    let mut repo = mock_repo();
    repo.expect_record_detection().times(0);
    let (repo, feed) = feed_for(repo).await;

    let coordinator = IngestCoordinator::new(repo, Arc::new(locations), feed, TIMEOUT);

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        coordinator.ingest(SightingEvent::now("AA:BB")),
    )
    .await
    .expect("ingest must not wait past the location timeout")
    .unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);
}

#[tokio::test]
async fn recorded_with_normalized_mac_and_geohash() {
    let (_pool, repo) = sqlite_repo().await;
    let feed = LiveFeed::start(repo.clone()).await;
    let fix = LocationFix::new(57.64911, 10.40744);

    let coordinator = IngestCoordinator::new(
        repo.clone(),
        Arc::new(StaticLocationSource(fix)),
        feed,
        TIMEOUT,
    );

    let outcome = coordinator
        .ingest(SightingEvent::now("  aa:bb:cc:dd:ee:ff "))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        IngestOutcome::Recorded {
            mac_address: MacAddress::parse("AA:BB:CC:DD:EE:FF").unwrap(),
            location: "u4pruydqqvj".to_string(),
        }
    );

    let devices = repo.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].mac_address, "AA:BB:CC:DD:EE:FF");

    let detections = repo.list_detections("AA:BB:CC:DD:EE:FF").await.unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].location, encode(57.64911, 10.40744, PRECISION).unwrap());
}

#[tokio::test]
async fn error_invalid_coordinate() {
    let mut repo = mock_repo();
    repo.expect_record_detection().times(0);
    let (repo, feed) = feed_for(repo).await;

    let coordinator = IngestCoordinator::new(repo, Arc::new(NoLocationSource), feed, TIMEOUT);

    let result = coordinator
        .ingest_with_fix(SightingEvent::now("AA:BB"), Some(LocationFix::new(91.0, 0.0)))
        .await;

    assert!(matches!(result, Err(TrackerError::InvalidCoordinate { .. })));
}

#[tokio::test]
async fn error_invalid_mac_skips_location_lookup() {
    let mut locations = MockLocationSource::new();
    locations.expect_current_location().times(0);

    let mut repo = mock_repo();
    repo.expect_record_detection().times(0);
    let (repo, feed) = feed_for(repo).await;

    let coordinator = IngestCoordinator::new(repo, Arc::new(locations), feed, TIMEOUT);

    let result = coordinator.ingest(SightingEvent::now("   ")).await;
    assert!(matches!(result, Err(TrackerError::InvalidMacAddress(_))));
}

#[tokio::test]
async fn error_store_failure_is_returned() {
    let mut repo = mock_repo();
    repo.expect_record_detection()
        .with(
            predicate::eq("AA:BB"),
            predicate::always(),
            predicate::always(),
        )
        .times(1)
        .returning(|mac, _, _| {
            let mac = mac.to_string();
            Box::pin(async move { Err(TrackerError::ForeignKeyViolation(mac)) })
        });
    let (repo, feed) = feed_for(repo).await;
    let mut rx = feed.watch();
    rx.borrow_and_update();

    let coordinator = IngestCoordinator::new(repo, Arc::new(NoLocationSource), feed, TIMEOUT);

    let result = coordinator
        .ingest_with_fix(SightingEvent::now("AA:BB"), Some(LocationFix::new(10.0, 10.0)))
        .await;

    assert!(matches!(result, Err(TrackerError::ForeignKeyViolation(ref mac)) if mac == "AA:BB"));

    // A failed write publishes nothing
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!rx.has_changed().unwrap());
}
