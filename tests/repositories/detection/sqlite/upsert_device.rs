use tailgate_server::{error::TrackerError, repositories::detection::DetectionRepository};

use super::setup;

#[tokio::test]
async fn success_new_device() {
    let (pool, repo) = setup().await;

    repo.upsert_device("AA:BB:CC:DD:EE:FF").await.unwrap();

    let macs: Vec<String> = sqlx::query_scalar("SELECT mac_address FROM devices")
        .fetch_all(&pool)
        .await
        .unwrap();

    assert_eq!(macs, vec!["AA:BB:CC:DD:EE:FF".to_string()]);
}

#[tokio::test]
async fn success_duplicate_is_ignored() {
    let (pool, repo) = setup().await;

    repo.upsert_device("AA:BB:CC:DD:EE:FF").await.unwrap();
    let result = repo.upsert_device("AA:BB:CC:DD:EE:FF").await;
    assert!(result.is_ok());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn success_duplicate_keeps_existing_detections() {
    let (pool, repo) = setup().await;

    repo.upsert_device("AA:BB").await.unwrap();
    sqlx::query("INSERT INTO detections (device_mac_address, location, time) VALUES (?, ?, ?)")
        .bind("AA:BB")
        .bind("s1z0gs3y0zh")
        .bind(1_700_000_000_000_i64)
        .execute(&pool)
        .await
        .unwrap();

    repo.upsert_device("AA:BB").await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM detections")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn success_mixed_case_is_one_device() {
    let (_pool, repo) = setup().await;

    repo.upsert_device("aa:bb").await.unwrap();
    repo.upsert_device("AA:BB").await.unwrap();
    repo.upsert_device(" Aa:bB ").await.unwrap();

    let devices = repo.list_devices().await.unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].mac_address, "AA:BB");
}

#[tokio::test]
async fn success_existing_lowercase_row_is_reused() {
    let (pool, repo) = setup().await;

    // Rows written before normalization keep their casing
    sqlx::query("INSERT INTO devices (mac_address) VALUES (?)")
        .bind("aa:bb")
        .execute(&pool)
        .await
        .unwrap();

    repo.upsert_device("AA:BB").await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn failure_blank_mac() {
    let (pool, repo) = setup().await;

    let result = repo.upsert_device("   ").await;

    assert!(matches!(result, Err(TrackerError::InvalidMacAddress(_))));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count, 0);
}
