use tailgate_server::repositories::detection::DetectionRepository;

use super::setup;

#[tokio::test]
async fn success_sorted_by_mac() {
    let (_pool, repo) = setup().await;

    for mac in ["CC:DD", "AA:BB", "BB:CC"] {
        repo.upsert_device(mac).await.unwrap();
    }

    let list = repo.list_devices().await.unwrap();

    assert_eq!(list.len(), 3);
    assert_eq!(list[0].mac_address, "AA:BB");
    assert_eq!(list[1].mac_address, "BB:CC");
    assert_eq!(list[2].mac_address, "CC:DD");
}

#[tokio::test]
async fn success_empty_table() {
    let (_pool, repo) = setup().await;

    let list = repo.list_devices().await.unwrap();
    assert!(list.is_empty());
}
