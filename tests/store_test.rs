//! Durability tests for the file-backed store

use std::sync::Arc;

use gsmaster::store::{testing::ManualClock, Store};
use gsmaster::validate::Registration;

fn registration(name: &str, port: u16) -> Registration {
    Registration {
        name: name.to_string(),
        info: "Bar".to_string(),
        port,
        protocol: 3,
    }
}

#[tokio::test]
async fn test_on_disk_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("servers.ini");
    let store = Store::open(&path, 360, Arc::new(ManualClock::new(100)));

    store
        .upsert("1.2.3.4:27000", registration("Foo", 27000))
        .await
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[1.2.3.4:27000]"));
    assert!(text.contains("time = 100"));
    assert!(text.contains("name = Foo"));
    assert!(text.contains("info = Bar"));
    assert!(text.contains("protocol = 3"));
}

#[tokio::test]
async fn test_no_stray_temp_file_after_write() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("servers.ini");
    let store = Store::open(&path, 360, Arc::new(ManualClock::new(0)));

    store
        .upsert("1.2.3.4:27000", registration("Foo", 27000))
        .await
        .unwrap();

    let names: Vec<_> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(names, vec!["servers.ini"]);
}

#[tokio::test]
async fn test_corrupt_section_does_not_poison_the_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("servers.ini");
    std::fs::write(
        &path,
        "[1.2.3.4:27000]\ntime = garbage\nname = Broken\ninfo = X\nprotocol = 3\n\n\
         [5.6.7.8:26000]\ntime = 10\nname = Good\ninfo = Y\nprotocol = 3\n",
    )
    .unwrap();

    let store = Store::open(&path, 360, Arc::new(ManualClock::new(20)));
    let entries = store.snapshot().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Good");
}

#[tokio::test]
async fn test_sweep_rewrites_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("servers.ini");
    let clock = Arc::new(ManualClock::new(0));
    let store = Store::open(&path, 360, clock.clone());

    store
        .upsert("1.2.3.4:27000", registration("Old", 27000))
        .await
        .unwrap();
    clock.set(300);
    store
        .upsert("5.6.7.8:26000", registration("Fresh", 26000))
        .await
        .unwrap();

    clock.set(400);
    let entries = store.snapshot().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Fresh");

    // The expired entry is physically gone, not just filtered
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("1.2.3.4:27000"));
    assert!(text.contains("5.6.7.8:26000"));
}

#[tokio::test]
async fn test_unreadable_state_fails_the_request() {
    let tmp = tempfile::tempdir().unwrap();
    // Point at a directory: read_to_string fails with something other
    // than NotFound, which must surface instead of wiping the store.
    let store = Store::open(tmp.path(), 360, Arc::new(ManualClock::new(0)));

    assert!(store.snapshot().await.is_err());
    assert!(store
        .upsert("1.2.3.4:27000", registration("Foo", 27000))
        .await
        .is_err());
}
