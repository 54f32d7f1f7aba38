use super::*;

use chrono::TimeZone;
use shared::domain::{Block, FieldAddress, SectionType};

fn backup(device_name: &str, hour: u32, values: &[u16]) -> DeviceBackup {
    DeviceBackup {
        device_name: device_name.to_string(),
        firmware_version: "1.4.2".to_string(),
        created_at: Utc
            .with_ymd_and_hms(2026, 3, 1, hour, 0, 0)
            .single()
            .expect("timestamp"),
        entries: values
            .iter()
            .enumerate()
            .map(|(index, value)| BackupEntry {
                block: Block::Button,
                section_type: SectionType::Value,
                key: "midiId".to_string(),
                address: FieldAddress::new(Block::Button, 2, index as u16),
                value: *value,
            })
            .collect(),
    }
}

async fn temp_storage() -> (tempfile::TempDir, Storage) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}",
        dir.path()
            .join("backups.db")
            .to_string_lossy()
            .replace('\\', "/")
    );
    let storage = Storage::new(&url).await.expect("db");
    (dir, storage)
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn saved_backup_loads_back_unchanged() {
    let (_dir, storage) = temp_storage().await;
    let original = backup("Deck 32", 9, &[36, 37, 38]);

    let id = storage.save_backup("live-set", &original).await.expect("save");
    let stored = storage
        .load_backup(id)
        .await
        .expect("load")
        .expect("present");

    assert_eq!(stored.backup_id, id);
    assert_eq!(stored.name, "live-set");
    assert_eq!(stored.backup, original);
    assert_eq!(
        storage
            .load_backup_by_name("live-set")
            .await
            .expect("load by name")
            .map(|stored| stored.backup_id),
        Some(id)
    );
}

#[tokio::test]
async fn saving_under_an_existing_name_replaces_it() {
    let (_dir, storage) = temp_storage().await;
    let first = storage
        .save_backup("studio", &backup("Deck 32", 8, &[1]))
        .await
        .expect("first");
    let second = storage
        .save_backup("studio", &backup("Deck 32", 10, &[2, 3]))
        .await
        .expect("second");

    assert_eq!(first, second);
    let listed = storage.list_backups().await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].entry_count, 2);
}

#[tokio::test]
async fn lists_newest_first_and_filters_by_device() {
    let (_dir, storage) = temp_storage().await;
    storage
        .save_backup("morning", &backup("Deck 32", 8, &[1]))
        .await
        .expect("morning");
    storage
        .save_backup("evening", &backup("Deck 32", 20, &[1, 2]))
        .await
        .expect("evening");
    storage
        .save_backup("pads", &backup("Pad 16", 12, &[1]))
        .await
        .expect("pads");

    let names = storage
        .list_backups()
        .await
        .expect("list")
        .into_iter()
        .map(|summary| summary.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["evening", "pads", "morning"]);

    let deck = storage
        .list_backups_for_device("Deck 32")
        .await
        .expect("filtered");
    assert_eq!(deck.len(), 2);
    assert!(deck.iter().all(|summary| summary.device_name == "Deck 32"));
}

#[tokio::test]
async fn delete_reports_whether_a_backup_existed() {
    let (_dir, storage) = temp_storage().await;
    let id = storage
        .save_backup("scratch", &backup("Deck 32", 9, &[5]))
        .await
        .expect("save");

    assert!(storage.delete_backup(id).await.expect("delete"));
    assert!(!storage.delete_backup(id).await.expect("second delete"));
    assert!(storage.load_backup(id).await.expect("load").is_none());
}

#[test]
fn sqlite_path_ignores_memory_and_query_strings() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://db"), None);
    assert_eq!(
        sqlite_path("sqlite://data/deck.db?mode=rwc"),
        Some(PathBuf::from("data/deck.db"))
    );
}
