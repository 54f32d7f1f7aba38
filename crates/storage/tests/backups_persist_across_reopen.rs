use chrono::Utc;
use shared::domain::{BackupEntry, Block, DeviceBackup, FieldAddress, SectionType};
use storage::Storage;

#[tokio::test]
async fn backups_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!(
        "sqlite://{}",
        dir.path()
            .join("deckconf")
            .join("backups.db")
            .to_string_lossy()
            .replace('\\', "/")
    );

    let backup = DeviceBackup {
        device_name: "Deck 32".into(),
        firmware_version: "1.4.2".into(),
        created_at: Utc::now(),
        entries: vec![BackupEntry {
            block: Block::Touchscreen,
            section_type: SectionType::Setting,
            key: "enableTouchscreen".into(),
            address: FieldAddress::new(Block::Touchscreen, 0, 0),
            value: 1,
        }],
    };

    let id = {
        let storage = Storage::new(&url).await.expect("first open");
        let id = storage.save_backup("gig", &backup).await.expect("save");
        storage.pool().close().await;
        id
    };

    let storage = Storage::new(&url).await.expect("reopen");
    storage.health_check().await.expect("health");
    let stored = storage
        .load_backup(id)
        .await
        .expect("load")
        .expect("still there");
    assert_eq!(stored.name, "gig");
    assert_eq!(stored.backup.entries, backup.entries);
    assert_eq!(stored.backup.device_name, "Deck 32");
}
