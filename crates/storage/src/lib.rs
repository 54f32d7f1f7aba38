use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{BackupEntry, BackupId, DeviceBackup};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBackupSummary {
    pub backup_id: BackupId,
    pub name: String,
    pub device_name: String,
    pub firmware_version: String,
    pub entry_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBackup {
    pub backup_id: BackupId,
    pub name: String,
    pub backup: DeviceBackup,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Stores `backup` under `name`, replacing any earlier backup with that name.
    pub async fn save_backup(&self, name: &str, backup: &DeviceBackup) -> Result<BackupId> {
        let entries =
            serde_json::to_string(&backup.entries).context("failed to encode backup entries")?;
        let rec = sqlx::query(
            "INSERT INTO device_backups
                (name, device_name, firmware_version, entry_count, entries_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET
                device_name = excluded.device_name,
                firmware_version = excluded.firmware_version,
                entry_count = excluded.entry_count,
                entries_json = excluded.entries_json,
                created_at = excluded.created_at
             RETURNING id",
        )
        .bind(name)
        .bind(&backup.device_name)
        .bind(&backup.firmware_version)
        .bind(backup.entries.len() as i64)
        .bind(entries)
        .bind(backup.created_at)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("failed to save backup '{name}'"))?;
        Ok(BackupId(rec.get::<i64, _>(0)))
    }

    /// Newest first.
    pub async fn list_backups(&self) -> Result<Vec<StoredBackupSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, device_name, firmware_version, entry_count, created_at
             FROM device_backups
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| summary_from_row(&row)).collect()
    }

    pub async fn list_backups_for_device(
        &self,
        device_name: &str,
    ) -> Result<Vec<StoredBackupSummary>> {
        let rows = sqlx::query(
            "SELECT id, name, device_name, firmware_version, entry_count, created_at
             FROM device_backups
             WHERE device_name = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(device_name)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|row| summary_from_row(&row)).collect()
    }

    pub async fn load_backup(&self, backup_id: BackupId) -> Result<Option<StoredBackup>> {
        let row = sqlx::query(
            "SELECT id, name, device_name, firmware_version, entries_json, created_at
             FROM device_backups WHERE id = ?",
        )
        .bind(backup_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| backup_from_row(&row)).transpose()
    }

    pub async fn load_backup_by_name(&self, name: &str) -> Result<Option<StoredBackup>> {
        let row = sqlx::query(
            "SELECT id, name, device_name, firmware_version, entries_json, created_at
             FROM device_backups WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| backup_from_row(&row)).transpose()
    }

    /// Returns whether a backup was removed.
    pub async fn delete_backup(&self, backup_id: BackupId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM device_backups WHERE id = ?")
            .bind(backup_id.0)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }
}

fn summary_from_row(row: &SqliteRow) -> Result<StoredBackupSummary> {
    Ok(StoredBackupSummary {
        backup_id: BackupId(row.try_get::<i64, _>("id")?),
        name: row.try_get("name")?,
        device_name: row.try_get("device_name")?,
        firmware_version: row.try_get("firmware_version")?,
        entry_count: u32::try_from(row.try_get::<i64, _>("entry_count")?)
            .context("stored entry count out of range")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn backup_from_row(row: &SqliteRow) -> Result<StoredBackup> {
    let backup_id = BackupId(row.try_get::<i64, _>("id")?);
    let entries_json: String = row.try_get("entries_json")?;
    let entries: Vec<BackupEntry> = serde_json::from_str(&entries_json)
        .with_context(|| format!("backup {backup_id} holds unreadable entries"))?;

    Ok(StoredBackup {
        backup_id,
        name: row.try_get("name")?,
        backup: DeviceBackup {
            device_name: row.try_get("device_name")?,
            firmware_version: row.try_get("firmware_version")?,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
            entries,
        },
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
