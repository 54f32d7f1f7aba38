//! Snapshots of a device's configuration and writing them back.

use chrono::Utc;
use shared::domain::{BackupEntry, DeviceBackup, SectionType};
use tracing::{info, warn};

use crate::{
    context::DeviceContext,
    device_store::{DEVICE_NAME, FIRMWARE_VERSION},
    form::{FormError, FormTarget},
};

/// Reads every block's settings and every instance's values. Fields hidden by the current
/// state are left out.
pub async fn capture_backup(context: &DeviceContext) -> Result<DeviceBackup, FormError> {
    let store = context.store();
    let device_name: String = store.get_as(DEVICE_NAME).await?;
    let firmware_version: String = store.get_as(FIRMWARE_VERSION).await?;

    let mut entries = Vec::new();
    for definition in context.registry().iter() {
        let block = definition.block;
        if definition.has(SectionType::Setting) {
            let form = context.open_form(block, FormTarget::Settings).await?;
            entries.extend(form.backup_entries()?);
        }
        if definition.has(SectionType::Value) {
            for index in 0..context.instance_count(block).await? {
                let form = context.open_form(block, FormTarget::Instance(index)).await?;
                entries.extend(form.backup_entries()?);
            }
        }
    }

    info!(device = %device_name, entries = entries.len(), "captured backup");
    Ok(DeviceBackup {
        device_name,
        firmware_version,
        created_at: Utc::now(),
        entries,
    })
}

/// Checks every entry against the registry and the connected device, then writes them back
/// in capture order, stopping at the first failed write. Nothing is written when any entry is
/// invalid. Returns the number of values written.
pub async fn restore_backup(
    context: &DeviceContext,
    backup: &DeviceBackup,
) -> Result<usize, FormError> {
    let current: String = context.store().get_as(DEVICE_NAME).await?;
    if current != backup.device_name {
        warn!(
            backup = %backup.device_name,
            device = %current,
            "restoring a backup taken from another device"
        );
    }

    for entry in &backup.entries {
        check_entry(context, entry).await?;
    }

    let transport = context.transport().await;
    for entry in &backup.entries {
        transport
            .write(entry.address, entry.value)
            .await
            .map_err(|source| FormError::Transport {
                address: entry.address,
                source,
            })?;
    }

    info!(device = %current, entries = backup.entries.len(), "restored backup");
    Ok(backup.entries.len())
}

/// The entry must name a registered field, carry a value that field accepts, and point at the
/// register the field occupies for its instance.
async fn check_entry(context: &DeviceContext, entry: &BackupEntry) -> Result<(), FormError> {
    let definition = context
        .registry()
        .get(entry.block)
        .ok_or(FormError::UnregisteredBlock(entry.block))?;
    let field = definition
        .fields_of(entry.section_type)
        .find(|field| field.key == entry.key)
        .ok_or_else(|| FormError::UnknownField {
            block: entry.block,
            key: entry.key.clone(),
        })?;
    field.validate_value(entry.value)?;

    let instance = match entry.section_type {
        SectionType::Setting => 0,
        SectionType::Value => {
            let index = entry.address.index;
            let count = context.instance_count(entry.block).await?;
            if index >= count {
                return Err(FormError::InstanceOutOfRange {
                    block: entry.block,
                    index,
                    count,
                });
            }
            index
        }
    };
    let expected = field.address(instance);
    if entry.address != expected {
        return Err(FormError::MisplacedEntry {
            block: entry.block,
            key: entry.key.clone(),
            address: entry.address,
            expected,
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/backup_tests.rs"]
mod tests;
