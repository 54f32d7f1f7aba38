use super::*;

use std::sync::Arc;

use definitions::BlockRegistry;
use shared::{
    domain::{Block, FieldAddress, FieldValue},
    error::DeviceStatus,
};

use crate::transport::{DeviceTransport, SimulatedDevice, SysExTransport, TransportError};

const COUNTS: [u16; 5] = [2, 1, 1, 2, 1];

async fn seeded_context(name: &str) -> (SimulatedDevice, DeviceContext) {
    let device = SimulatedDevice::new(name, [1, 2, 3], COUNTS.to_vec());
    device.seed(&BlockRegistry::builtin()).await;
    let transport: Arc<dyn DeviceTransport> = Arc::new(SysExTransport::new(device.clone()));
    let context = DeviceContext::new(BlockRegistry::builtin(), transport).expect("context");
    context.connect().await.expect("connect");
    (device, context)
}

#[tokio::test]
async fn backups_hold_only_visible_fields() {
    let (device, context) = seeded_context("Deck 32").await;
    // The only touchscreen icon switches screens; the touchscreen itself stays disabled.
    device
        .set_register(FieldAddress::new(Block::Touchscreen, 7, 0), 1)
        .await;

    let backup = capture_backup(&context).await.expect("backup");

    assert_eq!(backup.device_name, "Deck 32");
    assert_eq!(backup.firmware_version, "1.2.3");
    let touchscreen_keys = backup
        .entries_for(Block::Touchscreen)
        .map(|entry| entry.key.as_str())
        .collect::<Vec<_>>();
    assert!(touchscreen_keys.contains(&"enableTouchscreen"));
    assert!(!touchscreen_keys.contains(&"touchscreenManufacturer"));
    assert!(!touchscreen_keys.contains(&"touchscreenBrightness"));
    assert!(touchscreen_keys.contains(&"screenToSwitchTo"));

    let button_instances = backup
        .entries_for(Block::Button)
        .filter(|entry| entry.key == "midiId")
        .count();
    assert_eq!(button_instances, 2);
}

#[tokio::test]
async fn restore_writes_every_entry_to_the_new_device() {
    let (source, source_context) = seeded_context("Deck 32").await;
    let midi_id = FieldAddress::new(Block::Button, 2, 1);
    source.set_register(midi_id, 64).await;
    let backup = capture_backup(&source_context).await.expect("backup");

    let (target, target_context) = seeded_context("Deck 32").await;
    let written = restore_backup(&target_context, &backup)
        .await
        .expect("restore");

    assert_eq!(written, backup.entries.len());
    assert_eq!(target.writes().await.len(), backup.entries.len());
    assert_eq!(target.register(midi_id).await, Some(64));
}

#[tokio::test]
async fn restore_stops_at_first_failure() {
    let (_source, source_context) = seeded_context("Deck 32").await;
    let backup = capture_backup(&source_context).await.expect("backup");
    let failing = backup.entries[1].address;

    let (target, target_context) = seeded_context("Deck 32").await;
    target.fail_on(failing, DeviceStatus::Write).await;

    let err = restore_backup(&target_context, &backup)
        .await
        .expect_err("write fails");

    assert!(matches!(
        err,
        FormError::Transport {
            address,
            source: TransportError::Device(DeviceStatus::Write),
        } if address == failing
    ));
    assert_eq!(target.writes().await.len(), 1);
}

#[tokio::test]
async fn restore_rejects_values_the_definition_forbids() {
    let (_source, source_context) = seeded_context("Deck 32").await;
    let mut backup = capture_backup(&source_context).await.expect("backup");
    let entry = backup.entries.last_mut().expect("entries");
    entry.value = FieldValue::MAX;

    let (target, target_context) = seeded_context("Deck 32").await;
    let err = restore_backup(&target_context, &backup)
        .await
        .expect_err("invalid value");

    assert!(matches!(err, FormError::Value(_)));
    assert!(target.writes().await.is_empty());
}

#[tokio::test]
async fn restore_rejects_entries_pointing_at_another_register() {
    let (_source, source_context) = seeded_context("Deck 32").await;
    let mut backup = capture_backup(&source_context).await.expect("backup");
    let note_off = BlockRegistry::builtin()
        .get(Block::Global)
        .and_then(|definition| {
            definition
                .fields
                .iter()
                .find(|field| field.key == "standardNoteOff")
                .map(|field| field.address(0))
        })
        .expect("note off toggle");
    let entry = backup
        .entries
        .iter_mut()
        .find(|entry| entry.block == Block::Led && entry.key == "midiChannel")
        .expect("channel entry");
    entry.address = note_off;
    entry.value = 16;

    let (target, target_context) = seeded_context("Deck 32").await;
    let before = target.register(note_off).await;
    let err = restore_backup(&target_context, &backup)
        .await
        .expect_err("misplaced entry");

    assert!(matches!(
        err,
        FormError::MisplacedEntry { address, .. } if address == note_off
    ));
    assert!(target.writes().await.is_empty());
    assert_eq!(target.register(note_off).await, before);
}

#[tokio::test]
async fn restore_rejects_instances_the_device_does_not_have() {
    let (_source, source_context) = seeded_context("Deck 32").await;
    let mut backup = capture_backup(&source_context).await.expect("backup");
    let entry = backup
        .entries
        .iter_mut()
        .find(|entry| entry.block == Block::Button && entry.key == "midiId")
        .expect("button entry");
    entry.address.index = 9;

    let (target, target_context) = seeded_context("Deck 32").await;
    let err = restore_backup(&target_context, &backup)
        .await
        .expect_err("instance out of range");

    assert!(matches!(
        err,
        FormError::InstanceOutOfRange { block: Block::Button, index: 9, .. }
    ));
    assert!(target.writes().await.is_empty());
}
