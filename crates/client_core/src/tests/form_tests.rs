use super::*;

use definitions::{blocks::touchscreen_block, BlockRegistry};
use shared::error::DeviceStatus;

use crate::transport::{SimulatedDevice, SysExTransport};

async fn touchscreen_device() -> (SimulatedDevice, Arc<dyn DeviceTransport>) {
    let device = SimulatedDevice::new("Deck 32", [1, 0, 0], vec![0, 0, 0, 0, 4]);
    device.seed(&BlockRegistry::builtin()).await;
    let transport = SysExTransport::new(device.clone());
    transport.handshake().await.expect("handshake");
    (device, Arc::new(transport))
}

fn settings_address(index: u16) -> FieldAddress {
    FieldAddress::new(Block::Touchscreen, 0, index)
}

async fn settings_form(transport: Arc<dyn DeviceTransport>) -> BlockForm {
    BlockForm::load(transport, Arc::new(touchscreen_block()), FormTarget::Settings)
        .await
        .expect("load settings")
}

fn keys(fields: Vec<&FieldDefinition>) -> Vec<&'static str> {
    fields.into_iter().map(|field| field.key).collect()
}

#[tokio::test]
async fn load_reads_only_the_target_section() {
    let (device, transport) = touchscreen_device().await;
    device.set_register(settings_address(3), 7).await;

    let form = settings_form(transport).await;

    assert_eq!(form.state().len(), 4);
    assert_eq!(form.state().get("initialScreen"), Some(7));
    assert!(!form.state().contains("xPosition"));
}

#[tokio::test]
async fn disabled_touchscreen_hides_dependent_settings() {
    let (_device, transport) = touchscreen_device().await;
    let mut form = settings_form(transport).await;

    assert_eq!(
        keys(form.visible_fields().expect("visible")),
        vec!["enableTouchscreen", "initialScreen"]
    );
    assert!(!form.is_visible("touchscreenBrightness").expect("rule"));

    form.update("enableTouchscreen", 1).await.expect("enable");

    assert_eq!(
        keys(form.visible_fields().expect("visible")),
        vec![
            "enableTouchscreen",
            "touchscreenManufacturer",
            "touchscreenBrightness",
            "initialScreen"
        ]
    );
}

#[tokio::test]
async fn hidden_fields_cannot_be_written() {
    let (device, transport) = touchscreen_device().await;
    let mut form = settings_form(transport).await;

    let err = form
        .update("touchscreenBrightness", 3)
        .await
        .expect_err("hidden");
    assert!(matches!(err, FormError::HiddenField { key, .. } if key == "touchscreenBrightness"));
    assert!(device.writes().await.is_empty());
}

#[tokio::test]
async fn updates_validate_then_write_through() {
    let (device, transport) = touchscreen_device().await;
    let mut form = settings_form(transport).await;
    form.update("enableTouchscreen", 1).await.expect("enable");

    let err = form
        .update("touchscreenManufacturer", 5)
        .await
        .expect_err("not an option");
    assert!(matches!(err, FormError::Value(ValueError::NotAnOption { value: 5, .. })));

    form.update("touchscreenManufacturer", 1)
        .await
        .expect("manufacturer");
    assert_eq!(form.state().get("touchscreenManufacturer"), Some(1));
    assert_eq!(device.register(settings_address(1)).await, Some(1));

    // Unchanged values are not sent again.
    form.update("touchscreenManufacturer", 1)
        .await
        .expect("same value");
    assert_eq!(device.writes().await.len(), 2);
}

#[tokio::test]
async fn failed_write_keeps_local_state() {
    let (device, transport) = touchscreen_device().await;
    let mut form = settings_form(transport).await;
    device.fail_on(settings_address(3), DeviceStatus::Write).await;

    let err = form.update("initialScreen", 4).await.expect_err("write fails");

    assert!(matches!(
        err,
        FormError::Transport {
            source: TransportError::Device(DeviceStatus::Write),
            ..
        }
    ));
    assert_eq!(form.state().get("initialScreen"), Some(0));
}

#[tokio::test]
async fn unknown_keys_are_rejected() {
    let (_device, transport) = touchscreen_device().await;
    let mut form = settings_form(transport).await;

    assert!(matches!(
        form.update("xPosition", 10).await,
        Err(FormError::UnknownField { .. })
    ));
}

#[tokio::test]
async fn instance_forms_address_their_instance() {
    let (device, transport) = touchscreen_device().await;
    let mut form = BlockForm::load(
        transport,
        Arc::new(touchscreen_block()),
        FormTarget::Instance(2),
    )
    .await
    .expect("load instance");

    assert!(!form.is_visible("screenToSwitchTo").expect("rule"));
    assert!(!form
        .persistable()
        .expect("persistable")
        .contains("screenToSwitchTo"));

    form.update("buttonChangesScreen", 1).await.expect("toggle");
    form.update("screenToSwitchTo", 9).await.expect("screen");

    let target = FieldAddress::new(Block::Touchscreen, 8, 2);
    assert_eq!(device.register(target).await, Some(9));

    let entries = form.backup_entries().expect("entries");
    let entry = entries
        .iter()
        .find(|entry| entry.key == "screenToSwitchTo")
        .expect("visible entry");
    assert_eq!(entry.address, target);
    assert_eq!(entry.value, 9);
    assert_eq!(entry.section_type, SectionType::Value);
}
