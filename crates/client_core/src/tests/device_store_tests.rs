use super::*;

use std::{sync::Arc, time::Duration};

use shared::error::ErrorCode;

use crate::transport::{SimulatedDevice, SysExTransport};

fn simulated() -> (SimulatedDevice, SharedTransport) {
    let device = SimulatedDevice::new("Deck 32", [2, 1, 0], vec![32, 8, 4, 48, 2]);
    let transport = SharedTransport::new(Arc::new(SysExTransport::new(device.clone())));
    (device, transport)
}

#[tokio::test]
async fn connect_fills_identity_and_counts() {
    let (_device, transport) = simulated();
    let store = device_store(transport).expect("store");

    let identity = store.dispatch(CONNECT, Value::Null).await.expect("connect");

    assert_eq!(
        serde_json::from_value::<DeviceIdentity>(identity).expect("identity"),
        DeviceIdentity {
            device_name: "Deck 32".into(),
            firmware_version: "2.1.0".into(),
        }
    );
    assert_eq!(store.get(CONNECTED).await.expect("connected"), json!(true));
    assert_eq!(
        store.get_as::<Vec<u16>>(COMPONENT_COUNTS).await.expect("counts"),
        vec![32, 8, 4, 48, 2]
    );
    assert_eq!(store.get(TOTAL_COMPONENTS).await.expect("total"), json!(94));
    assert_eq!(
        store.get(STATUS_LABEL).await.expect("label"),
        json!("Deck 32 (firmware 2.1.0)")
    );
}

#[tokio::test]
async fn failed_connect_is_recorded_and_returned() {
    let store = device_store(SharedTransport::disconnected()).expect("store");

    let err = store
        .dispatch(CONNECT, Value::Null)
        .await
        .expect_err("no device");
    let StoreError::Action { source, .. } = err else {
        panic!("expected action error");
    };
    assert!(matches!(
        source.downcast_ref::<TransportError>(),
        Some(TransportError::Disconnected)
    ));

    let report = store
        .get_as::<ErrorReport>(LAST_ERROR)
        .await
        .expect("last error");
    assert_eq!(report.code, ErrorCode::Transport);
    assert_eq!(store.get(CONNECTED).await.expect("connected"), json!(false));
    assert_eq!(
        store.get(STATUS_LABEL).await.expect("label"),
        json!("Disconnected: no device is connected")
    );
}

#[tokio::test]
async fn refresh_tracks_component_count_changes() {
    let (device, transport) = simulated();
    let store = device_store(transport).expect("store");
    store.dispatch(CONNECT, Value::Null).await.expect("connect");

    device.set_component_counts(vec![16, 0, 0, 16, 0]).await;
    store
        .dispatch(REFRESH_COMPONENT_COUNTS, Value::Null)
        .await
        .expect("refresh");

    assert_eq!(store.get(TOTAL_COMPONENTS).await.expect("total"), json!(32));
}

#[tokio::test]
async fn disconnect_clears_device_state() {
    let (_device, transport) = simulated();
    let store = device_store(transport).expect("store");
    store.dispatch(CONNECT, Value::Null).await.expect("connect");

    store.dispatch(DISCONNECT, Value::Null).await.expect("disconnect");

    assert_eq!(store.get(CONNECTED).await.expect("connected"), json!(false));
    assert_eq!(store.get(DEVICE_NAME).await.expect("name"), json!(""));
    assert_eq!(store.get(TOTAL_COMPONENTS).await.expect("total"), json!(0));
    assert_eq!(store.get(STATUS_LABEL).await.expect("label"), json!("Disconnected"));
}

#[tokio::test(start_paused = true)]
async fn failed_reconnect_forgets_the_previous_device() {
    let device = SimulatedDevice::new("Deck 32", [2, 1, 0], vec![32, 8, 4, 48, 2]);
    let transport = SharedTransport::new(Arc::new(
        SysExTransport::new(device.clone()).with_timeout(Duration::from_millis(20)),
    ));
    let store = device_store(transport).expect("store");
    store.dispatch(CONNECT, Value::Null).await.expect("connect");

    device.set_silent(true).await;
    store
        .dispatch(CONNECT, Value::Null)
        .await
        .expect_err("device stopped answering");

    assert_eq!(store.get(CONNECTED).await.expect("connected"), json!(false));
    assert_eq!(store.get(DEVICE_NAME).await.expect("name"), json!(""));
    assert_eq!(store.get(FIRMWARE_VERSION).await.expect("firmware"), json!(""));
    assert_eq!(
        store.get_as::<Vec<u16>>(COMPONENT_COUNTS).await.expect("counts"),
        Vec::<u16>::new()
    );
    assert_eq!(store.get(TOTAL_COMPONENTS).await.expect("total"), json!(0));
    assert!(!store.get(LAST_ERROR).await.expect("last error").is_null());
}
