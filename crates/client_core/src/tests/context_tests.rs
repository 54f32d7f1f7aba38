use super::*;

use crate::transport::{SimulatedDevice, SysExTransport};

fn simulated(name: &str, counts: Vec<u16>) -> (SimulatedDevice, Arc<dyn DeviceTransport>) {
    let device = SimulatedDevice::new(name, [1, 0, 0], counts);
    let transport: Arc<dyn DeviceTransport> = Arc::new(SysExTransport::new(device.clone()));
    (device, transport)
}

#[tokio::test]
async fn instance_counts_follow_the_component_count_reply() {
    let (_device, transport) = simulated("Deck 32", vec![32, 8, 4, 48, 2]);
    let context = DeviceContext::new(BlockRegistry::builtin(), transport).expect("context");

    assert_eq!(context.instance_count(Block::Button).await.expect("count"), 0);

    context.connect().await.expect("connect");

    assert!(context.is_connected().await);
    assert_eq!(context.instance_count(Block::Button).await.expect("count"), 32);
    assert_eq!(context.instance_count(Block::Led).await.expect("count"), 48);
    assert_eq!(context.instance_count(Block::Touchscreen).await.expect("count"), 2);
    assert_eq!(context.instance_count(Block::Global).await.expect("count"), 0);
}

#[tokio::test]
async fn forms_are_limited_to_reported_instances() {
    let (device, transport) = simulated("Deck 32", vec![4, 0, 0, 0, 0]);
    device.seed(&BlockRegistry::builtin()).await;
    let context = DeviceContext::new(BlockRegistry::builtin(), transport).expect("context");
    context.connect().await.expect("connect");

    let form = context
        .open_form(Block::Button, FormTarget::Instance(3))
        .await
        .expect("last button");
    assert_eq!(form.target(), FormTarget::Instance(3));

    assert!(matches!(
        context.open_form(Block::Button, FormTarget::Instance(4)).await,
        Err(FormError::InstanceOutOfRange { index: 4, count: 4, .. })
    ));
}

#[tokio::test]
async fn unregistered_blocks_are_reported() {
    let context = DeviceContext::disconnected(BlockRegistry::new()).expect("context");

    assert!(matches!(
        context.instance_count(Block::Encoder).await,
        Err(FormError::UnregisteredBlock(Block::Encoder))
    ));
}

#[tokio::test]
async fn switching_device_resets_the_session() {
    let (_first, first_transport) = simulated("Deck 32", vec![32, 8, 4, 48, 2]);
    let (_second, second_transport) = simulated("Pad 16", vec![16, 0, 0, 16, 0]);
    let context = DeviceContext::new(BlockRegistry::builtin(), first_transport).expect("context");
    context.connect().await.expect("connect first");

    context.switch_device(second_transport).await;

    assert!(!context.is_connected().await);
    assert_eq!(context.instance_count(Block::Button).await.expect("count"), 0);

    let identity = context.connect().await.expect("connect second");
    assert_eq!(identity.device_name, "Pad 16");
    assert_eq!(context.instance_count(Block::Button).await.expect("count"), 16);
}
