//! The application's store describing the connected device.

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{domain::DeviceIdentity, error::ErrorReport};
use tracing::{info, warn};

use crate::{
    store::{ActionContext, MappedStore, StoreAction, StoreDefinition, StoreError, StoreSnapshot},
    transport::{SharedTransport, TransportError},
};

pub const CONNECTED: &str = "connected";
pub const DEVICE_NAME: &str = "deviceName";
pub const FIRMWARE_VERSION: &str = "firmwareVersion";
pub const COMPONENT_COUNTS: &str = "componentCounts";
pub const LAST_ERROR: &str = "lastError";

pub const TOTAL_COMPONENTS: &str = "totalComponents";
pub const STATUS_LABEL: &str = "statusLabel";

pub const CONNECT: &str = "connect";
pub const REFRESH_COMPONENT_COUNTS: &str = "refreshComponentCounts";
pub const DISCONNECT: &str = "disconnect";

pub fn device_store(transport: SharedTransport) -> Result<MappedStore, StoreError> {
    MappedStore::build(
        StoreDefinition::new("device")
            .state(CONNECTED, false)
            .state(DEVICE_NAME, "")
            .state(FIRMWARE_VERSION, "")
            .state(COMPONENT_COUNTS, json!([]))
            .state(LAST_ERROR, Value::Null)
            .computed(TOTAL_COMPONENTS, &[COMPONENT_COUNTS], total_components)
            .computed(
                STATUS_LABEL,
                &[CONNECTED, DEVICE_NAME, FIRMWARE_VERSION, LAST_ERROR],
                status_label,
            )
            .action(
                CONNECT,
                &[
                    CONNECTED,
                    DEVICE_NAME,
                    FIRMWARE_VERSION,
                    COMPONENT_COUNTS,
                    LAST_ERROR,
                ],
                Connect {
                    transport: transport.clone(),
                },
            )
            .action(
                REFRESH_COMPONENT_COUNTS,
                &[COMPONENT_COUNTS, LAST_ERROR],
                RefreshComponentCounts { transport },
            )
            .action(
                DISCONNECT,
                &[
                    CONNECTED,
                    DEVICE_NAME,
                    FIRMWARE_VERSION,
                    COMPONENT_COUNTS,
                    LAST_ERROR,
                ],
                Disconnect,
            ),
    )
}

fn total_components(inputs: &StoreSnapshot) -> Value {
    let total: u64 = inputs
        .get(COMPONENT_COUNTS)
        .and_then(Value::as_array)
        .map(|counts| counts.iter().filter_map(Value::as_u64).sum())
        .unwrap_or(0);
    json!(total)
}

fn status_label(inputs: &StoreSnapshot) -> Value {
    let text = |name: &str| {
        inputs
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let connected = inputs
        .get(CONNECTED)
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if connected {
        return json!(format!(
            "{} (firmware {})",
            text(DEVICE_NAME),
            text(FIRMWARE_VERSION)
        ));
    }

    let error = inputs
        .get(LAST_ERROR)
        .and_then(|value| value.get("message"))
        .and_then(Value::as_str);
    match error {
        Some(message) => json!(format!("Disconnected: {message}")),
        None => json!("Disconnected"),
    }
}

/// Records `error` in `lastError` and hands it back for the caller.
async fn record_failure(ctx: &ActionContext, error: TransportError) -> anyhow::Error {
    warn!(action = ctx.action(), %error, "device request failed");
    let report = ErrorReport::from(&error);
    match serde_json::to_value(&report) {
        Ok(report) => {
            if let Err(store_error) = ctx.set(LAST_ERROR, report).await {
                return store_error.into();
            }
        }
        Err(encode_error) => return encode_error.into(),
    }
    error.into()
}

/// Drops everything known about the previously connected device.
async fn clear_device(ctx: &ActionContext) -> Result<(), StoreError> {
    ctx.set(CONNECTED, false).await?;
    ctx.set(DEVICE_NAME, "").await?;
    ctx.set(FIRMWARE_VERSION, "").await?;
    ctx.set(COMPONENT_COUNTS, json!([])).await?;
    Ok(())
}

struct Connect {
    transport: SharedTransport,
}

#[async_trait]
impl StoreAction for Connect {
    async fn run(&self, ctx: ActionContext, _args: Value) -> anyhow::Result<Value> {
        let transport = self.transport.current().await;
        let identify = async {
            let device_name = transport.handshake().await?;
            let firmware_version = transport.firmware_version().await?;
            let counts = transport.component_counts().await?;
            Ok::<_, TransportError>((
                DeviceIdentity {
                    device_name,
                    firmware_version,
                },
                counts,
            ))
        };

        let (identity, counts) = match identify.await {
            Ok(found) => found,
            Err(error) => {
                clear_device(&ctx).await?;
                return Err(record_failure(&ctx, error).await);
            }
        };

        ctx.set(DEVICE_NAME, identity.device_name.as_str()).await?;
        ctx.set(FIRMWARE_VERSION, identity.firmware_version.as_str())
            .await?;
        ctx.set(COMPONENT_COUNTS, json!(counts)).await?;
        ctx.set(LAST_ERROR, Value::Null).await?;
        ctx.set(CONNECTED, true).await?;
        info!(
            device = %identity.device_name,
            firmware = %identity.firmware_version,
            "connected to device"
        );

        Ok(serde_json::to_value(identity)?)
    }
}

struct RefreshComponentCounts {
    transport: SharedTransport,
}

#[async_trait]
impl StoreAction for RefreshComponentCounts {
    async fn run(&self, ctx: ActionContext, _args: Value) -> anyhow::Result<Value> {
        let transport = self.transport.current().await;
        match transport.component_counts().await {
            Ok(counts) => {
                ctx.set(COMPONENT_COUNTS, json!(counts)).await?;
                ctx.set(LAST_ERROR, Value::Null).await?;
                Ok(json!(counts))
            }
            Err(error) => Err(record_failure(&ctx, error).await),
        }
    }
}

struct Disconnect;

#[async_trait]
impl StoreAction for Disconnect {
    async fn run(&self, ctx: ActionContext, _args: Value) -> anyhow::Result<Value> {
        clear_device(&ctx).await?;
        ctx.set(LAST_ERROR, Value::Null).await?;
        info!("disconnected from device");
        Ok(Value::Null)
    }
}

#[cfg(test)]
#[path = "tests/device_store_tests.rs"]
mod tests;
