use std::sync::Arc;

use definitions::{BlockDefinition, BlockRegistry};
use serde_json::Value;
use shared::domain::{Block, DeviceIdentity};
use tracing::info;

use crate::{
    device_store::{self, COMPONENT_COUNTS, CONNECTED},
    form::{BlockForm, FormError, FormTarget},
    store::{MappedStore, StoreError},
    transport::{DeviceTransport, SharedTransport},
};

/// Everything a configurator session works with: the block registry, the device store and
/// the transport of the selected device. Owned by the caller and passed down explicitly.
#[derive(Clone)]
pub struct DeviceContext {
    registry: Arc<BlockRegistry>,
    store: MappedStore,
    transport: SharedTransport,
}

impl DeviceContext {
    pub fn new(
        registry: BlockRegistry,
        transport: Arc<dyn DeviceTransport>,
    ) -> Result<Self, StoreError> {
        let transport = SharedTransport::new(transport);
        Ok(Self {
            registry: Arc::new(registry),
            store: device_store::device_store(transport.clone())?,
            transport,
        })
    }

    pub fn disconnected(registry: BlockRegistry) -> Result<Self, StoreError> {
        let transport = SharedTransport::disconnected();
        Ok(Self {
            registry: Arc::new(registry),
            store: device_store::device_store(transport.clone())?,
            transport,
        })
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn store(&self) -> &MappedStore {
        &self.store
    }

    pub async fn transport(&self) -> Arc<dyn DeviceTransport> {
        self.transport.current().await
    }

    pub async fn connect(&self) -> Result<DeviceIdentity, StoreError> {
        let identity = self
            .store
            .dispatch(device_store::CONNECT, Value::Null)
            .await?;
        serde_json::from_value(identity).map_err(|source| StoreError::Decode {
            name: device_store::CONNECT.to_string(),
            source,
        })
    }

    pub async fn is_connected(&self) -> bool {
        self.store.get_as(CONNECTED).await.unwrap_or(false)
    }

    fn definition(&self, block: Block) -> Result<Arc<BlockDefinition>, FormError> {
        self.registry
            .get(block)
            .ok_or(FormError::UnregisteredBlock(block))
    }

    /// Instances of `block` the connected device reports. Blocks without a count entry have none.
    pub async fn instance_count(&self, block: Block) -> Result<u16, FormError> {
        let definition = self.definition(block)?;
        let Some(index) = definition.component_count_index else {
            return Ok(0);
        };
        let counts: Vec<u16> = self.store.get_as(COMPONENT_COUNTS).await?;
        Ok(counts.get(index).copied().unwrap_or(0))
    }

    pub async fn open_form(&self, block: Block, target: FormTarget) -> Result<BlockForm, FormError> {
        let definition = self.definition(block)?;
        if let FormTarget::Instance(index) = target {
            let count = self.instance_count(block).await?;
            if index >= count {
                return Err(FormError::InstanceOutOfRange {
                    block,
                    index,
                    count,
                });
            }
        }
        BlockForm::load(self.transport().await, definition, target).await
    }

    /// Points the session at another device. Store state from the previous device is dropped
    /// and in-flight actions lose their writes.
    pub async fn switch_device(&self, transport: Arc<dyn DeviceTransport>) {
        self.transport.replace(transport).await;
        self.store.reset().await;
        info!("switched device");
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
