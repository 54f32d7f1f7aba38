//! How actions and forms reach the physical device.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use shared::{
    domain::{FieldAddress, FieldValue},
    error::{DeviceStatus, ErrorCode, ErrorReport},
    protocol::ProtocolError,
};
use thiserror::Error;
use tokio::sync::RwLock;

mod simulated;
mod sysex;

pub use simulated::SimulatedDevice;
pub use sysex::{MidiLink, SysExTransport, DEFAULT_REQUEST_TIMEOUT};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no device is connected")]
    Disconnected,
    #[error("device did not answer within {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Device(#[from] DeviceStatus),
    #[error("protocol error: {0}")]
    Protocol(ProtocolError),
    #[error("MIDI link failed: {0}")]
    Link(#[source] anyhow::Error),
}

impl From<ProtocolError> for TransportError {
    fn from(value: ProtocolError) -> Self {
        match value {
            ProtocolError::Device(status) => TransportError::Device(status),
            other => TransportError::Protocol(other),
        }
    }
}

impl From<&TransportError> for ErrorReport {
    fn from(value: &TransportError) -> Self {
        let code = match value {
            TransportError::Device(_) => ErrorCode::Device,
            _ => ErrorCode::Transport,
        };
        ErrorReport::new(code, value.to_string())
    }
}

#[async_trait]
pub trait DeviceTransport: Send + Sync {
    /// Opens the configuration session and returns the device's name.
    async fn handshake(&self) -> Result<String, TransportError>;
    async fn firmware_version(&self) -> Result<String, TransportError>;
    /// Instance count per block, in the device's own order.
    async fn component_counts(&self) -> Result<Vec<u16>, TransportError>;
    async fn read(&self, address: FieldAddress) -> Result<FieldValue, TransportError>;
    async fn write(&self, address: FieldAddress, value: FieldValue) -> Result<(), TransportError>;
}

/// Stand-in used before any device is selected.
pub struct MissingDeviceTransport;

#[async_trait]
impl DeviceTransport for MissingDeviceTransport {
    async fn handshake(&self) -> Result<String, TransportError> {
        Err(TransportError::Disconnected)
    }

    async fn firmware_version(&self) -> Result<String, TransportError> {
        Err(TransportError::Disconnected)
    }

    async fn component_counts(&self) -> Result<Vec<u16>, TransportError> {
        Err(TransportError::Disconnected)
    }

    async fn read(&self, _address: FieldAddress) -> Result<FieldValue, TransportError> {
        Err(TransportError::Disconnected)
    }

    async fn write(&self, _address: FieldAddress, _value: FieldValue) -> Result<(), TransportError> {
        Err(TransportError::Disconnected)
    }
}

/// The transport of the currently selected device. Clones share the selection, so swapping
/// the device is seen by every holder.
#[derive(Clone)]
pub struct SharedTransport {
    current: Arc<RwLock<Arc<dyn DeviceTransport>>>,
}

impl SharedTransport {
    pub fn new(transport: Arc<dyn DeviceTransport>) -> Self {
        Self {
            current: Arc::new(RwLock::new(transport)),
        }
    }

    pub fn disconnected() -> Self {
        Self::new(Arc::new(MissingDeviceTransport))
    }

    pub async fn current(&self) -> Arc<dyn DeviceTransport> {
        Arc::clone(&*self.current.read().await)
    }

    /// Installs `transport` and hands back the one it replaced.
    pub async fn replace(&self, transport: Arc<dyn DeviceTransport>) -> Arc<dyn DeviceTransport> {
        std::mem::replace(&mut *self.current.write().await, transport)
    }
}

#[cfg(test)]
#[path = "../tests/transport_tests.rs"]
mod tests;
