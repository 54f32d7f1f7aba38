use std::time::Duration;

use async_trait::async_trait;
use shared::{
    domain::{FieldAddress, FieldValue},
    protocol::{is_device_frame, ProtocolError, SysExRequest, SysExResponse},
};
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use super::{DeviceTransport, TransportError};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(1500);

/// Raw MIDI byte pipe to a device, one complete message per call.
#[async_trait]
pub trait MidiLink: Send + Sync {
    async fn send(&self, frame: &[u8]) -> anyhow::Result<()>;
    async fn receive(&self) -> anyhow::Result<Vec<u8>>;
}

/// [`DeviceTransport`] speaking SysEx over a [`MidiLink`]. One request is in flight at a
/// time; replies that answer an earlier, abandoned request are skipped.
pub struct SysExTransport<L> {
    link: L,
    exchange: Mutex<()>,
    timeout: Duration,
}

impl<L: MidiLink> SysExTransport<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            exchange: Mutex::new(()),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    async fn request(&self, request: SysExRequest) -> Result<SysExResponse, TransportError> {
        let frame = request.encode()?;
        let _exchange = self.exchange.lock().await;

        debug!(?request, "sending SysEx request");
        self.link.send(&frame).await.map_err(TransportError::Link)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let frame = match tokio::time::timeout_at(deadline, self.link.receive()).await {
                Ok(received) => received.map_err(TransportError::Link)?,
                Err(_) => return Err(TransportError::Timeout(self.timeout)),
            };
            if !is_device_frame(&frame) {
                debug!(len = frame.len(), "ignoring unrelated MIDI message");
                continue;
            }
            match request.decode_response(&frame) {
                Err(ProtocolError::UnexpectedResponse) => {
                    debug!(?request, "ignoring reply to another request");
                }
                outcome => return outcome.map_err(TransportError::from),
            }
        }
    }

    async fn values(&self, request: SysExRequest) -> Result<Vec<FieldValue>, TransportError> {
        match self.request(request).await? {
            SysExResponse::Values(values) => Ok(values),
            _ => Err(TransportError::Protocol(ProtocolError::MalformedPayload(
                "expected values in reply",
            ))),
        }
    }
}

#[async_trait]
impl<L: MidiLink> DeviceTransport for SysExTransport<L> {
    async fn handshake(&self) -> Result<String, TransportError> {
        match self.request(SysExRequest::Handshake).await? {
            SysExResponse::DeviceName(name) => Ok(name),
            _ => Err(TransportError::Protocol(ProtocolError::MalformedPayload(
                "expected device name in handshake reply",
            ))),
        }
    }

    async fn firmware_version(&self) -> Result<String, TransportError> {
        let parts = self.values(SysExRequest::FirmwareVersion).await?;
        if parts.is_empty() {
            return Err(TransportError::Protocol(ProtocolError::MalformedPayload(
                "empty firmware version",
            )));
        }
        Ok(parts
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join("."))
    }

    async fn component_counts(&self) -> Result<Vec<u16>, TransportError> {
        self.values(SysExRequest::ComponentCounts).await
    }

    async fn read(&self, address: FieldAddress) -> Result<FieldValue, TransportError> {
        let values = self.values(SysExRequest::Get(address)).await?;
        values.first().copied().ok_or(TransportError::Protocol(
            ProtocolError::MalformedPayload("empty get reply"),
        ))
    }

    async fn write(&self, address: FieldAddress, value: FieldValue) -> Result<(), TransportError> {
        self.request(SysExRequest::Set { address, value }).await?;
        Ok(())
    }
}
