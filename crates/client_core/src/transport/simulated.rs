use std::{collections::HashMap, sync::Arc};

use anyhow::anyhow;
use async_trait::async_trait;
use definitions::{BlockRegistry, FieldDefinition};
use shared::{
    domain::{FieldAddress, FieldValue, FormInputComponent, SectionType},
    error::DeviceStatus,
    protocol::{SysExRequest, SysExResponse},
};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use super::MidiLink;

#[derive(Debug)]
struct DeviceState {
    name: String,
    firmware: [FieldValue; 3],
    component_counts: Vec<u16>,
    registers: HashMap<FieldAddress, FieldValue>,
    failures: HashMap<FieldAddress, DeviceStatus>,
    session_open: bool,
    silent: bool,
    writes: Vec<(FieldAddress, FieldValue)>,
}

struct SimulatedInner {
    state: Mutex<DeviceState>,
    replies: mpsc::UnboundedSender<Vec<u8>>,
    inbox: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

/// In-memory device answering SysEx requests the way real hardware does. Clones share the
/// same device, so a test can keep one handle while a transport owns another.
#[derive(Clone)]
pub struct SimulatedDevice {
    inner: Arc<SimulatedInner>,
}

impl SimulatedDevice {
    pub fn new(name: impl Into<String>, firmware: [FieldValue; 3], component_counts: Vec<u16>) -> Self {
        let (replies, inbox) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(SimulatedInner {
                state: Mutex::new(DeviceState {
                    name: name.into(),
                    firmware,
                    component_counts,
                    registers: HashMap::new(),
                    failures: HashMap::new(),
                    session_open: false,
                    silent: false,
                    writes: Vec::new(),
                }),
                replies,
                inbox: Mutex::new(inbox),
            }),
        }
    }

    /// Fills every register the registry describes with a value its field accepts.
    pub async fn seed(&self, registry: &BlockRegistry) {
        let mut state = self.inner.state.lock().await;
        for definition in registry.iter() {
            let instances = definition
                .component_count_index
                .and_then(|index| state.component_counts.get(index).copied())
                .unwrap_or(0);
            for field in &definition.fields {
                let value = resting_value(field);
                match field.section_type {
                    SectionType::Setting => {
                        state.registers.insert(field.address(0), value);
                    }
                    SectionType::Value => {
                        for instance in 0..instances {
                            state.registers.insert(field.address(instance), value);
                        }
                    }
                }
            }
        }
        debug!(registers = state.registers.len(), "seeded simulated device");
    }

    pub async fn register(&self, address: FieldAddress) -> Option<FieldValue> {
        self.inner.state.lock().await.registers.get(&address).copied()
    }

    pub async fn set_register(&self, address: FieldAddress, value: FieldValue) {
        self.inner.state.lock().await.registers.insert(address, value);
    }

    /// Every later request touching `address` is answered with `status`.
    pub async fn fail_on(&self, address: FieldAddress, status: DeviceStatus) {
        self.inner.state.lock().await.failures.insert(address, status);
    }

    /// A silent device swallows requests without replying.
    pub async fn set_silent(&self, silent: bool) {
        self.inner.state.lock().await.silent = silent;
    }

    pub async fn set_component_counts(&self, counts: Vec<u16>) {
        self.inner.state.lock().await.component_counts = counts;
    }

    /// Queues an unsolicited message, as if the device sent it on its own.
    pub fn inject(&self, frame: Vec<u8>) {
        let _ = self.inner.replies.send(frame);
    }

    /// Values written through `Set` requests, oldest first.
    pub async fn writes(&self) -> Vec<(FieldAddress, FieldValue)> {
        self.inner.state.lock().await.writes.clone()
    }

    fn answer(state: &mut DeviceState, request: &SysExRequest) -> Result<SysExResponse, DeviceStatus> {
        if !state.session_open && *request != SysExRequest::Handshake {
            return Err(DeviceStatus::Handshake);
        }

        match *request {
            SysExRequest::Handshake => {
                state.session_open = true;
                Ok(SysExResponse::DeviceName(state.name.clone()))
            }
            SysExRequest::FirmwareVersion => Ok(SysExResponse::Values(state.firmware.to_vec())),
            SysExRequest::ComponentCounts => {
                Ok(SysExResponse::Values(state.component_counts.clone()))
            }
            SysExRequest::Get(address) => {
                if let Some(status) = state.failures.get(&address) {
                    return Err(*status);
                }
                let value = state.registers.get(&address).copied().unwrap_or(0);
                Ok(SysExResponse::Values(vec![value]))
            }
            SysExRequest::Set { address, value } => {
                if let Some(status) = state.failures.get(&address) {
                    return Err(*status);
                }
                state.registers.insert(address, value);
                state.writes.push((address, value));
                Ok(SysExResponse::Ack)
            }
        }
    }
}

#[async_trait]
impl MidiLink for SimulatedDevice {
    async fn send(&self, frame: &[u8]) -> anyhow::Result<()> {
        let request = match SysExRequest::decode(frame) {
            Ok(request) => request,
            Err(error) => {
                warn!(%error, "simulated device dropped an unreadable request");
                return Ok(());
            }
        };

        let reply = {
            let mut state = self.inner.state.lock().await;
            if state.silent {
                debug!(?request, "simulated device ignoring request");
                return Ok(());
            }
            let outcome = Self::answer(&mut state, &request);
            request.encode_response(outcome.as_ref().map_err(|status| *status))?
        };

        self.inner
            .replies
            .send(reply)
            .map_err(|_| anyhow!("simulated device reply queue closed"))
    }

    async fn receive(&self) -> anyhow::Result<Vec<u8>> {
        self.inner
            .inbox
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| anyhow!("simulated device reply queue closed"))
    }
}

fn resting_value(field: &FieldDefinition) -> FieldValue {
    match field.component {
        FormInputComponent::Select => field.options.first().map(|option| option.value).unwrap_or(0),
        FormInputComponent::Input => field.bounds().0,
        FormInputComponent::Toggle => 0,
    }
}
