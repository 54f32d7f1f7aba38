//! Form model for one block's settings or one block instance's values.

use std::sync::Arc;

use definitions::{BlockDefinition, DefinitionError, FieldDefinition, ValueError};
use serde::{Deserialize, Serialize};
use shared::domain::{BackupEntry, Block, FieldAddress, FieldValue, FormState, SectionType};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    store::StoreError,
    transport::{DeviceTransport, TransportError},
};

/// Which half of a block a form edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum FormTarget {
    Settings,
    Instance(u16),
}

impl FormTarget {
    pub fn section_type(self) -> SectionType {
        match self {
            FormTarget::Settings => SectionType::Setting,
            FormTarget::Instance(_) => SectionType::Value,
        }
    }

    fn instance(self) -> u16 {
        match self {
            FormTarget::Settings => 0,
            FormTarget::Instance(index) => index,
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("block {0} is not registered")]
    UnregisteredBlock(Block),
    #[error("{block} has {count} instances, {index} is out of range")]
    InstanceOutOfRange { block: Block, index: u16, count: u16 },
    #[error("{block} has no field '{key}' in this form")]
    UnknownField { block: Block, key: String },
    #[error("{block}: '{key}' is hidden and cannot be written")]
    HiddenField { block: Block, key: String },
    #[error("{block}: '{key}' belongs at {expected}, not {address}")]
    MisplacedEntry {
        block: Block,
        key: String,
        address: FieldAddress,
        expected: FieldAddress,
    },
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{address}: {source}")]
    Transport {
        address: FieldAddress,
        #[source]
        source: TransportError,
    },
}

pub struct BlockForm {
    transport: Arc<dyn DeviceTransport>,
    definition: Arc<BlockDefinition>,
    target: FormTarget,
    state: FormState,
}

impl BlockForm {
    /// Reads every field of the target's section from the device.
    pub async fn load(
        transport: Arc<dyn DeviceTransport>,
        definition: Arc<BlockDefinition>,
        target: FormTarget,
    ) -> Result<Self, FormError> {
        let mut state = FormState::new();
        for field in definition.fields_of(target.section_type()) {
            let address = field.address(target.instance());
            let value = transport
                .read(address)
                .await
                .map_err(|source| FormError::Transport { address, source })?;
            if let Err(error) = field.validate_value(value) {
                // Keep what the device holds; the user sees and can correct it.
                warn!(%address, %error, "device holds a value outside the field definition");
            }
            state.set(field.key, value);
        }

        debug!(
            block = %definition.block,
            ?target,
            fields = state.len(),
            "loaded block form"
        );
        Ok(Self {
            transport,
            definition,
            target,
            state,
        })
    }

    pub fn definition(&self) -> &BlockDefinition {
        &self.definition
    }

    pub fn target(&self) -> FormTarget {
        self.target
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.definition.fields_of(self.target.section_type())
    }

    fn field(&self, key: &str) -> Result<&FieldDefinition, FormError> {
        self.fields()
            .find(|field| field.key == key)
            .ok_or_else(|| FormError::UnknownField {
                block: self.definition.block,
                key: key.to_string(),
            })
    }

    pub fn is_visible(&self, key: &str) -> Result<bool, FormError> {
        Ok(self.field(key)?.is_visible(&self.state)?)
    }

    /// Fields to render for the current state, in declaration order.
    pub fn visible_fields(&self) -> Result<Vec<&FieldDefinition>, FormError> {
        let mut visible = Vec::new();
        for field in self.fields() {
            if field.is_visible(&self.state)? {
                visible.push(field);
            }
        }
        Ok(visible)
    }

    /// Validates `value`, writes it to the device and only then updates the local state.
    /// Writing the value the field already holds is a no-op.
    pub async fn update(&mut self, key: &str, value: FieldValue) -> Result<(), FormError> {
        let field = self.field(key)?;
        field.validate_value(value)?;
        if !field.is_visible(&self.state)? {
            return Err(FormError::HiddenField {
                block: self.definition.block,
                key: key.to_string(),
            });
        }
        if self.state.get(key) == Some(value) {
            return Ok(());
        }

        let address = field.address(self.target.instance());
        let key = field.key;
        self.transport
            .write(address, value)
            .await
            .map_err(|source| FormError::Transport { address, source })?;
        debug!(%address, key, value, "updated field");
        self.state.set(key, value);
        Ok(())
    }

    /// The state restricted to fields that are currently visible.
    pub fn persistable(&self) -> Result<FormState, FormError> {
        let visible = self
            .visible_fields()?
            .into_iter()
            .map(|field| field.key)
            .collect::<Vec<_>>();
        let mut state = self.state.clone();
        state.retain(|key, _| visible.iter().any(|visible| *visible == key));
        Ok(state)
    }

    pub fn backup_entries(&self) -> Result<Vec<BackupEntry>, FormError> {
        let persistable = self.persistable()?;
        let mut entries = Vec::with_capacity(persistable.len());
        for field in self.fields() {
            let Some(value) = persistable.get(field.key) else {
                continue;
            };
            entries.push(BackupEntry {
                block: self.definition.block,
                section_type: field.section_type,
                key: field.key.to_string(),
                address: field.address(self.target.instance()),
                value,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
