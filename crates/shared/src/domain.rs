use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raw value of a single configurable field. Values travel as two 7-bit bytes, so
/// anything above [`MAX_FIELD_VALUE`] cannot be addressed on the wire.
pub type FieldValue = u16;

pub const MAX_FIELD_VALUE: FieldValue = 0x3FFF;

macro_rules! block_ids {
    ($($name:ident = $id:literal => $label:literal),+ $(,)?) => {
        /// A device subsystem with its own settings and per-instance values.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Block {
            $($name = $id),+
        }

        impl Block {
            pub const ALL: &'static [Block] = &[$(Block::$name),+];

            pub fn id(self) -> u8 {
                self as u8
            }

            pub fn from_id(id: u8) -> Option<Self> {
                match id {
                    $($id => Some(Block::$name),)+
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Block::$name => $label),+
                }
            }
        }
    };
}

block_ids! {
    Global = 0 => "global",
    Button = 1 => "button",
    Encoder = 2 => "encoder",
    Analog = 3 => "analog",
    Led = 4 => "led",
    Display = 5 => "display",
    Touchscreen = 6 => "touchscreen",
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown block '{0}'")]
pub struct UnknownBlock(pub String);

impl FromStr for Block {
    type Err = UnknownBlock;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        let wanted = wanted.strip_suffix('s').unwrap_or(&wanted);
        Block::ALL
            .iter()
            .copied()
            .find(|block| block.name() == wanted)
            .ok_or_else(|| UnknownBlock(raw.to_string()))
    }
}

/// Settings are block-wide and addressed by their setting index; values exist once per
/// block instance and are addressed by the instance index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Setting,
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormInputComponent {
    Toggle,
    Select,
    Input,
}

/// Location of one value in the device's settings layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldAddress {
    pub block: Block,
    pub section: u8,
    pub index: u16,
}

impl FieldAddress {
    pub fn new(block: Block, section: u8, index: u16) -> Self {
        Self {
            block,
            section,
            index,
        }
    }
}

impl fmt::Display for FieldAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.block, self.section, self.index)
    }
}

/// Live field values of one form, keyed by field key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormState(BTreeMap<String, FieldValue>);

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.0.get(key).copied()
    }

    /// Toggles and "enabled"-style selects treat any non-zero value as on.
    pub fn is_truthy(&self, key: &str) -> Option<bool> {
        self.get(key).map(|value| value != 0)
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(key.into(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, FieldValue) -> bool) {
        self.0.retain(|key, value| keep(key, *value));
    }
}

impl<K: Into<String>> FromIterator<(K, FieldValue)> for FormState {
    fn from_iter<I: IntoIterator<Item = (K, FieldValue)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_name: String,
    pub firmware_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub block: Block,
    pub section_type: SectionType,
    pub key: String,
    pub address: FieldAddress,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupId(pub i64);

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBackup {
    pub device_name: String,
    pub firmware_version: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<BackupEntry>,
}

impl DeviceBackup {
    pub fn entries_for(&self, block: Block) -> impl Iterator<Item = &BackupEntry> {
        self.entries.iter().filter(move |entry| entry.block == block)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
