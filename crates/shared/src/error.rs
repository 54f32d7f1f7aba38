use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Configuration,
    Validation,
    Transport,
    Device,
    Internal,
}

/// Serialisable error shape handed to whatever presents failures to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failure statuses a device reports in the status byte of a SysEx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    #[error("device rejected the request status")]
    Status,
    #[error("device requires a handshake first")]
    Handshake,
    #[error("device rejected the request wish")]
    Wish,
    #[error("device rejected the request amount")]
    Amount,
    #[error("device does not know the requested block")]
    Block,
    #[error("device does not know the requested section")]
    Section,
    #[error("device rejected the message part")]
    Part,
    #[error("device does not know the requested index")]
    Index,
    #[error("device rejected the new value")]
    NewValue,
    #[error("device rejected the message length")]
    MessageLength,
    #[error("device failed to store the value")]
    Write,
    #[error("device does not support the request")]
    NotSupported,
    #[error("device failed to read the value")]
    Read,
}

impl DeviceStatus {
    pub fn code(self) -> u8 {
        match self {
            DeviceStatus::Status => 0x02,
            DeviceStatus::Handshake => 0x03,
            DeviceStatus::Wish => 0x04,
            DeviceStatus::Amount => 0x05,
            DeviceStatus::Block => 0x06,
            DeviceStatus::Section => 0x07,
            DeviceStatus::Part => 0x08,
            DeviceStatus::Index => 0x09,
            DeviceStatus::NewValue => 0x0A,
            DeviceStatus::MessageLength => 0x0B,
            DeviceStatus::Write => 0x0C,
            DeviceStatus::NotSupported => 0x0D,
            DeviceStatus::Read => 0x0E,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x02 => DeviceStatus::Status,
            0x03 => DeviceStatus::Handshake,
            0x04 => DeviceStatus::Wish,
            0x05 => DeviceStatus::Amount,
            0x06 => DeviceStatus::Block,
            0x07 => DeviceStatus::Section,
            0x08 => DeviceStatus::Part,
            0x09 => DeviceStatus::Index,
            0x0A => DeviceStatus::NewValue,
            0x0B => DeviceStatus::MessageLength,
            0x0C => DeviceStatus::Write,
            0x0D => DeviceStatus::NotSupported,
            0x0E => DeviceStatus::Read,
            _ => return None,
        })
    }
}
