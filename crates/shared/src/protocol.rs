//! SysEx framing for talking to a configurable device.
//!
//! Every frame is `F0 00 53 43 <status> <part> <body..> F7`. Requests carry status `0x00`; a
//! response echoes the request body after its status so stale replies can be told apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    domain::{Block, FieldAddress, FieldValue, MAX_FIELD_VALUE},
    error::DeviceStatus,
};

pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;
pub const MANUFACTURER_ID: [u8; 3] = [0x00, 0x53, 0x43];

const STATUS_REQUEST: u8 = 0x00;
const STATUS_ACK: u8 = 0x01;
const PART_SINGLE: u8 = 0x00;
const AMOUNT_SINGLE: u8 = 0x00;
const HEADER_LEN: usize = 1 + MANUFACTURER_ID.len() + 2;
const STANDARD_BODY_LEN: usize = 8;

pub const SPECIAL_HANDSHAKE: u8 = 0x01;
pub const SPECIAL_COMPONENT_COUNTS: u8 = 0x4D;
pub const SPECIAL_FIRMWARE_VERSION: u8 = 0x56;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame is not a SysEx message")]
    NotSysEx,
    #[error("frame belongs to another manufacturer")]
    ForeignManufacturer,
    #[error("frame truncated: need at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("frame contains data byte {0:#04x} above 7 bits")]
    InvalidDataByte(u8),
    #[error("unknown status byte {0:#04x}")]
    UnknownStatus(u8),
    #[error("unknown wish {0:#04x}")]
    UnknownWish(u8),
    #[error("unknown block id {0}")]
    UnknownBlock(u8),
    #[error("unknown special request {0:#04x}")]
    UnknownSpecialRequest(u8),
    #[error("value {0} does not fit in 14 bits")]
    ValueOutOfRange(u32),
    #[error("response does not answer the pending request")]
    UnexpectedResponse,
    #[error("malformed payload: {0}")]
    MalformedPayload(&'static str),
    #[error(transparent)]
    Device(#[from] DeviceStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wish {
    Get,
    Set,
}

impl Wish {
    fn code(self) -> u8 {
        match self {
            Wish::Get => 0x00,
            Wish::Set => 0x01,
        }
    }

    fn from_code(code: u8) -> Result<Self, ProtocolError> {
        match code {
            0x00 => Ok(Wish::Get),
            0x01 => Ok(Wish::Set),
            other => Err(ProtocolError::UnknownWish(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SysExRequest {
    Handshake,
    FirmwareVersion,
    ComponentCounts,
    Get(FieldAddress),
    Set {
        address: FieldAddress,
        value: FieldValue,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SysExResponse {
    /// Handshake reply; the device name travels as 7-bit ASCII.
    DeviceName(String),
    Values(Vec<FieldValue>),
    Ack,
}

pub fn split_14bit(value: u32) -> Result<[u8; 2], ProtocolError> {
    if value > u32::from(MAX_FIELD_VALUE) {
        return Err(ProtocolError::ValueOutOfRange(value));
    }
    Ok([((value >> 7) & 0x7F) as u8, (value & 0x7F) as u8])
}

pub fn merge_14bit(high: u8, low: u8) -> FieldValue {
    (u16::from(high & 0x7F) << 7) | u16::from(low & 0x7F)
}

/// True when `frame` is a complete SysEx message addressed with our manufacturer id.
pub fn is_device_frame(frame: &[u8]) -> bool {
    frame.len() >= HEADER_LEN + 1
        && frame[0] == SYSEX_START
        && frame[frame.len() - 1] == SYSEX_END
        && frame[1..4] == MANUFACTURER_ID
}

impl SysExRequest {
    fn body(&self) -> Result<Vec<u8>, ProtocolError> {
        match *self {
            SysExRequest::Handshake => Ok(vec![SPECIAL_HANDSHAKE]),
            SysExRequest::FirmwareVersion => Ok(vec![SPECIAL_FIRMWARE_VERSION]),
            SysExRequest::ComponentCounts => Ok(vec![SPECIAL_COMPONENT_COUNTS]),
            SysExRequest::Get(address) => standard_body(Wish::Get, address, 0),
            SysExRequest::Set { address, value } => {
                standard_body(Wish::Set, address, u32::from(value))
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(frame(STATUS_REQUEST, &self.body()?))
    }

    /// Device-side parsing of a request frame.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let (status, body) = split_frame(frame)?;
        if status != STATUS_REQUEST {
            return Err(ProtocolError::UnknownStatus(status));
        }

        if body.len() == 1 {
            return match body[0] {
                SPECIAL_HANDSHAKE => Ok(SysExRequest::Handshake),
                SPECIAL_FIRMWARE_VERSION => Ok(SysExRequest::FirmwareVersion),
                SPECIAL_COMPONENT_COUNTS => Ok(SysExRequest::ComponentCounts),
                other => Err(ProtocolError::UnknownSpecialRequest(other)),
            };
        }

        if body.len() != STANDARD_BODY_LEN {
            return Err(ProtocolError::Device(DeviceStatus::MessageLength));
        }

        let wish = Wish::from_code(body[0])?;
        if body[1] != AMOUNT_SINGLE {
            return Err(ProtocolError::Device(DeviceStatus::Amount));
        }
        let block = Block::from_id(body[2]).ok_or(ProtocolError::UnknownBlock(body[2]))?;
        let address = FieldAddress::new(block, body[3], merge_14bit(body[4], body[5]));
        let value = merge_14bit(body[6], body[7]);

        Ok(match wish {
            Wish::Get => SysExRequest::Get(address),
            Wish::Set => SysExRequest::Set { address, value },
        })
    }

    /// Device-side encoding of the reply to this request.
    pub fn encode_response(
        &self,
        outcome: Result<&SysExResponse, DeviceStatus>,
    ) -> Result<Vec<u8>, ProtocolError> {
        let mut body = self.body()?;
        let status = match outcome {
            Ok(SysExResponse::Ack) => STATUS_ACK,
            Ok(SysExResponse::DeviceName(name)) => {
                if !name.is_ascii() {
                    return Err(ProtocolError::MalformedPayload("device name must be ASCII"));
                }
                body.extend(name.bytes().map(|byte| byte & 0x7F));
                STATUS_ACK
            }
            Ok(SysExResponse::Values(values)) => {
                for value in values {
                    body.extend_from_slice(&split_14bit(u32::from(*value))?);
                }
                STATUS_ACK
            }
            Err(status) => status.code(),
        };
        Ok(frame(status, &body))
    }

    /// Host-side parsing of the device's reply to this request.
    pub fn decode_response(&self, frame: &[u8]) -> Result<SysExResponse, ProtocolError> {
        let (status, body) = split_frame(frame)?;
        let echo = self.body()?;
        if status == STATUS_REQUEST {
            return Err(ProtocolError::UnexpectedResponse);
        }
        if body.len() < echo.len() || body[..echo.len()] != echo[..] {
            return Err(ProtocolError::UnexpectedResponse);
        }
        if status != STATUS_ACK {
            let device_status =
                DeviceStatus::from_code(status).ok_or(ProtocolError::UnknownStatus(status))?;
            return Err(ProtocolError::Device(device_status));
        }

        let data = &body[echo.len()..];
        match self {
            SysExRequest::Handshake => Ok(SysExResponse::DeviceName(
                data.iter().map(|byte| char::from(*byte)).collect(),
            )),
            SysExRequest::Set { .. } => Ok(SysExResponse::Ack),
            SysExRequest::FirmwareVersion
            | SysExRequest::ComponentCounts
            | SysExRequest::Get(_) => {
                if data.len() % 2 != 0 {
                    return Err(ProtocolError::MalformedPayload(
                        "14-bit values must come in byte pairs",
                    ));
                }
                let values = data
                    .chunks_exact(2)
                    .map(|pair| merge_14bit(pair[0], pair[1]))
                    .collect::<Vec<_>>();
                if matches!(self, SysExRequest::Get(_)) && values.len() != 1 {
                    return Err(ProtocolError::MalformedPayload(
                        "single value request must return exactly one value",
                    ));
                }
                Ok(SysExResponse::Values(values))
            }
        }
    }
}

fn standard_body(wish: Wish, address: FieldAddress, value: u32) -> Result<Vec<u8>, ProtocolError> {
    let index = split_14bit(u32::from(address.index))?;
    let value = split_14bit(value)?;
    if address.section > 0x7F {
        return Err(ProtocolError::InvalidDataByte(address.section));
    }
    Ok(vec![
        wish.code(),
        AMOUNT_SINGLE,
        address.block.id(),
        address.section,
        index[0],
        index[1],
        value[0],
        value[1],
    ])
}

fn frame(status: u8, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + body.len() + 1);
    out.push(SYSEX_START);
    out.extend_from_slice(&MANUFACTURER_ID);
    out.push(status);
    out.push(PART_SINGLE);
    out.extend_from_slice(body);
    out.push(SYSEX_END);
    out
}

fn split_frame(frame: &[u8]) -> Result<(u8, &[u8]), ProtocolError> {
    if frame.first() != Some(&SYSEX_START) || frame.last() != Some(&SYSEX_END) {
        return Err(ProtocolError::NotSysEx);
    }
    if frame.len() < HEADER_LEN + 1 {
        return Err(ProtocolError::Truncated {
            expected: HEADER_LEN + 1,
            actual: frame.len(),
        });
    }
    if frame[1..4] != MANUFACTURER_ID {
        return Err(ProtocolError::ForeignManufacturer);
    }

    let inner = &frame[1..frame.len() - 1];
    if let Some(byte) = inner.iter().find(|byte| **byte > 0x7F) {
        return Err(ProtocolError::InvalidDataByte(*byte));
    }

    let status = frame[4];
    if frame[5] != PART_SINGLE {
        return Err(ProtocolError::Device(DeviceStatus::Part));
    }
    Ok((status, &frame[HEADER_LEN..frame.len() - 1]))
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
