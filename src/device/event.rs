//! Fixed-size event records read from the joystick device
//!
//! ```text
//! byte  0   1   2   3 | 4   5 | 6          | 7
//!       timestamp LE  | data  | type (&7F) | id
//! ```

use super::error::ProtocolError;

pub const EVENT_SIZE: usize = 8;

/// Set on synthetic events the driver emits right after open
pub const INIT_FLAG: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Button,
    Axis,
}

impl EventType {
    pub const BUTTON: u8 = 1;
    pub const AXIS: u8 = 2;

    pub fn from_raw(raw: u8) -> Result<Self, ProtocolError> {
        match raw & !INIT_FLAG {
            Self::BUTTON => Ok(EventType::Button),
            Self::AXIS => Ok(EventType::Axis),
            other => Err(ProtocolError::UnknownEventType(other)),
        }
    }
}

// Wire value of a button's data field
pub const RELEASED: u16 = 0;
pub const PRESSED: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerEvent {
    pub timestamp: u32,
    pub data: u16,
    pub kind: u8,
    pub id: u8,
}

impl ControllerEvent {
    pub fn from_bytes(bytes: &[u8; EVENT_SIZE]) -> Self {
        Self {
            timestamp: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data: u16::from_le_bytes([bytes[4], bytes[5]]),
            kind: bytes[6] & !INIT_FLAG,
            id: bytes[7],
        }
    }

    pub fn to_bytes(&self) -> [u8; EVENT_SIZE] {
        let t = self.timestamp.to_le_bytes();
        let d = self.data.to_le_bytes();
        [t[0], t[1], t[2], t[3], d[0], d[1], self.kind, self.id]
    }

    pub fn button(id: u8, data: u16) -> Self {
        Self {
            timestamp: 0,
            data,
            kind: EventType::BUTTON,
            id,
        }
    }

    pub fn axis(id: u8, value: i16) -> Self {
        Self {
            timestamp: 0,
            data: value as u16,
            kind: EventType::AXIS,
            id,
        }
    }

    pub fn event_type(&self) -> Result<EventType, ProtocolError> {
        EventType::from_raw(self.kind)
    }

    /// Data field reinterpreted as a signed axis value
    pub fn value(&self) -> i16 {
        self.data as i16
    }
}

/// Splits a buffer into records, rejecting any trailing partial record
pub fn records(buffer: &[u8]) -> Result<impl Iterator<Item = ControllerEvent> + '_, ProtocolError> {
    if buffer.len() % EVENT_SIZE != 0 {
        return Err(ProtocolError::Misaligned { len: buffer.len() });
    }

    Ok(buffer.chunks_exact(EVENT_SIZE).map(|chunk| {
        let mut record = [0u8; EVENT_SIZE];
        record.copy_from_slice(chunk);
        ControllerEvent::from_bytes(&record)
    }))
}

/// Concatenates events into one wire buffer
pub fn encode(events: &[ControllerEvent]) -> Vec<u8> {
    events.iter().flat_map(|event| event.to_bytes()).collect()
}
