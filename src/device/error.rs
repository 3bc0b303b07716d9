use thiserror::Error;

/// Malformed event stream. The wire format is fixed, so any of these means
/// the driver and decoder disagree and the snapshot can no longer be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("event buffer of {len} bytes is not a multiple of 8")]
    Misaligned { len: usize },

    #[error("unknown controller event type: {0}")]
    UnknownEventType(u8),

    #[error("unknown controller button id: {0}")]
    UnknownButton(u8),

    #[error("unknown controller axis id: {0}")]
    UnknownAxis(u8),

    #[error("unknown data {data} for controller button {id}")]
    InvalidButtonData { id: u8, data: u16 },
}
