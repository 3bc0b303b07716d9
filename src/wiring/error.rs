use thiserror::Error;

// Driver-layer errors
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to initialize GPIO: {0}")]
    GpioInit(String),

    #[error("Pin is out of range 0-27: {0}")]
    PinOutOfRange(u8),

    #[error("Pin {0} is already in use")]
    PinBusy(u8),

    #[error("Failed to drive pin {pin}: {reason}")]
    PinWrite { pin: u8, reason: String },

    #[error("Cannot set input pin {0}")]
    InputPinWrite(u8),

    #[error("Failed to open event device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read event device {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
