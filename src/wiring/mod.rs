//! Driver layer: GPIO pins and input event devices
//!
//! Everything that touches hardware sits behind a [`Backend`]:
//!
//! ```text
//! Controllers ──► Pin (mode transform) ──► Line ──► rppal GPIO
//!                                               └─► SimulatedBench
//!
//! Controller input ──► EventSource ──► /dev/input/<id>
//!                                  └─► ReplaySource (simulated)
//! ```
//!
//! The GPIO peripheral stays mapped while any backend clone is alive; each
//! pin is claimed exclusively and reset when its owner drops it.

mod error;
mod gpio;
mod pin;
mod simulated;
mod source;

pub use error::DeviceError;
pub use pin::{bcm_pin, Drive, Line, Pin, PinConfig, PinMode, PwmConfig};
pub use simulated::SimulatedBench;
pub use source::{EventSource, JoystickDevice, ReplaySource};

use rppal::gpio::Gpio;
use std::fmt;
use tracing::info;

#[derive(Clone)]
pub enum Backend {
    Gpio(Gpio),
    Simulated(SimulatedBench),
}

impl Backend {
    pub fn gpio() -> Result<Self, DeviceError> {
        let gpio = gpio::open_gpio()?;
        info!("GPIO backend ready");
        Ok(Backend::Gpio(gpio))
    }

    pub fn simulated(bench: SimulatedBench) -> Self {
        info!("Using simulated wiring backend");
        Backend::Simulated(bench)
    }

    pub fn open_pin(&self, config: PinConfig) -> Result<Pin, DeviceError> {
        let bcm = bcm_pin(config.pin)?;
        let line: Box<dyn Line> = match self {
            Backend::Gpio(gpio) => match config.mode {
                PinMode::In => Box::new(gpio::GpioInput::open(gpio, bcm)?),
                _ => Box::new(gpio::GpioOutput::open(gpio, bcm)?),
            },
            Backend::Simulated(bench) => Box::new(bench.claim(config.pin)?),
        };
        Pin::open(config, line)
    }

    pub fn event_source(&self, id: &str) -> Result<Box<dyn EventSource>, DeviceError> {
        match self {
            Backend::Gpio(_) => Ok(Box::new(JoystickDevice::open(id)?)),
            Backend::Simulated(bench) => Ok(Box::new(bench.source(id))),
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Gpio(_) => write!(f, "Backend::Gpio"),
            Backend::Simulated(_) => write!(f, "Backend::Simulated"),
        }
    }
}
