//! rppal-backed lines
//!
//! rppal keeps the GPIO peripheral mapped for as long as any `Gpio` handle
//! lives and refuses to hand out a pin twice. Lines reset their pin when
//! dropped, so releasing an output is tied to dropping its owner.

use super::error::DeviceError;
use super::pin::{Drive, Line};
use rppal::gpio::{Gpio, InputPin, OutputPin};
use std::time::Duration;
use tracing::debug;

/// Servo refresh period (50 Hz)
const SERVO_PERIOD: Duration = Duration::from_millis(20);

pub fn open_gpio() -> Result<Gpio, DeviceError> {
    Gpio::new().map_err(|e| DeviceError::GpioInit(e.to_string()))
}

fn claim(gpio: &Gpio, bcm: u8) -> Result<rppal::gpio::Pin, DeviceError> {
    gpio.get(bcm).map_err(|e| match e {
        rppal::gpio::Error::PinUsed(pin) => DeviceError::PinBusy(pin),
        other => DeviceError::GpioInit(other.to_string()),
    })
}

pub struct GpioOutput {
    bcm: u8,
    pin: OutputPin,
}

impl GpioOutput {
    pub fn open(gpio: &Gpio, bcm: u8) -> Result<Self, DeviceError> {
        let mut pin = claim(gpio, bcm)?.into_output_low();
        pin.set_reset_on_drop(true);
        debug!("Claimed BCM {} as output", bcm);
        Ok(Self { bcm, pin })
    }

    fn fail(&self, e: rppal::gpio::Error) -> DeviceError {
        DeviceError::PinWrite {
            pin: self.bcm,
            reason: e.to_string(),
        }
    }
}

impl Line for GpioOutput {
    fn write(&mut self, drive: Drive) -> Result<(), DeviceError> {
        match drive {
            Drive::Level(true) => self.pin.set_high(),
            Drive::Level(false) => self.pin.set_low(),
            Drive::Duty { duty, frequency } => self
                .pin
                .set_pwm_frequency(f64::from(frequency), duty)
                .map_err(|e| self.fail(e))?,
            Drive::Pulse(width) => self
                .pin
                .set_pwm(SERVO_PERIOD, width)
                .map_err(|e| self.fail(e))?,
        }
        Ok(())
    }

    fn is_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

pub struct GpioInput {
    pin: InputPin,
}

impl GpioInput {
    pub fn open(gpio: &Gpio, bcm: u8) -> Result<Self, DeviceError> {
        let pin = claim(gpio, bcm)?.into_input_pullup();
        debug!("Claimed BCM {} as pull-up input", bcm);
        Ok(Self { pin })
    }
}

impl Line for GpioInput {
    fn write(&mut self, _drive: Drive) -> Result<(), DeviceError> {
        Err(DeviceError::InputPinWrite(self.pin.pin()))
    }

    fn is_high(&self) -> bool {
        self.pin.is_high()
    }
}
