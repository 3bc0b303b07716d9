use crate::error::{RigError, RigResult};
use crate::wiring::{Backend, DeviceError, Pin, PinConfig, PinMode};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Exponent of the FS90R response curve; flattens the dead zone near zero
const FS90R_EXPONENT: f32 = 2.173_913;
const FS90R_SCALE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorName {
    /// Continuous rotation micro servo
    Fs90r,
    /// 180 degree micro servo
    Ms18,
    /// DC motor on an H-bridge, one PWM pin per direction
    L298n,
}

impl MotorName {
    pub fn pin_count(self) -> usize {
        match self {
            MotorName::Fs90r | MotorName::Ms18 => 1,
            MotorName::L298n => 2,
        }
    }
}

impl FromStr for MotorName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fs90r" | "fitec" | "continuous" => Ok(MotorName::Fs90r),
            "ms18" | "micro" | "180" => Ok(MotorName::Ms18),
            "l298n" | "fast" => Ok(MotorName::L298n),
            _ => Err(format!("Unrecognized motor name: {}", s)),
        }
    }
}

impl fmt::Display for MotorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorName::Fs90r => write!(f, "fs90r"),
            MotorName::Ms18 => write!(f, "ms18"),
            MotorName::L298n => write!(f, "l298n"),
        }
    }
}

pub struct Motor {
    name: MotorName,
    pins: Vec<Pin>,
    value: f32,
}

impl Motor {
    pub fn open(backend: &Backend, name: MotorName, pins: &[u8]) -> RigResult<Self> {
        if pins.len() != name.pin_count() {
            return Err(RigError::config(format!(
                "{} motor requires {} pin(s), got {}",
                name,
                name.pin_count(),
                pins.len()
            )));
        }

        let mode = match name {
            MotorName::Fs90r | MotorName::Ms18 => PinMode::Servo,
            MotorName::L298n => PinMode::Pwm,
        };
        let pins = pins
            .iter()
            .map(|&pin| backend.open_pin(PinConfig::new(pin, mode)))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Opened {} motor on pins {:?}", name, pins);
        Ok(Self {
            name,
            pins,
            value: 0.0,
        })
    }

    pub fn name(&self) -> MotorName {
        self.name
    }

    /// Last commanded speed in [-1, 1]
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn set(&mut self, value: f32) -> Result<(), DeviceError> {
        let value = value.clamp(-1.0, 1.0);
        self.value = value;

        match self.name {
            MotorName::Fs90r => {
                let curved = value.abs().powf(FS90R_EXPONENT) * value.signum() * FS90R_SCALE;
                self.drive(&[curved])
            }
            MotorName::Ms18 => self.drive(&[value]),
            MotorName::L298n => self.drive(&[value, -value]),
        }
    }

    fn drive(&mut self, values: &[f32]) -> Result<(), DeviceError> {
        debug!("{} motor set to {} ({:?})", self.name, self.value, values);
        for (pin, &value) in self.pins.iter_mut().zip(values) {
            pin.set(value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Motor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motor")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}
