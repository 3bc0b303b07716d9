//! Pin configuration and the mode-specific value transforms
//!
//! A [`Pin`] takes normalised values from controllers and turns them into a
//! [`Drive`] for its line: a digital level, a PWM duty or a servo pulse
//! width. The line itself belongs to a backend (rppal GPIO or the simulated
//! bench) and only ever sees the final drive.

use super::error::DeviceError;
use std::fmt;
use std::time::Duration;

/// Logical pin number (0-27) to BCM GPIO number
const BCM_MAP: [u8; 28] = [
    2, 3, 4, 17, 27, 22, 10, 9, 11, 0, 5, 6, 13, 19, 26, 21, 20, 16, 12, 1, 7, 8, 25, 24, 23, 18,
    15, 14,
];

/// Servo pulse at value 0, and microseconds per unit of value
const SERVO_CENTER_US: f32 = 1500.0;
const SERVO_SPAN_US: f32 = 1000.0;

pub fn bcm_pin(logical: u8) -> Result<u8, DeviceError> {
    BCM_MAP
        .get(usize::from(logical))
        .copied()
        .ok_or(DeviceError::PinOutOfRange(logical))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    In,
    Out,
    Pwm,
    Servo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PwmConfig {
    pub range: u16,
    pub frequency: u32,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            range: 255,
            frequency: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub pin: u8,
    pub mode: PinMode,
    pub invert: bool,
    pub pwm: PwmConfig,
}

impl PinConfig {
    pub fn new(pin: u8, mode: PinMode) -> Self {
        Self {
            pin,
            mode,
            invert: false,
            pwm: PwmConfig::default(),
        }
    }

    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }
}

/// What a line is asked to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drive {
    Level(bool),
    Duty { duty: f64, frequency: u32 },
    Pulse(Duration),
}

impl fmt::Display for Drive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Drive::Level(high) => write!(f, "{}", if *high { "high" } else { "low" }),
            Drive::Duty { duty, frequency } => write!(f, "{:.3}@{}Hz", duty, frequency),
            Drive::Pulse(width) => write!(f, "{}us", width.as_micros()),
        }
    }
}

/// Backend half of a pin
pub trait Line {
    fn write(&mut self, drive: Drive) -> Result<(), DeviceError>;
    fn is_high(&self) -> bool;
}

pub struct Pin {
    config: PinConfig,
    value: f32,
    line: Box<dyn Line>,
}

impl Pin {
    pub(super) fn open(config: PinConfig, line: Box<dyn Line>) -> Result<Self, DeviceError> {
        let mut pin = Self {
            config,
            value: 0.0,
            line,
        };
        if config.mode != PinMode::In {
            pin.set(0.0)?;
        }
        Ok(pin)
    }

    pub fn config(&self) -> &PinConfig {
        &self.config
    }

    pub fn set(&mut self, value: f32) -> Result<(), DeviceError> {
        let drive = match self.config.mode {
            PinMode::In => return Err(DeviceError::InputPinWrite(self.config.pin)),
            PinMode::Out => {
                self.value = value.clamp(0.0, 1.0);
                Drive::Level((self.value >= 0.5) != self.config.invert)
            }
            PinMode::Pwm => {
                let mut duty = value.clamp(0.0, 1.0);
                if self.config.invert {
                    duty = 1.0 - duty;
                }
                self.value = duty;
                let range = f32::from(self.config.pwm.range);
                let steps = (duty * range).trunc();
                Drive::Duty {
                    duty: f64::from(steps / range),
                    frequency: self.config.pwm.frequency,
                }
            }
            PinMode::Servo => {
                let value = if self.config.invert { -value } else { value };
                self.value = value;
                let micros = (value * SERVO_SPAN_US).trunc() + SERVO_CENTER_US;
                Drive::Pulse(Duration::from_micros(micros.max(0.0) as u64))
            }
        };
        self.line.write(drive)
    }

    /// Current value: the sampled level for inputs, the last value set otherwise
    pub fn get(&self) -> f32 {
        match self.config.mode {
            PinMode::In => {
                let level = if self.line.is_high() { 1.0 } else { 0.0 };
                if self.config.invert {
                    1.0 - level
                } else {
                    level
                }
            }
            _ => self.value,
        }
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("config", &self.config)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe(Rc<RefCell<Vec<Drive>>>);

    impl Line for Probe {
        fn write(&mut self, drive: Drive) -> Result<(), DeviceError> {
            self.0.borrow_mut().push(drive);
            Ok(())
        }

        fn is_high(&self) -> bool {
            false
        }
    }

    fn open(config: PinConfig) -> (Pin, Rc<RefCell<Vec<Drive>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let pin = Pin::open(config, Box::new(Probe(log.clone()))).unwrap();
        (pin, log)
    }

    #[test]
    fn remaps_logical_pins() {
        assert_eq!(bcm_pin(0).unwrap(), 2);
        assert_eq!(bcm_pin(9).unwrap(), 0);
        assert_eq!(bcm_pin(27).unwrap(), 14);
        assert!(matches!(bcm_pin(28), Err(DeviceError::PinOutOfRange(28))));
    }

    #[test]
    fn outputs_start_at_zero() {
        let (_pin, log) = open(PinConfig::new(1, PinMode::Out));
        assert_eq!(log.borrow().as_slice(), &[Drive::Level(false)]);
    }

    #[test]
    fn digital_threshold_and_invert() {
        let (mut pin, log) = open(PinConfig::new(1, PinMode::Out).inverted(true));
        pin.set(0.7).unwrap();
        assert_eq!(log.borrow().last(), Some(&Drive::Level(false)));
        pin.set(0.2).unwrap();
        assert_eq!(log.borrow().last(), Some(&Drive::Level(true)));
    }

    #[test]
    fn pwm_quantises_to_range() {
        let (mut pin, log) = open(PinConfig::new(1, PinMode::Pwm));
        pin.set(2.0).unwrap();
        assert_eq!(log.borrow().last(), Some(&Drive::Duty { duty: 1.0, frequency: 1000 }));
        pin.set(0.5).unwrap();
        let expected = f64::from(127.0f32 / 255.0);
        assert_eq!(log.borrow().last(), Some(&Drive::Duty { duty: expected, frequency: 1000 }));
    }

    #[test]
    fn servo_pulse_width() {
        let (mut pin, log) = open(PinConfig::new(1, PinMode::Servo));
        assert_eq!(log.borrow().last(), Some(&Drive::Pulse(Duration::from_micros(1500))));
        pin.set(1.0).unwrap();
        assert_eq!(log.borrow().last(), Some(&Drive::Pulse(Duration::from_micros(2500))));
        pin.set(-1.0).unwrap();
        assert_eq!(log.borrow().last(), Some(&Drive::Pulse(Duration::from_micros(500))));
    }

    #[test]
    fn input_pins_reject_writes() {
        let (mut pin, _) = open(PinConfig::new(3, PinMode::In).inverted(true));
        assert!(matches!(pin.set(1.0), Err(DeviceError::InputPinWrite(3))));
        // Line reads low, inverted pull-up reads as pressed
        assert_eq!(pin.get(), 1.0);
    }
}
