use super::color::Color;
use crate::error::{RigError, RigResult};
use crate::wiring::{Backend, DeviceError, Pin, PinConfig, PinMode};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightName {
    /// Common-anode RGB LED, one pin per channel
    RgbLed,
    /// Red/green LED, two pins
    DualColorLed,
}

impl LightName {
    pub fn pin_count(self) -> usize {
        match self {
            LightName::RgbLed => 3,
            LightName::DualColorLed => 2,
        }
    }

    fn inverted(self) -> bool {
        matches!(self, LightName::RgbLed)
    }
}

impl FromStr for LightName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rgb led" => Ok(LightName::RgbLed),
            "dual-color led" => Ok(LightName::DualColorLed),
            _ => Err(format!("Unrecognized LED name: {}", s)),
        }
    }
}

impl fmt::Display for LightName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LightName::RgbLed => write!(f, "rgb led"),
            LightName::DualColorLed => write!(f, "dual-color led"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightDrive {
    Digital,
    #[default]
    Pwm,
}

impl LightDrive {
    fn pin_mode(self) -> PinMode {
        match self {
            LightDrive::Digital => PinMode::Out,
            LightDrive::Pwm => PinMode::Pwm,
        }
    }
}

/// LED driver: writes one colour channel per pin
pub struct Light {
    name: LightName,
    pins: Vec<Pin>,
    color: Color,
}

impl Light {
    pub fn open(
        backend: &Backend,
        name: LightName,
        drive: LightDrive,
        pins: &[u8],
    ) -> RigResult<Self> {
        if pins.len() != name.pin_count() {
            return Err(RigError::config(format!(
                "{} requires {} pins, got {}",
                name,
                name.pin_count(),
                pins.len()
            )));
        }

        let pins = pins
            .iter()
            .map(|&pin| {
                backend.open_pin(PinConfig::new(pin, drive.pin_mode()).inverted(name.inverted()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!("Opened {} ({:?}) on pins {:?}", name, drive, pins);
        Ok(Self {
            name,
            pins,
            color: Color::BLACK,
        })
    }

    pub fn name(&self) -> LightName {
        self.name
    }

    /// Last colour written
    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) -> Result<(), DeviceError> {
        debug!("{} set to {}", self.name, color);
        self.color = color;
        for (pin, channel) in self.pins.iter_mut().zip(color.channels()) {
            pin.set(channel)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Light")
            .field("name", &self.name)
            .field("color", &self.color)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiring::{Drive, SimulatedBench};

    #[test]
    fn rgb_led_is_inverted() {
        let bench = SimulatedBench::new();
        let backend = Backend::simulated(bench.clone());
        let mut light =
            Light::open(&backend, LightName::RgbLed, LightDrive::Digital, &[0, 1, 2]).unwrap();

        light.set_color(Color::RED).unwrap();
        assert_eq!(bench.last_drive(0), Some(Drive::Level(false)));
        assert_eq!(bench.last_drive(1), Some(Drive::Level(true)));
        assert_eq!(bench.last_drive(2), Some(Drive::Level(true)));
    }

    #[test]
    fn dual_color_led_drives_red_and_green() {
        let bench = SimulatedBench::new();
        let backend = Backend::simulated(bench.clone());
        let mut light =
            Light::open(&backend, LightName::DualColorLed, LightDrive::Digital, &[3, 4]).unwrap();

        light.set_color(Color::YELLOW).unwrap();
        assert_eq!(bench.last_drive(3), Some(Drive::Level(true)));
        assert_eq!(bench.last_drive(4), Some(Drive::Level(true)));
        assert_eq!(light.color(), Color::YELLOW);
    }

    #[test]
    fn wrong_pin_count_is_a_configuration_error() {
        let backend = Backend::simulated(SimulatedBench::new());
        assert!(matches!(
            Light::open(&backend, LightName::RgbLed, LightDrive::Pwm, &[0, 1]),
            Err(RigError::Configuration(_))
        ));
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("RGB LED".parse::<LightName>(), Ok(LightName::RgbLed));
        assert_eq!("dual-color led".parse::<LightName>(), Ok(LightName::DualColorLed));
        assert!("strip".parse::<LightName>().is_err());
    }
}
