//! LED outputs
//!
//! A [`Light`] drives one pin per colour channel; the controllers decide what
//! colour to show each tick:
//!
//! | mode    | consumers                                         |
//! |---------|---------------------------------------------------|
//! | `solid` | `color`, `color.r`, `color.g`, `color.b`, `brightness` |
//! | `cycle` | `brightness`, `period`                            |
//! | `flash` | `color`, `color.r/g/b`, `brightness`, `period`    |

mod color;
mod controller;
mod light;

pub use color::Color;
pub use controller::{FlashingLight, LightCycle, SolidLight};
pub use light::{Light, LightDrive, LightName};

use crate::config::LightConfig;
use crate::error::{RigError, RigResult};
use crate::rig::Output;
use crate::wiring::Backend;
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    Solid,
    Cycle,
    Flash,
}

/// Opens the LED and wraps it in the configured controller
pub fn build(backend: &Backend, config: &LightConfig) -> RigResult<Box<dyn Output>> {
    let name: LightName = config.name.parse().map_err(RigError::Configuration)?;
    let color: Color = config.color.parse().map_err(RigError::Configuration)?;
    if config.period.get() <= 0.0 {
        return Err(RigError::config("light \"period\" must be positive"));
    }

    if config.mode != LightMode::Cycle && name == LightName::DualColorLed && color.b > 0.0 {
        warn!("Color {} will not be represented properly on the {}", config.color, name);
    }

    let light = Light::open(backend, name, config.drive, &config.pins)?;
    let period = config.period.get();
    Ok(match config.mode {
        LightMode::Solid => Box::new(SolidLight::new(light, color, config.brightness)),
        LightMode::Cycle => Box::new(LightCycle::new(light, config.brightness, period)),
        LightMode::Flash => Box::new(FlashingLight::new(light, color, config.brightness, period)),
    })
}
