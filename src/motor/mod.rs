//! Motor outputs
//!
//! | mode        | consumers            |
//! |-------------|----------------------|
//! | `constant`  | `value`              |
//! | `oscillate` | `period`, `max`      |
//! | `dance`     | `period`, `restart`  |

mod controller;
mod motor;

pub use controller::{ConstantMotor, DancePhase, DancingMotor, OscillatingMotor};
pub use motor::{Motor, MotorName};

use crate::config::MotorConfig;
use crate::error::{RigError, RigResult};
use crate::rig::Output;
use crate::wiring::Backend;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotorMode {
    #[default]
    Constant,
    Oscillate,
    Dance,
}

pub fn build(backend: &Backend, config: &MotorConfig) -> RigResult<Box<dyn Output>> {
    let name: MotorName = config.name.parse().map_err(RigError::Configuration)?;
    let period = config.period.get();
    if period <= 0.0 {
        return Err(RigError::config("motor \"period\" must be positive"));
    }

    let checked = |key: &str, value: f32| {
        if (0.0..=1.0).contains(&value) {
            Ok(value)
        } else {
            Err(RigError::config(format!(
                "motor \"{}\" must be within [0.0, 1.0], got {}",
                key, value
            )))
        }
    };

    let output: Box<dyn Output> = match config.mode {
        MotorMode::Constant => {
            let value = checked("value", config.value)?;
            Box::new(ConstantMotor::new(
                Motor::open(backend, name, &config.pin_list())?,
                value,
            ))
        }
        MotorMode::Oscillate => {
            let max = checked("max", config.max)?;
            Box::new(OscillatingMotor::new(
                Motor::open(backend, name, &config.pin_list())?,
                max,
                period,
            ))
        }
        MotorMode::Dance => Box::new(DancingMotor::new(
            Motor::open(backend, name, &config.pin_list())?,
            period,
        )),
    };
    Ok(output)
}
