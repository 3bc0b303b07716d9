//! TOML rig description
//!
//! ```toml
//! [scheduler]
//! period = "10ms"
//!
//! [inputs.pad]
//! type = "controller"
//! id = "js0"
//!
//! [outputs.wheel]
//! type = "motor"
//! name = "l298n"
//! pins = [10, 11]
//! mode = "oscillate"
//!
//! [[connections]]
//! speed = "pad.ljoy.y"
//! output = "wheel.max"
//! ```
//!
//! Inside a connection table `output` and `function` are reserved; every
//! other key names an expression parameter bound to `alias.key`, in the
//! order written.

mod duration;

pub use duration::{parse_seconds, Seconds};

use crate::error::{RigError, RigResult};
use crate::light::{LightDrive, LightMode};
use crate::motor::MotorMode;
use crate::rig::ConnectionSpec;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_PERIOD: Seconds = Seconds(0.01);

const OUTPUT_KEY: &str = "output";
const FUNCTION_KEY: &str = "function";

fn default_period() -> Seconds {
    DEFAULT_PERIOD
}

fn one() -> f32 {
    1.0
}

fn one_second() -> Seconds {
    Seconds(1.0)
}

fn white() -> String {
    "white".to_string()
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    #[serde(default = "default_period")]
    pub period: Seconds,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_PERIOD,
        }
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputConfig {
    Controller {
        id: String,
    },
    Button {
        pin: u8,
        #[serde(default)]
        toggle: bool,
    },
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub name: String,
    pub pins: Vec<u8>,
    #[serde(default)]
    pub drive: LightDrive,
    pub mode: LightMode,
    #[serde(default = "white")]
    pub color: String,
    #[serde(default = "one")]
    pub brightness: f32,
    #[serde(default = "one_second")]
    pub period: Seconds,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct MotorConfig {
    pub name: String,
    /// Servo motors take a single pin
    pub pin: Option<u8>,
    /// H-bridge motors take a forward and a backward pin
    pub pins: Option<Vec<u8>>,
    #[serde(default)]
    pub mode: MotorMode,
    #[serde(default = "one")]
    pub value: f32,
    #[serde(default = "one")]
    pub max: f32,
    #[serde(default = "one_second")]
    pub period: Seconds,
}

impl MotorConfig {
    /// `pin` and `pins` merged into one list
    pub fn pin_list(&self) -> Vec<u8> {
        let mut pins: Vec<u8> = self.pin.into_iter().collect();
        pins.extend(self.pins.iter().flatten());
        pins
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutputConfig {
    Light(LightConfig),
    Motor(MotorConfig),
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct RigConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputConfig>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputConfig>,
    #[serde(default)]
    pub connections: Vec<toml::Table>,
}

impl RigConfig {
    pub fn parse(text: &str) -> RigResult<Self> {
        let config: RigConfig = toml::from_str(text)?;
        debug!(
            "Parsed rig: {} inputs, {} outputs, {} connections",
            config.inputs.len(),
            config.outputs.len(),
            config.connections.len()
        );
        Ok(config)
    }

    pub fn load(path: &Path) -> RigResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            RigError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        info!("Loading rig from {}", path.display());
        Self::parse(&text)
    }

    /// Connection tables turned into specs, in document order
    pub fn connection_specs(&self) -> RigResult<Vec<ConnectionSpec>> {
        self.connections
            .iter()
            .enumerate()
            .map(|(index, table)| connection_spec(index, table))
            .collect()
    }
}

fn connection_spec(index: usize, table: &toml::Table) -> RigResult<ConnectionSpec> {
    let mut spec = ConnectionSpec::new();
    for (key, value) in table {
        let text = value.as_str().ok_or_else(|| {
            RigError::config(format!(
                "connection {}: \"{}\" must be a string, got {}",
                index,
                key,
                value.type_str()
            ))
        })?;
        spec = match key.as_str() {
            OUTPUT_KEY => spec.output(text),
            FUNCTION_KEY => spec.function(text),
            _ => spec.producer(key.as_str(), text),
        };
    }
    Ok(spec)
}

/// `$XDG_CONFIG_HOME/pirig/rig.toml`, or `./rig.toml` without a config dir
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("pirig").join("rig.toml"))
        .unwrap_or_else(|| PathBuf::from("rig.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [scheduler]
        period = "20ms"

        [inputs.pad]
        type = "controller"
        id = "js0"

        [inputs.btn]
        type = "button"
        pin = 6

        [outputs.rgb]
        type = "light"
        name = "rgb led"
        pins = [0, 1, 2]
        mode = "cycle"
        period = "5s"

        [outputs.wheel]
        type = "motor"
        name = "fs90r"
        pin = 5
        mode = "oscillate"
        max = 0.5

        [[connections]]
        y = "pad.ljoy.y"
        x = "pad.ljoy.x"
        function = "x*y"
        output = "wheel.max"

        [[connections]]
        b = "btn.value"
        output = "rgb.brightness"
    "#;

    #[test]
    fn parses_sample_document() {
        let config = RigConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.scheduler.period, Seconds(0.02));
        assert_eq!(
            config.inputs["pad"],
            InputConfig::Controller { id: "js0".into() }
        );
        assert_eq!(
            config.inputs["btn"],
            InputConfig::Button {
                pin: 6,
                toggle: false
            }
        );

        let OutputConfig::Light(light) = &config.outputs["rgb"] else {
            panic!("rgb should be a light");
        };
        assert_eq!(light.mode, LightMode::Cycle);
        assert_eq!(light.drive, LightDrive::Pwm);
        assert_eq!(light.color, "white");
        assert_eq!(light.brightness, 1.0);
        assert_eq!(light.period, Seconds(5.0));

        let OutputConfig::Motor(motor) = &config.outputs["wheel"] else {
            panic!("wheel should be a motor");
        };
        assert_eq!(motor.mode, MotorMode::Oscillate);
        assert_eq!(motor.pin_list(), vec![5]);
        assert_eq!(motor.max, 0.5);
    }

    #[test]
    fn connections_keep_document_order() {
        let specs = RigConfig::parse(SAMPLE).unwrap().connection_specs().unwrap();
        assert_eq!(
            specs[0],
            ConnectionSpec::new()
                .producer("y", "pad.ljoy.y")
                .producer("x", "pad.ljoy.x")
                .function("x*y")
                .output("wheel.max")
        );
        assert_eq!(
            specs[1],
            ConnectionSpec::new().producer("b", "btn.value").output("rgb.brightness")
        );
    }

    #[test]
    fn non_string_connection_values_name_the_key() {
        let config = RigConfig::parse("[[connections]]\nx = 3\noutput = \"a.b\"").unwrap();
        let err = config.connection_specs().unwrap_err().to_string();
        assert!(err.contains("\"x\""), "{}", err);
    }

    #[test]
    fn unknown_types_and_missing_keys_are_configuration_errors() {
        let err = RigConfig::parse("[inputs.a]\ntype = \"gyro\"").unwrap_err();
        assert!(matches!(err, RigError::Configuration(_)));

        let err = RigConfig::parse("[inputs.a]\ntype = \"button\"").unwrap_err();
        assert!(err.to_string().contains("pin"), "{}", err);

        let err = RigConfig::parse("[outputs.a]\ntype = \"motor\"\npin = 1").unwrap_err();
        assert!(err.to_string().contains("name"), "{}", err);
    }

    #[test]
    fn huge_periods_are_configuration_errors() {
        for text in ["[scheduler]\nperiod = 1e30", "[scheduler]\nperiod = \"1e30s\""] {
            let err = RigConfig::parse(text).unwrap_err();
            assert!(matches!(err, RigError::Configuration(_)));
            assert!(err.to_string().contains("period"), "{}", err);
        }
    }

    #[test]
    fn defaults_apply_to_empty_document() {
        let config = RigConfig::parse("").unwrap();
        assert_eq!(config.scheduler.period, DEFAULT_PERIOD);
        assert!(config.inputs.is_empty());
        assert!(config.connection_specs().unwrap().is_empty());
    }

    #[test]
    fn default_path_ends_with_rig_toml() {
        assert!(default_config_path().ends_with("rig.toml"));
    }
}
