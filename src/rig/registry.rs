use super::connection::{Connection, ConnectionSpec};
use super::{Input, Output};
use crate::config::{InputConfig, OutputConfig, RigConfig};
use crate::control::Button;
use crate::device::ControllerDevice;
use crate::error::{RigError, RigResult};
use crate::wiring::Backend;
use crate::{light, motor};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

/// Every live Input, Output and Connection of one rig.
///
/// Inputs and outputs are kept sorted by alias; connections keep the order
/// they were added in.
#[derive(Default)]
pub struct Rig {
    inputs: BTreeMap<String, Box<dyn Input>>,
    outputs: BTreeMap<String, Box<dyn Output>>,
    connections: Vec<Connection>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens every device and wires every connection, or fails without
    /// running anything.
    pub fn from_config(config: &RigConfig, backend: &Backend) -> RigResult<Self> {
        let mut rig = Rig::new();

        for (alias, input) in &config.inputs {
            let built = build_input(backend, input)
                .map_err(|e| e.keyed(format!("inputs.{}", alias)))?;
            rig.add_input(alias, built)?;
        }

        for (alias, output) in &config.outputs {
            let built = match output {
                OutputConfig::Light(light) => light::build(backend, light),
                OutputConfig::Motor(motor) => motor::build(backend, motor),
            }
            .map_err(|e| e.keyed(format!("outputs.{}", alias)))?;
            rig.add_output(alias, built)?;
        }

        for spec in config.connection_specs()? {
            rig.connect(&spec)?;
        }

        info!(
            "Rig ready: {} inputs, {} outputs, {} connections",
            rig.inputs.len(),
            rig.outputs.len(),
            rig.connections.len()
        );
        Ok(rig)
    }

    pub fn add_input(&mut self, alias: &str, input: Box<dyn Input>) -> RigResult<()> {
        if self.inputs.contains_key(alias) {
            return Err(RigError::config(format!("duplicate input \"{}\"", alias)));
        }
        debug!("Input {} ({})", alias, input.kind());
        self.inputs.insert(alias.to_string(), input);
        Ok(())
    }

    pub fn add_output(&mut self, alias: &str, output: Box<dyn Output>) -> RigResult<()> {
        if self.outputs.contains_key(alias) {
            return Err(RigError::config(format!("duplicate output \"{}\"", alias)));
        }
        debug!("Output {} ({})", alias, output.kind());
        self.outputs.insert(alias.to_string(), output);
        Ok(())
    }

    pub fn connect(&mut self, spec: &ConnectionSpec) -> RigResult<()> {
        let connection = Connection::build(spec, &self.inputs, &self.outputs)?;
        self.connections.push(connection);
        Ok(())
    }

    pub fn poll_inputs(&mut self) -> RigResult<()> {
        for input in self.inputs.values_mut() {
            input.poll()?;
        }
        Ok(())
    }

    pub fn run_connections(&self) {
        for connection in &self.connections {
            connection.run();
        }
    }

    pub fn step_outputs(&mut self) -> RigResult<()> {
        for output in self.outputs.values_mut() {
            output.step()?;
        }
        Ok(())
    }

    /// Poll, then propagate, then actuate
    pub fn tick(&mut self) -> RigResult<()> {
        self.poll_inputs()?;
        self.run_connections();
        self.step_outputs()
    }

    pub fn input_aliases(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    pub fn output_aliases(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}

fn build_input(backend: &Backend, input: &InputConfig) -> RigResult<Box<dyn Input>> {
    Ok(match input {
        InputConfig::Controller { id } => {
            Box::new(ControllerDevice::new(id.clone(), backend.event_source(id)?))
        }
        InputConfig::Button { pin, toggle } => Box::new(Button::open(backend, *pin, *toggle)?),
    })
}

impl fmt::Debug for Rig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rig")
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("connections", &self.connections)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::event::{encode, ControllerEvent, PRESSED};
    use crate::wiring::{Drive, SimulatedBench};

    fn build(text: &str) -> (RigResult<Rig>, SimulatedBench) {
        let bench = SimulatedBench::new();
        let backend = Backend::simulated(bench.clone());
        let rig = RigConfig::parse(text).and_then(|config| Rig::from_config(&config, &backend));
        (rig, bench)
    }

    const PAD_TO_LED: &str = r#"
        [inputs.pad]
        type = "controller"
        id = "js0"

        [outputs.led]
        type = "light"
        name = "dual-color led"
        pins = [3, 4]
        drive = "digital"
        mode = "solid"
        color = "black"

        [[connections]]
        a = "pad.x"
        output = "led.color.r"
    "#;

    #[test]
    fn tick_carries_a_press_to_the_led() {
        let (rig, bench) = build(PAD_TO_LED);
        let mut rig = rig.unwrap();

        rig.tick().unwrap();
        assert_eq!(bench.last_drive(3), Some(Drive::Level(false)));

        bench.feed("js0", encode(&[ControllerEvent::button(0, PRESSED)]));
        rig.tick().unwrap();
        assert_eq!(bench.last_drive(3), Some(Drive::Level(true)));
        assert_eq!(bench.last_drive(4), Some(Drive::Level(false)));
    }

    #[test]
    fn protocol_errors_abort_the_tick() {
        let (rig, bench) = build(PAD_TO_LED);
        let mut rig = rig.unwrap();
        bench.feed("js0", vec![0u8; 3]);
        assert!(matches!(rig.tick(), Err(RigError::Protocol(_))));
    }

    #[test]
    fn bad_connections_fail_the_build() {
        let (rig, _) = build(
            r#"
            [inputs.btn]
            type = "button"
            pin = 6

            [outputs.m]
            type = "motor"
            name = "ms18"
            pin = 5

            [[connections]]
            a = "btn.value"
            b = "btn.value"
            output = "m.value"
            "#,
        );
        assert!(matches!(rig, Err(RigError::Configuration(_))));

        let (rig, _) = build(
            r#"
            [outputs.m]
            type = "motor"
            name = "ms18"
            pin = 5

            [[connections]]
            a = "ghost.value"
            output = "m.value"
            "#,
        );
        assert!(matches!(rig, Err(RigError::Configuration(_))));
    }

    #[test]
    fn output_errors_name_the_alias() {
        let (rig, _) = build(
            r#"
            [outputs.arm]
            type = "motor"
            name = "ms18"
            pin = 5
            value = 2.0
            "#,
        );
        let err = rig.unwrap_err().to_string();
        assert!(err.contains("outputs.arm"), "{}", err);
        assert!(err.contains("value"), "{}", err);
    }

    #[test]
    fn shared_pins_are_rejected() {
        let (rig, _) = build(
            r#"
            [inputs.btn]
            type = "button"
            pin = 5

            [outputs.m]
            type = "motor"
            name = "ms18"
            pin = 5
            "#,
        );
        let err = rig.unwrap_err();
        assert!(err.is_build_time());
        assert!(err.to_string().contains("outputs.m"), "{}", err);
        assert!(matches!(
            &err,
            RigError::Keyed { source, .. } if matches!(**source, RigError::DeviceIo(_))
        ));
    }

    #[test]
    fn input_errors_name_the_alias() {
        let (rig, _) = build(
            r#"
            [inputs.a]
            type = "button"
            pin = 7

            [inputs.b]
            type = "button"
            pin = 7
            "#,
        );
        let err = rig.unwrap_err().to_string();
        assert!(err.contains("inputs.b"), "{}", err);
        assert!(err.contains("7"), "{}", err);

        let (rig, _) = build("[inputs.far]\ntype = \"button\"\npin = 99");
        let err = rig.unwrap_err().to_string();
        assert!(err.contains("inputs.far"), "{}", err);
    }

    #[test]
    fn aliases_are_sorted() {
        let (rig, _) = build(
            r#"
            [outputs.zeta]
            type = "motor"
            name = "ms18"
            pin = 1

            [outputs.alpha]
            type = "motor"
            name = "micro"
            pin = 2
            "#,
        );
        let rig = rig.unwrap();
        assert_eq!(rig.output_aliases().collect::<Vec<_>>(), vec!["alpha", "zeta"]);
    }
}
