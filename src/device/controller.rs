use super::snapshot::{Button, ControllerSnapshot, Direction};
use crate::error::RigResult;
use crate::rig::{split_key, BindingError, Input, Producer};
use crate::wiring::EventSource;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

const KIND: &str = "controller";

/// Scales an axis into [-1, 1] by the maximum of its type
pub fn normalize_signed(value: i16) -> f32 {
    f32::from(value) / f32::from(i16::MAX)
}

pub fn normalize_unsigned(value: u16) -> f32 {
    f32::from(value) / f32::from(u16::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stick {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    X,
    Y,
    Left,
    Up,
    Right,
    Down,
}

impl Component {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "x" => Some(Component::X),
            "y" => Some(Component::Y),
            "left" => Some(Component::Left),
            "up" => Some(Component::Up),
            "right" => Some(Component::Right),
            "down" => Some(Component::Down),
            _ => None,
        }
    }
}

/// Control name as written, before any component is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Single(Control),
    Joy(Stick),
    DPad,
}

impl Family {
    fn parse(name: &str) -> Option<Self> {
        let family = match name {
            "x" => Family::Single(Control::Button(Button::Cross)),
            "circle" => Family::Single(Control::Button(Button::Circle)),
            "triangle" => Family::Single(Control::Button(Button::Triangle)),
            "square" => Family::Single(Control::Button(Button::Square)),
            "lb" => Family::Single(Control::Button(Button::LeftBumper)),
            "rb" => Family::Single(Control::Button(Button::RightBumper)),
            "share" => Family::Single(Control::Button(Button::Share)),
            "options" => Family::Single(Control::Button(Button::Options)),
            "ps" => Family::Single(Control::Button(Button::PlayStation)),
            "lstick" => Family::Single(Control::Button(Button::LeftStick)),
            "rstick" => Family::Single(Control::Button(Button::RightStick)),
            "lt" => Family::Single(Control::LeftTrigger),
            "rt" => Family::Single(Control::RightTrigger),
            "lrt" => Family::Single(Control::CombinedTrigger),
            "ljoy" => Family::Joy(Stick::Left),
            "rjoy" => Family::Joy(Stick::Right),
            "dpad" => Family::DPad,
            _ => return None,
        };
        Some(family)
    }
}

/// One readable value of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Button(Button),
    LeftTrigger,
    RightTrigger,
    CombinedTrigger,
    Joy(Stick, Component),
    DPad(Component),
}

impl Control {
    /// Resolves `control[.component]`; joysticks and the d-pad need a component
    fn bind(key: &str) -> Result<Self, BindingError> {
        let (name, component) = split_key(key);
        let family = Family::parse(&name).ok_or_else(|| BindingError::UnknownControl {
            kind: KIND,
            key: key.to_string(),
        })?;

        match (family, component) {
            (Family::Single(control), None) => Ok(control),
            (Family::Single(_), Some(_)) => Err(BindingError::UnexpectedComponent {
                kind: KIND,
                control: name,
            }),
            (Family::Joy(_) | Family::DPad, None) => Err(BindingError::MissingComponent {
                kind: KIND,
                control: name,
            }),
            (Family::Joy(stick), Some(component)) => {
                Ok(Control::Joy(stick, bind_component(name, component)?))
            }
            (Family::DPad, Some(component)) => {
                Ok(Control::DPad(bind_component(name, component)?))
            }
        }
    }
}

fn bind_component(control: String, component: String) -> Result<Component, BindingError> {
    Component::parse(&component).ok_or(BindingError::UnknownComponent {
        kind: KIND,
        control,
        component,
    })
}

fn joy_axes(state: &ControllerSnapshot, stick: Stick) -> (i16, i16) {
    match stick {
        Stick::Left => (state.left_x, state.left_y),
        Stick::Right => (state.right_x, state.right_y),
    }
}

fn joy_value(state: &ControllerSnapshot, stick: Stick, component: Component) -> f32 {
    let (x, y) = joy_axes(state, stick);
    let value = match component {
        Component::X => x,
        Component::Y => y,
        Component::Left => x.min(0).saturating_neg(),
        Component::Up => y.max(0),
        Component::Right => x.max(0),
        Component::Down => y.min(0).saturating_neg(),
    };
    normalize_signed(value)
}

fn pad_value(pad: Direction, component: Component) -> f32 {
    let bit = |flag: Direction| if pad.contains(flag) { 1.0 } else { 0.0 };
    match component {
        Component::X => bit(Direction::RIGHT) - bit(Direction::LEFT),
        Component::Y => bit(Direction::UP) - bit(Direction::DOWN),
        Component::Left => bit(Direction::LEFT),
        Component::Up => bit(Direction::UP),
        Component::Right => bit(Direction::RIGHT),
        Component::Down => bit(Direction::DOWN),
    }
}

/// Right trigger minus left trigger, positive towards the right
fn combined_trigger(state: &ControllerSnapshot) -> f32 {
    let right = (state.right_trigger / 2) as i16;
    let left = (state.left_trigger / 2) as i16;
    normalize_signed(right - left)
}

/// Game controller read from a joystick event device
pub struct ControllerDevice {
    id: String,
    source: Box<dyn EventSource>,
    state: Rc<RefCell<ControllerSnapshot>>,
}

impl ControllerDevice {
    pub fn new(id: impl Into<String>, source: Box<dyn EventSource>) -> Self {
        Self {
            id: id.into(),
            source,
            state: Rc::new(RefCell::new(ControllerSnapshot::default())),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        *self.state.borrow()
    }

    fn resolve(&self, control: Control) -> Producer {
        let state = self.state.clone();
        match control {
            Control::Button(button) => Box::new(move || {
                if state.borrow().pressed(button) {
                    1.0
                } else {
                    0.0
                }
            }),
            Control::LeftTrigger => {
                Box::new(move || normalize_unsigned(state.borrow().left_trigger))
            }
            Control::RightTrigger => {
                Box::new(move || normalize_unsigned(state.borrow().right_trigger))
            }
            Control::CombinedTrigger => Box::new(move || combined_trigger(&state.borrow())),
            Control::Joy(stick, component) => {
                Box::new(move || joy_value(&state.borrow(), stick, component))
            }
            Control::DPad(component) => {
                Box::new(move || pad_value(state.borrow().dpad, component))
            }
        }
    }
}

impl Input for ControllerDevice {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn poll(&mut self) -> RigResult<()> {
        let bytes = self.source.read_available()?;
        if bytes.is_empty() {
            return Ok(());
        }
        let applied = self.state.borrow_mut().decode(&bytes)?;
        debug!("Controller {} applied {} events", self.id, applied);
        trace!("Controller {} state:\n{}", self.id, self.state.borrow());
        Ok(())
    }

    fn producer(&self, key: &str) -> Result<Producer, BindingError> {
        Ok(self.resolve(Control::bind(key)?))
    }
}
