use super::error::ProtocolError;
use super::event::{self, ControllerEvent, EventType, PRESSED, RELEASED};
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Directional pad state. Up/down come from the Y axis and left/right
    /// from the X axis; one of each may be set at the same time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        const UP = 0x1;
        const LEFT = 0x2;
        const DOWN = 0x4;
        const RIGHT = 0x8;
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Direction::UP, "up"),
            (Direction::DOWN, "down"),
            (Direction::LEFT, "left"),
            (Direction::RIGHT, "right"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .collect();

        if names.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", names.join(" "))
        }
    }
}

/// Tracked buttons, in wire-id order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Cross,
    Circle,
    Triangle,
    Square,
    LeftBumper,
    RightBumper,
    Share,
    Options,
    PlayStation,
    LeftStick,
    RightStick,
}

impl Button {
    pub const COUNT: usize = 11;

    pub const ALL: [Button; Button::COUNT] = [
        Button::Cross,
        Button::Circle,
        Button::Triangle,
        Button::Square,
        Button::LeftBumper,
        Button::RightBumper,
        Button::Share,
        Button::Options,
        Button::PlayStation,
        Button::LeftStick,
        Button::RightStick,
    ];

    /// Maps a wire id to a button. `Ok(None)` for the two trigger buttons,
    /// which are reported but not tracked.
    pub fn from_id(id: u8) -> Result<Option<Self>, ProtocolError> {
        let button = match id {
            0 => Button::Cross,
            1 => Button::Circle,
            2 => Button::Triangle,
            3 => Button::Square,
            4 => Button::LeftBumper,
            5 => Button::RightBumper,
            6 | 7 => return Ok(None),
            8 => Button::Share,
            9 => Button::Options,
            10 => Button::PlayStation,
            11 => Button::LeftStick,
            12 => Button::RightStick,
            other => return Err(ProtocolError::UnknownButton(other)),
        };
        Ok(Some(button))
    }

    pub fn label(self) -> &'static str {
        match self {
            Button::Cross => "X",
            Button::Circle => "Circle",
            Button::Triangle => "Triangle",
            Button::Square => "Square",
            Button::LeftBumper => "L1",
            Button::RightBumper => "R1",
            Button::Share => "Share",
            Button::Options => "Options",
            Button::PlayStation => "PS",
            Button::LeftStick => "LS",
            Button::RightStick => "RS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    LeftX,
    LeftY,
    LeftTrigger,
    RightX,
    RightY,
    RightTrigger,
    DPadX,
    DPadY,
}

impl Axis {
    pub fn from_id(id: u8) -> Result<Self, ProtocolError> {
        match id {
            0 => Ok(Axis::LeftX),
            1 => Ok(Axis::LeftY),
            2 => Ok(Axis::LeftTrigger),
            3 => Ok(Axis::RightX),
            4 => Ok(Axis::RightY),
            5 => Ok(Axis::RightTrigger),
            6 => Ok(Axis::DPadX),
            7 => Ok(Axis::DPadY),
            other => Err(ProtocolError::UnknownAxis(other)),
        }
    }
}

/// Decoded controller state between polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSnapshot {
    buttons: [bool; Button::COUNT],
    pub left_trigger: u16,
    pub right_trigger: u16,
    pub left_x: i16,
    pub left_y: i16,
    pub right_x: i16,
    pub right_y: i16,
    pub dpad: Direction,
}

impl Default for ControllerSnapshot {
    fn default() -> Self {
        Self {
            buttons: [false; Button::COUNT],
            left_trigger: 0,
            right_trigger: 0,
            left_x: 0,
            left_y: 0,
            right_x: 0,
            right_y: 0,
            dpad: Direction::empty(),
        }
    }
}

// Signed axis to unsigned magnitude, modulo 2^16 like the driver expects
fn bias(value: i16) -> u16 {
    (value as u16).wrapping_add(i16::MAX as u16)
}

fn pad_bits(value: i16, negative: Direction, positive: Direction) -> Direction {
    match value {
        v if v < 0 => negative,
        v if v > 0 => positive,
        _ => Direction::empty(),
    }
}

impl ControllerSnapshot {
    pub fn pressed(&self, button: Button) -> bool {
        self.buttons[button as usize]
    }

    pub fn set_pressed(&mut self, button: Button, pressed: bool) {
        self.buttons[button as usize] = pressed;
    }

    /// Applies every record in `buffer`, failing on the first bad one
    pub fn decode(&mut self, buffer: &[u8]) -> Result<usize, ProtocolError> {
        let mut applied = 0;
        for event in event::records(buffer)? {
            self.apply(&event)?;
            applied += 1;
        }
        Ok(applied)
    }

    pub fn apply(&mut self, event: &ControllerEvent) -> Result<(), ProtocolError> {
        match event.event_type()? {
            EventType::Button => {
                let pressed = match event.data {
                    PRESSED => true,
                    RELEASED => false,
                    data => {
                        return Err(ProtocolError::InvalidButtonData { id: event.id, data })
                    }
                };
                if let Some(button) = Button::from_id(event.id)? {
                    self.set_pressed(button, pressed);
                }
            }
            EventType::Axis => {
                let value = event.value();
                match Axis::from_id(event.id)? {
                    Axis::LeftX => self.left_x = value,
                    Axis::LeftY => self.left_y = value.saturating_neg(),
                    Axis::LeftTrigger => self.left_trigger = bias(value),
                    Axis::RightX => self.right_x = value,
                    Axis::RightY => self.right_y = value.saturating_neg(),
                    Axis::RightTrigger => self.right_trigger = bias(value),
                    Axis::DPadX => {
                        let bits = pad_bits(value, Direction::LEFT, Direction::RIGHT);
                        self.dpad = bits | (self.dpad & (Direction::UP | Direction::DOWN));
                    }
                    Axis::DPadY => {
                        let bits = pad_bits(value, Direction::UP, Direction::DOWN);
                        self.dpad = bits | (self.dpad & (Direction::LEFT | Direction::RIGHT));
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for ControllerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for button in Button::ALL {
            writeln!(f, "{:<9} {}", format!("{}:", button.label()), self.pressed(button))?;
        }
        writeln!(f, "L2: {}", self.left_trigger)?;
        writeln!(f, "R2: {}", self.right_trigger)?;
        writeln!(f, "Left Joy:  ({}, {})", self.left_x, self.left_y)?;
        writeln!(f, "Right Joy: ({}, {})", self.right_x, self.right_y)?;
        write!(f, "DPad: {}", self.dpad)
    }
}
