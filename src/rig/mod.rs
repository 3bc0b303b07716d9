//! Binding graph: Inputs, Outputs and the Connections between them
//!
//! ```text
//! Input ──producer("ljoy.x")──► Producer ─┐
//! Input ──producer("lt")──────► Producer ─┼─► CompiledExpression ─► Consumer ──► Output
//!                                         │    (optional)
//! ```
//!
//! Producers and Consumers are boxed closures that capture shared state of the
//! object that created them, so they stay valid as long as that object's state
//! does. Everything runs on the scheduler's thread; nothing here is `Send`.

mod connection;
mod error;
mod registry;

pub use connection::{Connection, ConnectionSpec};
pub use error::BindingError;
pub use registry::Rig;

use crate::error::RigResult;
use crate::wiring::DeviceError;
use std::cell::Cell;
use std::rc::Rc;

/// Pull handle yielding the current value of a signal source
pub type Producer = Box<dyn Fn() -> f32>;

/// Push handle applying a value to a signal sink
pub type Consumer = Box<dyn Fn(f32)>;

pub trait Input {
    /// Short type name used in logs and binding errors
    fn kind(&self) -> &'static str;

    /// Refreshes internal state from the backing device
    fn poll(&mut self) -> RigResult<()>;

    fn producer(&self, key: &str) -> Result<Producer, BindingError>;
}

pub trait Output {
    fn kind(&self) -> &'static str;

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError>;

    /// Advances the controller by one tick and drives the actuator
    fn step(&mut self) -> Result<(), DeviceError>;
}

/// Splits `control[.component]`, lower-casing both halves
pub fn split_key(key: &str) -> (String, Option<String>) {
    match key.split_once('.') {
        Some((control, component)) => (
            control.trim().to_ascii_lowercase(),
            Some(component.trim().to_ascii_lowercase()),
        ),
        None => (key.trim().to_ascii_lowercase(), None),
    }
}

/// Live-tunable numeric parameter shared between an Output and its Consumers
#[derive(Debug, Clone, Default)]
pub struct Param {
    value: Rc<Cell<f32>>,
    dirty: Rc<Cell<bool>>,
}

impl Param {
    pub fn new(value: f32) -> Self {
        Self {
            value: Rc::new(Cell::new(value)),
            dirty: Rc::new(Cell::new(true)),
        }
    }

    pub fn get(&self) -> f32 {
        self.value.get()
    }

    pub fn set(&self, value: f32) {
        if self.value.get() != value {
            self.value.set(value);
            self.dirty.set(true);
        }
    }

    /// Returns whether the value changed since the last call
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn consumer(&self) -> Consumer {
        let param = self.clone();
        Box::new(move |value| param.set(value))
    }

    /// Consumer that maps each written value through `f` before storing it
    pub fn consumer_with(&self, f: impl Fn(f32) -> f32 + 'static) -> Consumer {
        let param = self.clone();
        Box::new(move |value| param.set(f(value)))
    }
}
