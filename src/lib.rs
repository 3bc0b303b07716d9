//! Physical I/O rig: reads controller and button inputs, runs them through
//! small arithmetic expressions and drives LEDs and motors on a fixed tick.

pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod light;
pub mod motor;
pub mod rig;
pub mod scheduler;
pub mod script;
pub mod timer;
pub mod wiring;

pub use error::{RigError, RigResult};
pub use rig::Rig;
pub use scheduler::Scheduler;
