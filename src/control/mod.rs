//! Discrete GPIO inputs

mod button;

pub use button::Button;
