use crate::error::RigResult;
use crate::rig::{split_key, BindingError, Input, Producer};
use crate::wiring::{Backend, DeviceError, Pin, PinConfig, PinMode};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info};

const KIND: &str = "button";

/// Push button wired to ground with the pull-up enabled, so a press reads 1.
///
/// In momentary mode the value follows the button. In toggle mode every
/// press flips it.
pub struct Button {
    pin: Pin,
    toggle: bool,
    last: bool,
    value: Rc<Cell<bool>>,
}

impl Button {
    pub fn open(backend: &Backend, pin: u8, toggle: bool) -> Result<Self, DeviceError> {
        let pin = backend.open_pin(PinConfig::new(pin, PinMode::In).inverted(true))?;
        info!(
            "Button on pin {} ({})",
            pin.config().pin,
            if toggle { "toggle" } else { "momentary" }
        );
        Ok(Self {
            pin,
            toggle,
            last: false,
            value: Rc::new(Cell::new(false)),
        })
    }

    pub fn value(&self) -> bool {
        self.value.get()
    }
}

impl Input for Button {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn poll(&mut self) -> RigResult<()> {
        let pressed = self.pin.get() == 1.0;
        let value = self.value.get();

        if pressed && !self.last && (!self.toggle || !value) {
            self.value.set(true);
        } else if (!self.toggle && !pressed && self.last) || (pressed && !self.last && value) {
            self.value.set(false);
        }

        if pressed != self.last {
            debug!("Button on pin {} pressed: {}", self.pin.config().pin, pressed);
        }
        self.last = pressed;
        Ok(())
    }

    fn producer(&self, key: &str) -> Result<Producer, BindingError> {
        match split_key(key) {
            (control, None) if control == "value" => {
                let value = self.value.clone();
                Ok(Box::new(move || if value.get() { 1.0 } else { 0.0 }))
            }
            (control, Some(_)) if control == "value" => Err(BindingError::UnexpectedComponent {
                kind: KIND,
                control,
            }),
            _ => Err(BindingError::UnknownControl {
                kind: KIND,
                key: key.to_string(),
            }),
        }
    }
}
