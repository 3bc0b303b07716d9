//! In-memory stand-in for the GPIO header and event devices.
//!
//! Used by `--simulate` dry runs and by tests. Pins are keyed by their
//! logical number and are claimed exclusively, like real GPIO lines.

use super::error::DeviceError;
use super::pin::{Drive, Line};
use super::source::ReplaySource;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug)]
struct LineState {
    claimed: bool,
    input_high: bool,
    last: Option<Drive>,
    writes: usize,
}

// Inputs idle high, like a line with its pull-up enabled
impl Default for LineState {
    fn default() -> Self {
        Self {
            claimed: false,
            input_high: true,
            last: None,
            writes: 0,
        }
    }
}

#[derive(Default)]
struct BenchState {
    lines: BTreeMap<u8, LineState>,
    sources: BTreeMap<String, ReplaySource>,
}

#[derive(Clone, Default)]
pub struct SimulatedBench {
    state: Rc<RefCell<BenchState>>,
}

impl SimulatedBench {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn claim(&self, pin: u8) -> Result<SimulatedLine, DeviceError> {
        let mut state = self.state.borrow_mut();
        let line = state.lines.entry(pin).or_default();
        if line.claimed {
            return Err(DeviceError::PinBusy(pin));
        }
        line.claimed = true;
        Ok(SimulatedLine {
            pin,
            state: self.state.clone(),
        })
    }

    /// Event source for controller `id`, created on first use
    pub fn source(&self, id: &str) -> ReplaySource {
        self.state
            .borrow_mut()
            .sources
            .entry(id.to_string())
            .or_default()
            .clone()
    }

    /// Queues raw event bytes for controller `id`
    pub fn feed(&self, id: &str, bytes: impl Into<Vec<u8>>) {
        self.source(id).push(bytes);
    }

    /// Sets the electrical level an input pin will read
    pub fn set_input(&self, pin: u8, high: bool) {
        self.state
            .borrow_mut()
            .lines
            .entry(pin)
            .or_default()
            .input_high = high;
    }

    pub fn last_drive(&self, pin: u8) -> Option<Drive> {
        self.state.borrow().lines.get(&pin).and_then(|line| line.last)
    }

    pub fn writes(&self, pin: u8) -> usize {
        self.state.borrow().lines.get(&pin).map_or(0, |line| line.writes)
    }

    pub fn is_claimed(&self, pin: u8) -> bool {
        self.state.borrow().lines.get(&pin).is_some_and(|line| line.claimed)
    }
}

pub struct SimulatedLine {
    pin: u8,
    state: Rc<RefCell<BenchState>>,
}

impl Line for SimulatedLine {
    fn write(&mut self, drive: Drive) -> Result<(), DeviceError> {
        let mut state = self.state.borrow_mut();
        let line = state.lines.entry(self.pin).or_default();
        line.last = Some(drive);
        line.writes += 1;
        Ok(())
    }

    fn is_high(&self) -> bool {
        self.state
            .borrow()
            .lines
            .get(&self.pin)
            .is_some_and(|line| line.input_high)
    }
}

impl Drop for SimulatedLine {
    fn drop(&mut self) {
        if let Some(line) = self.state.borrow_mut().lines.get_mut(&self.pin) {
            line.claimed = false;
            line.last = None;
        }
    }
}
