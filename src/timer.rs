//! Stopwatch on the tokio clock, so paused test time drives it

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
    stopped: Option<Instant>,
}

impl Default for Timer {
    fn default() -> Self {
        Self::started()
    }
}

impl Timer {
    pub fn started() -> Self {
        Self {
            start: Instant::now(),
            stopped: None,
        }
    }

    pub fn start(&mut self) {
        self.stopped = None;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }

    /// Freezes `elapsed` at its current value until the next `start`
    pub fn stop(&mut self) {
        if self.stopped.is_none() {
            self.stopped = Some(Instant::now());
        }
    }

    pub fn is_running(&self) -> bool {
        self.stopped.is_none()
    }

    /// Seconds since the last start or reset
    pub fn elapsed(&self) -> f32 {
        let end = self.stopped.unwrap_or_else(Instant::now);
        end.duration_since(self.start).as_secs_f32()
    }
}
