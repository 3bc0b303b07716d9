use super::motor::Motor;
use crate::rig::{split_key, BindingError, Consumer, Output, Param};
use crate::timer::Timer;
use crate::wiring::DeviceError;
use std::cell::Cell;
use std::f32::consts::PI;
use std::rc::Rc;
use tracing::{debug, info};

const MIN_PERIOD: f32 = 1e-3;

/// Dancing stops once the period has shrunk to this fraction of its start
const DANCE_FLOOR: f32 = 1.0 / 16.0;

/// Resolves a bare control name against the ones `kind` accepts
fn control<'a>(kind: &'static str, key: &str, known: &[&'a str]) -> Result<&'a str, BindingError> {
    let (control, component) = split_key(key);
    let name = known
        .iter()
        .find(|name| **name == control)
        .copied()
        .ok_or_else(|| BindingError::UnknownControl {
            kind,
            key: key.to_string(),
        })?;
    if component.is_some() {
        return Err(BindingError::UnexpectedComponent { kind, control });
    }
    Ok(name)
}

fn period_consumer(period: &Param) -> Consumer {
    period.consumer_with(|v| v.max(MIN_PERIOD))
}

/// Holds one speed; writes only when it changes
pub struct ConstantMotor {
    motor: Motor,
    value: Param,
}

impl ConstantMotor {
    const KIND: &'static str = "constant motor";

    pub fn new(motor: Motor, value: f32) -> Self {
        Self {
            motor,
            value: Param::new(value),
        }
    }

    pub fn motor(&self) -> &Motor {
        &self.motor
    }
}

impl Output for ConstantMotor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
        control(Self::KIND, key, &["value"])?;
        Ok(self.value.consumer())
    }

    fn step(&mut self) -> Result<(), DeviceError> {
        if self.value.take_dirty() {
            self.motor.set(self.value.get())?;
        }
        Ok(())
    }
}

/// Sine sweep of `max` amplitude, restarted every period
pub struct OscillatingMotor {
    motor: Motor,
    max: Param,
    period: Param,
    timer: Timer,
}

impl OscillatingMotor {
    const KIND: &'static str = "oscillating motor";

    pub fn new(motor: Motor, max: f32, period: f32) -> Self {
        Self {
            motor,
            max: Param::new(max),
            period: Param::new(period.max(MIN_PERIOD)),
            timer: Timer::started(),
        }
    }

    pub fn motor(&self) -> &Motor {
        &self.motor
    }
}

impl Output for OscillatingMotor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
        match control(Self::KIND, key, &["period", "max"])? {
            "period" => Ok(period_consumer(&self.period)),
            _ => Ok(self.max.consumer()),
        }
    }

    fn step(&mut self) -> Result<(), DeviceError> {
        let period = self.period.get();
        let elapsed = self.timer.elapsed();
        let mut value = (2.0 * PI / period * elapsed).sin();
        if elapsed > period {
            self.timer.reset();
            value = 0.0;
        }
        self.motor.set(value * self.max.get())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DancePhase {
    /// Waiting for the first step
    Idle,
    Dancing,
    /// Holding still until restarted
    Stopped,
}

/// Oscillation whose period halves every two starting periods, then rests
pub struct DancingMotor {
    motor: Motor,
    start_period: Param,
    restart: Rc<Cell<bool>>,
    phase: DancePhase,
    start: f32,
    period: f32,
    timer: Timer,
}

impl DancingMotor {
    const KIND: &'static str = "dancing motor";

    pub fn new(motor: Motor, period: f32) -> Self {
        let period = period.max(MIN_PERIOD);
        Self {
            motor,
            start_period: Param::new(period),
            restart: Rc::new(Cell::new(false)),
            phase: DancePhase::Idle,
            start: period,
            period,
            timer: Timer::started(),
        }
    }

    pub fn motor(&self) -> &Motor {
        &self.motor
    }

    pub fn phase(&self) -> DancePhase {
        self.phase
    }

    /// Current oscillation period in seconds
    pub fn period(&self) -> f32 {
        self.period
    }

    fn begin(&mut self) {
        self.start_period.take_dirty();
        self.start = self.start_period.get();
        self.period = self.start;
        self.timer.start();
        self.phase = DancePhase::Dancing;
        debug!("Dance started with period {}s", self.start);
    }
}

impl Output for DancingMotor {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
        match control(Self::KIND, key, &["period", "restart"])? {
            "period" => Ok(period_consumer(&self.start_period)),
            _ => {
                let flag = self.restart.clone();
                Ok(Box::new(move |value| {
                    if value >= 0.5 {
                        flag.set(true);
                    }
                }))
            }
        }
    }

    fn step(&mut self) -> Result<(), DeviceError> {
        let restart = self.restart.replace(false);
        match self.phase {
            DancePhase::Idle => self.begin(),
            DancePhase::Stopped if restart => self.begin(),
            DancePhase::Stopped => return self.motor.set(0.0),
            DancePhase::Dancing => {
                if self.start_period.take_dirty() {
                    self.start = self.start_period.get();
                    self.period = self.start;
                    debug!("Dance period changed to {}s", self.start);
                }
            }
        }

        let elapsed = self.timer.elapsed();
        let mut value = (2.0 * PI / self.period * elapsed).sin();
        if elapsed > self.start * 2.0 {
            self.timer.reset();
            value = 0.0;
            self.period /= 2.0;
        }

        if self.period <= self.start * DANCE_FLOOR {
            self.timer.stop();
            self.phase = DancePhase::Stopped;
            value = 0.0;
            info!("Dance finished");
        }

        self.motor.set(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::MotorName;
    use crate::wiring::{Backend, SimulatedBench};
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn motor() -> Motor {
        let backend = Backend::simulated(SimulatedBench::new());
        Motor::open(&backend, MotorName::Ms18, &[5]).unwrap()
    }

    async fn advance(seconds: f32) {
        tokio::time::advance(Duration::from_secs_f32(seconds)).await;
    }

    #[test]
    fn constant_writes_on_change() {
        let mut constant = ConstantMotor::new(motor(), 0.5);
        constant.step().unwrap();
        assert_eq!(constant.motor().value(), 0.5);

        constant.consumer("value").unwrap()(-0.25);
        constant.step().unwrap();
        assert_eq!(constant.motor().value(), -0.25);

        assert!(matches!(
            constant.consumer("max"),
            Err(BindingError::UnknownControl { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn oscillator_follows_a_sine_and_resets() {
        let mut osc = OscillatingMotor::new(motor(), 0.5, 4.0);

        advance(1.0).await;
        osc.step().unwrap();
        assert_relative_eq!(osc.motor().value(), 0.5, epsilon = 1e-4);

        advance(2.0).await;
        osc.step().unwrap();
        assert_relative_eq!(osc.motor().value(), -0.5, epsilon = 1e-4);

        advance(1.5).await;
        osc.step().unwrap();
        assert_eq!(osc.motor().value(), 0.0);

        // Timer restarted at the reset
        advance(1.0).await;
        osc.consumer("max").unwrap()(1.0);
        osc.step().unwrap();
        assert_relative_eq!(osc.motor().value(), 1.0, epsilon = 1e-4);
    }

    #[tokio::test(start_paused = true)]
    async fn dance_halves_its_period_then_rests() {
        let mut dance = DancingMotor::new(motor(), 1.0);
        assert_eq!(dance.phase(), DancePhase::Idle);

        dance.step().unwrap();
        assert_eq!(dance.phase(), DancePhase::Dancing);
        assert_eq!(dance.period(), 1.0);

        advance(0.25).await;
        dance.step().unwrap();
        assert_relative_eq!(dance.motor().value(), 1.0, epsilon = 1e-4);

        let mut expected = 1.0;
        for _ in 0..3 {
            advance(2.1).await;
            dance.step().unwrap();
            expected /= 2.0;
            assert_eq!(dance.period(), expected);
            assert_eq!(dance.motor().value(), 0.0);
            assert_eq!(dance.phase(), DancePhase::Dancing);
        }

        advance(2.5).await;
        dance.step().unwrap();
        assert_eq!(dance.period(), 1.0 / 16.0);
        assert_eq!(dance.phase(), DancePhase::Stopped);
        assert_eq!(dance.motor().value(), 0.0);

        for _ in 0..5 {
            advance(0.3).await;
            dance.step().unwrap();
            assert_eq!(dance.motor().value(), 0.0);
            assert_eq!(dance.phase(), DancePhase::Stopped);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn period_writes_apply_while_dancing() {
        let mut dance = DancingMotor::new(motor(), 1.0);
        dance.step().unwrap();

        dance.consumer("period").unwrap()(0.25);
        advance(0.0625).await;
        dance.step().unwrap();
        assert_eq!(dance.period(), 0.25);
        assert_eq!(dance.phase(), DancePhase::Dancing);
        // Same timer, new period: a quarter of 0.25s is the crest
        assert_relative_eq!(dance.motor().value(), 1.0, epsilon = 1e-4);

        // Halving is now measured against the new start
        advance(0.45).await;
        dance.step().unwrap();
        assert_eq!(dance.period(), 0.125);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_the_period() {
        let mut dance = DancingMotor::new(motor(), 0.5);
        dance.step().unwrap();
        for _ in 0..4 {
            advance(1.5).await;
            dance.step().unwrap();
        }
        assert_eq!(dance.phase(), DancePhase::Stopped);

        // Small writes do not count as a restart
        dance.consumer("restart").unwrap()(0.2);
        dance.step().unwrap();
        assert_eq!(dance.phase(), DancePhase::Stopped);

        dance.consumer("period").unwrap()(2.0);
        dance.consumer("restart").unwrap()(1.0);
        dance.step().unwrap();
        assert_eq!(dance.phase(), DancePhase::Dancing);
        assert_eq!(dance.period(), 2.0);

        advance(0.5).await;
        dance.step().unwrap();
        assert_relative_eq!(dance.motor().value(), 1.0, epsilon = 1e-4);
    }
}
