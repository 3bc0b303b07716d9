//! Fixed-period tick loop
//!
//! One tick polls every input, runs every connection, steps every output and
//! then sleeps out the rest of the period. A tick that overruns is not made
//! up for; the next one simply starts right away.

use crate::error::RigResult;
use crate::rig::Rig;
use statum::{machine, state};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[state]
#[derive(Debug, Clone)]
pub enum SchedulerState {
    Configured, // Rig built, not ticking yet
    Running,    // Ticking on the period
    Stopped,    // Loop left, rig still owned
}

/// Timing counters collected while running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub overruns: u64,
    /// Time spent inside tick bodies
    pub busy: Duration,
    /// Time spent sleeping between ticks
    pub slept: Duration,
    pub longest: Duration,
}

impl TickStats {
    fn record(&mut self, busy: Duration, slept: Duration) {
        self.ticks += 1;
        self.busy += busy;
        self.slept += slept;
        self.longest = self.longest.max(busy);
        if slept.is_zero() {
            self.overruns += 1;
        }
    }
}

#[machine]
pub struct Scheduler<S: SchedulerState> {
    rig: Rig,
    period: Duration,
    stats: TickStats,
}

impl<S: SchedulerState> Scheduler<S> {
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }
}

impl Scheduler<Configured> {
    pub fn create(rig: Rig, period: Duration) -> Self {
        info!("Scheduler configured with a {:?} period", period);
        Self::new(rig, period, TickStats::default())
    }

    pub fn start(self) -> Scheduler<Running> {
        info!("Scheduler running");
        self.transition()
    }
}

impl Scheduler<Running> {
    /// Runs one tick and sleeps out the remainder of the period
    pub async fn tick(&mut self) -> RigResult<()> {
        let started = Instant::now();
        self.rig.tick()?;
        let busy = started.elapsed();

        let slept = match self.period.checked_sub(busy) {
            Some(rest) if !rest.is_zero() => {
                tokio::time::sleep(rest).await;
                rest
            }
            _ => {
                debug!("Tick overran: {:?} > {:?}", busy, self.period);
                Duration::ZERO
            }
        };
        self.stats.record(busy, slept);
        Ok(())
    }

    /// Ticks until `shutdown` is cancelled. The flag is only checked between
    /// ticks; a tick error stops the loop and is returned.
    pub async fn run_until_shutdown(
        mut self,
        shutdown: CancellationToken,
    ) -> RigResult<Scheduler<Stopped>> {
        while !shutdown.is_cancelled() {
            if let Err(e) = self.tick().await {
                error!("Tick {} failed: {}", self.stats.ticks + 1, e);
                return Err(e);
            }
        }

        info!("Shutdown requested after {} ticks", self.stats.ticks);
        Ok(self.stop())
    }

    pub fn stop(self) -> Scheduler<Stopped> {
        self.transition()
    }
}

impl Scheduler<Stopped> {
    pub fn into_rig(self) -> Rig {
        let stats = self.stats;
        info!(
            "Scheduler stopped: {} ticks, {} overruns, longest tick {:?}",
            stats.ticks, stats.overruns, stats.longest
        );
        self.rig
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rig::{BindingError, Consumer, Output};
    use crate::wiring::DeviceError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Output that blocks for `delay` on every step and counts the calls
    struct Busy {
        delay: Duration,
        steps: Rc<Cell<u32>>,
    }

    impl Output for Busy {
        fn kind(&self) -> &'static str {
            "busy"
        }

        fn consumer(&self, key: &str) -> Result<Consumer, BindingError> {
            Err(BindingError::UnknownControl {
                kind: "busy",
                key: key.to_string(),
            })
        }

        fn step(&mut self) -> Result<(), DeviceError> {
            self.steps.set(self.steps.get() + 1);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            Ok(())
        }
    }

    fn scheduler(delay: Duration, period: Duration) -> (Scheduler<Running>, Rc<Cell<u32>>) {
        let steps = Rc::new(Cell::new(0));
        let mut rig = Rig::new();
        rig.add_output(
            "busy",
            Box::new(Busy {
                delay,
                steps: steps.clone(),
            }),
        )
        .unwrap();
        (Scheduler::create(rig, period).start(), steps)
    }

    #[tokio::test(start_paused = true)]
    async fn fast_ticks_are_paced_to_the_period() {
        let period = Duration::from_millis(10);
        let (mut scheduler, steps) = scheduler(Duration::ZERO, period);

        let started = Instant::now();
        for _ in 0..5 {
            scheduler.tick().await.unwrap();
        }
        assert_eq!(started.elapsed(), period * 5);
        assert_eq!(steps.get(), 5);

        let stats = scheduler.stats();
        assert_eq!(stats.ticks, 5);
        assert_eq!(stats.overruns, 0);
        assert_eq!(stats.slept, period * 5);
    }

    #[tokio::test]
    async fn overruns_start_the_next_tick_immediately() {
        let period = Duration::from_millis(2);
        let body = Duration::from_millis(10);
        let (mut scheduler, _) = scheduler(body, period);

        let started = Instant::now();
        for _ in 0..3 {
            scheduler.tick().await.unwrap();
        }
        let elapsed = started.elapsed();
        assert!(elapsed >= body * 3);

        // Wall time is the sum of the bodies; no sleep makes up the lost periods
        let stats = scheduler.stats();
        assert!(elapsed < stats.busy + period, "{:?} vs {:?}", elapsed, stats.busy);
        assert_eq!(stats.overruns, 3);
        assert_eq!(stats.slept, Duration::ZERO);
        assert!(stats.longest >= body);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_stops_between_ticks() {
        let (scheduler, steps) = scheduler(Duration::ZERO, Duration::from_millis(5));
        let token = CancellationToken::new();

        let child = token.clone();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(22)).await;
            child.cancel();
        });

        let stopped = scheduler.run_until_shutdown(token).await.unwrap();
        canceller.await.unwrap();

        // Ticks end at 5, 10, 15, 20 and 25ms; the flag is seen after the fifth
        assert_eq!(stopped.stats().ticks, 5);
        assert_eq!(steps.get(), 5);
        let rig = stopped.into_rig();
        assert_eq!(rig.output_aliases().count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_token_runs_nothing() {
        let (scheduler, steps) = scheduler(Duration::ZERO, Duration::from_millis(5));
        let token = CancellationToken::new();
        token.cancel();
        let stopped = scheduler.run_until_shutdown(token).await.unwrap();
        assert_eq!(stopped.stats().ticks, 0);
        assert_eq!(steps.get(), 0);
    }
}
