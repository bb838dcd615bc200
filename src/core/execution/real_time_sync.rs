use super::config::SchedulerConfig;
use super::executor::PhaseExecutor;
use super::scheduler::{Scheduler, SchedulerCore};
use crate::core::components::Agent;
use crate::core::errors::EngineError;
use crate::core::types::Phase;
use log::{debug, warn};
use std::thread;
use std::time::{Duration, Instant};

/// Barrier-synchronized scheduler paced by the wall clock.
///
/// Times are seconds elapsed since the agent was attached. One step is
/// `input(t_in)` and `fire()` on every component, then a sleep until at least
/// `interval` has passed since `t_in`, then `output(t_out)` on every
/// component. If firing alone takes longer than `interval`, the step does not
/// sleep and [`RealTimeSyncScheduler::lagged`] reports it.
#[derive(Debug)]
pub struct RealTimeSyncScheduler {
    core: SchedulerCore,
    interval: Duration,
    epoch: Instant,
    last_input_time: f64,
    last_output_time: f64,
    last_spent: Duration,
    lagged: bool,
}

impl RealTimeSyncScheduler {
    /// Scheduler on Rayon's global pool
    pub fn new(agent: Agent, interval: Duration) -> Self {
        Self::with_core(
            SchedulerCore::with_executor(PhaseExecutor::global()),
            agent,
            interval,
        )
    }

    pub fn with_config(
        agent: Agent,
        interval: Duration,
        config: &SchedulerConfig,
    ) -> Result<Self, EngineError> {
        Ok(Self::with_core(SchedulerCore::new(config)?, agent, interval))
    }

    fn with_core(core: SchedulerCore, agent: Agent, interval: Duration) -> Self {
        let mut scheduler = Self {
            core,
            interval,
            epoch: Instant::now(),
            last_input_time: 0.0,
            last_output_time: 0.0,
            last_spent: Duration::ZERO,
            lagged: false,
        };
        scheduler.set_agent(agent);
        scheduler
    }

    /// Minimum wall time between the input and output phases of a step
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// When the last step's input phase started
    pub fn last_input_time(&self) -> f64 {
        self.last_input_time
    }

    /// When the last step's output phase started
    pub fn last_output_time(&self) -> f64 {
        self.last_output_time
    }

    /// Wall time the last step spent in its input and fire phases
    pub fn last_spent(&self) -> Duration {
        self.last_spent
    }

    /// Whether the last step's fire phase overran `interval`
    pub fn lagged(&self) -> bool {
        self.lagged
    }

    fn elapsed(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn restart_clock(&mut self) {
        self.epoch = Instant::now();
        self.last_input_time = 0.0;
        self.last_output_time = 0.0;
        self.last_spent = Duration::ZERO;
        self.lagged = false;
    }
}

impl Scheduler for RealTimeSyncScheduler {
    fn core(&self) -> &SchedulerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SchedulerCore {
        &mut self.core
    }

    fn step(&mut self) -> Result<f64, EngineError> {
        let started = Instant::now();
        let input_time = started
            .duration_since(self.epoch)
            .as_secs_f64()
            .max(self.core.time());
        self.last_input_time = input_time;
        *self.core.time_mut() = input_time;
        debug!("=== Step {} (t = {:.6}s) ===", self.core.num_steps() + 1, input_time);

        let core = &self.core;
        core.executor()
            .run(Phase::Input, core.components(), |component| component.input(input_time))?;
        core.executor()
            .run(Phase::Fire, core.components(), |component| component.fire())?;

        self.last_spent = started.elapsed();
        match self.interval.checked_sub(self.last_spent) {
            Some(remaining) if !remaining.is_zero() => {
                self.lagged = false;
                thread::sleep(remaining);
            }
            Some(_) => self.lagged = false,
            None => {
                self.lagged = true;
                warn!(
                    "step {} lagged: firing took {:?}, interval is {:?}",
                    self.core.num_steps() + 1,
                    self.last_spent,
                    self.interval
                );
            }
        }

        let output_time = self.elapsed().max(input_time);
        self.last_output_time = output_time;
        *self.core.time_mut() = output_time;

        let core = &self.core;
        core.executor()
            .run(Phase::Output, core.components(), |component| component.output(output_time))?;
        self.core.record_step();
        Ok(output_time)
    }

    fn set_agent(&mut self, agent: Agent) {
        self.core.set_agent(agent);
        self.restart_clock();
    }

    fn reset(&mut self) {
        self.core.reset();
        self.restart_clock();
    }
}
