use super::config::SchedulerConfig;
use super::executor::PhaseExecutor;
use super::scheduler::{Scheduler, SchedulerCore};
use crate::core::components::Agent;
use crate::core::errors::EngineError;
use crate::core::types::Phase;
use log::debug;

/// Fixed-interval scheduler with a barrier between every phase.
///
/// One step is:
/// 1. `input(t)` on every component,
/// 2. `fire()` on every component,
/// 3. `t += interval`, done once on the driving thread,
/// 4. `output(t)` on every component.
///
/// Each phase completes for all components before the next begins, so a
/// component only ever observes what its upstream emitted on the previous step.
#[derive(Debug)]
pub struct VirtualTimeSyncScheduler {
    core: SchedulerCore,
    interval: f64,
}

impl VirtualTimeSyncScheduler {
    /// Scheduler on Rayon's global pool
    pub fn new(agent: Agent, interval: f64) -> Self {
        let mut scheduler = Self {
            core: SchedulerCore::with_executor(PhaseExecutor::global()),
            interval,
        };
        scheduler.set_agent(agent);
        scheduler
    }

    pub fn with_config(
        agent: Agent,
        interval: f64,
        config: &SchedulerConfig,
    ) -> Result<Self, EngineError> {
        let mut scheduler = Self {
            core: SchedulerCore::new(config)?,
            interval,
        };
        scheduler.set_agent(agent);
        Ok(scheduler)
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn set_interval(&mut self, interval: f64) {
        self.interval = interval;
    }
}

impl Scheduler for VirtualTimeSyncScheduler {
    fn core(&self) -> &SchedulerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SchedulerCore {
        &mut self.core
    }

    fn step(&mut self) -> Result<f64, EngineError> {
        let core = &mut self.core;
        let now = core.time();
        debug!("=== Step {} (t = {}) ===", core.num_steps() + 1, now);

        core.executor()
            .run(Phase::Input, core.components(), |component| component.input(now))?;
        core.executor()
            .run(Phase::Fire, core.components(), |component| component.fire())?;

        *core.time_mut() += self.interval;
        let next = core.time();

        core.executor()
            .run(Phase::Output, core.components(), |component| component.output(next))?;
        core.record_step();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::{Component, FireResult};
    use crate::core::execution::config::ConcurrencyMode;
    use crate::core::ports::connect;
    use crate::core::values::ValueMap;

    fn emitter(value: i32) -> Component {
        let component = Component::new(move |_: &ValueMap, states: &ValueMap| -> FireResult {
            let mut outputs = ValueMap::new();
            outputs.set("out", value);
            Ok((outputs, states.clone()))
        });
        component.make_out_port::<i32>("out");
        component
    }

    fn recorder() -> Component {
        let component = Component::default();
        component.make_in_port::<i32>("in");
        component
    }

    fn pipe_agent() -> (Agent, Component, Component) {
        let a = emitter(7);
        let b = recorder();
        connect(&a, "out", &b, "in").unwrap();
        let agent = Agent::new();
        agent.add_component("a", a.clone());
        agent.add_component("b", b.clone());
        (agent, a, b)
    }

    #[test]
    fn test_one_step_latency() {
        let (agent, _a, b) = pipe_agent();
        let mut scheduler = VirtualTimeSyncScheduler::new(agent, 1.0);

        assert_eq!(scheduler.step().unwrap(), 1.0);
        assert_eq!(b.get_input("in").unwrap().cloned::<i32>().unwrap(), 0);

        assert_eq!(scheduler.step().unwrap(), 2.0);
        assert_eq!(b.get_input("in").unwrap().cloned::<i32>().unwrap(), 7);
        assert_eq!(scheduler.num_steps(), 2);
    }

    #[test]
    fn test_timestamps_follow_clock() {
        let (agent, a, b) = pipe_agent();
        let mut scheduler = VirtualTimeSyncScheduler::new(agent, 0.5);
        scheduler.run(3).unwrap();
        assert_eq!(scheduler.current_time(), 1.5);
        for component in [&a, &b] {
            assert_eq!(component.last_input_time(), 1.0);
            assert_eq!(component.last_output_time(), 1.5);
        }
    }

    #[test]
    fn test_all_concurrency_modes_agree() {
        for config in [
            SchedulerConfig::new().with_concurrency(ConcurrencyMode::Sequential),
            SchedulerConfig::new(),
            SchedulerConfig::new().with_thread_pool_size(4),
        ] {
            let (agent, _a, b) = pipe_agent();
            let mut scheduler = VirtualTimeSyncScheduler::with_config(agent, 1.0, &config).unwrap();
            scheduler.run(2).unwrap();
            assert_eq!(b.get_input("in").unwrap().cloned::<i32>().unwrap(), 7);
        }
    }

    #[test]
    fn test_empty_agent_still_advances_clock() {
        let mut scheduler = VirtualTimeSyncScheduler::new(Agent::new(), 2.0);
        assert_eq!(scheduler.step().unwrap(), 2.0);
        assert_eq!(scheduler.step().unwrap(), 4.0);
    }

    #[test]
    fn test_failed_fire_keeps_clock() {
        let failing = Component::new(|_: &ValueMap, _: &ValueMap| -> FireResult {
            Err(EngineError::Behavior("broken".to_string()))
        });
        let agent = Agent::new();
        agent.add_component("f", failing);
        let mut scheduler = VirtualTimeSyncScheduler::new(agent, 1.0);
        assert!(matches!(scheduler.step(), Err(EngineError::Behavior(_))));
        assert_eq!(scheduler.current_time(), 0.0);
        assert_eq!(scheduler.num_steps(), 0);
    }
}
