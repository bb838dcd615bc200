use super::config::SchedulerConfig;
use super::event_queue::{Action, ActionQueue, ScheduledAction};
use super::executor::PhaseExecutor;
use super::scheduler::{Scheduler, SchedulerCore};
use crate::core::components::{Agent, Component};
use crate::core::errors::EngineError;
use crate::core::types::{ComponentId, Phase};
use log::{debug, trace};
use std::collections::HashSet;

/// Event-driven scheduler where every component keeps its own [`Timing`].
///
/// A component wakes at `offset`: it runs `input(t)` and `fire()`, then
/// publishes with `output` at `t + interval`, then sleeps for `sleep` before
/// waking again. All actions due at the same time form one round, run in three
/// phases: the emits' outputs, the wakes' inputs, then the wakes' fires.
///
/// An action that comes due again inside the round that just ran it (possible
/// with zero `interval` and `sleep`) is held over to the next round instead of
/// looping. Held-over actions go back in the queue no earlier than the clock,
/// and the clock never moves backwards.
///
/// [`Timing`]: crate::core::components::Timing
#[derive(Debug)]
pub struct VirtualTimeScheduler {
    core: SchedulerCore,
    queue: ActionQueue,
}

impl VirtualTimeScheduler {
    /// Scheduler on Rayon's global pool
    pub fn new(agent: Agent) -> Self {
        let mut scheduler = Self {
            core: SchedulerCore::with_executor(PhaseExecutor::global()),
            queue: ActionQueue::new(),
        };
        scheduler.set_agent(agent);
        scheduler
    }

    pub fn with_config(agent: Agent, config: &SchedulerConfig) -> Result<Self, EngineError> {
        let mut scheduler = Self {
            core: SchedulerCore::new(config)?,
            queue: ActionQueue::new(),
        };
        scheduler.set_agent(agent);
        Ok(scheduler)
    }

    /// Time of the next pending action, if any
    pub fn next_event_time(&self) -> Option<f64> {
        self.queue.peek_time()
    }

    /// Advance the clock by `interval` and run every round due by then.
    ///
    /// Actions held over from any of those rounds are put back at the new
    /// clock time, so they run in the first round after this call.
    pub fn step_by(&mut self, interval: f64) -> Result<f64, EngineError> {
        let target = self.core.time() + interval;
        let mut held_over = Vec::new();
        let mut result = Ok(());
        while let Some(next) = self.queue.peek_time() {
            if next > target {
                break;
            }
            result = self.run_round(next, &mut held_over);
            if result.is_err() {
                break;
            }
        }
        *self.core.time_mut() = target.max(self.core.time());
        let now = self.core.time();
        for scheduled in held_over {
            self.queue.requeue(scheduled, now);
        }
        result?;
        self.core.record_step();
        Ok(now)
    }

    fn seed(&mut self) {
        self.queue.clear();
        let now = self.core.time();
        for component in self.core.components() {
            let wake = component.timing().offset.max(now);
            self.queue.schedule(wake, component.clone(), Action::Wake);
        }
    }

    /// Run every action due at `time` as one round.
    ///
    /// An action that comes due again inside this round is moved to
    /// `held_over` instead of running twice. Actions whose component is no
    /// longer scheduled are dropped.
    fn run_round(
        &mut self,
        time: f64,
        held_over: &mut Vec<ScheduledAction>,
    ) -> Result<(), EngineError> {
        let scheduled_ids: HashSet<ComponentId> =
            self.core.components().iter().map(Component::id).collect();
        let mut emits: Vec<Component> = Vec::new();
        let mut wakes: Vec<Component> = Vec::new();
        let mut handled = HashSet::new();

        while let Some(scheduled) = self.queue.pop_at(time) {
            let id = scheduled.component.id();
            if !scheduled_ids.contains(&id) {
                trace!("dropping {:?} for detached {}", scheduled.action, id);
                continue;
            }
            if !handled.insert((id, scheduled.action)) {
                held_over.push(scheduled);
                continue;
            }
            let timing = scheduled.component.timing();
            match scheduled.action {
                Action::Wake => {
                    self.queue.schedule(
                        time + timing.interval,
                        scheduled.component.clone(),
                        Action::Emit,
                    );
                    wakes.push(scheduled.component);
                }
                Action::Emit => {
                    self.queue.schedule(
                        time + timing.sleep,
                        scheduled.component.clone(),
                        Action::Wake,
                    );
                    emits.push(scheduled.component);
                }
            }
        }

        trace!(
            "round at t = {}: {} emitting, {} waking",
            time,
            emits.len(),
            wakes.len()
        );
        let executor = self.core.executor();
        executor.run(Phase::Output, &emits, |component| component.output(time))?;
        executor.run(Phase::Input, &wakes, |component| component.input(time))?;
        executor.run(Phase::Fire, &wakes, |component| component.fire())?;
        Ok(())
    }
}

impl Scheduler for VirtualTimeScheduler {
    fn core(&self) -> &SchedulerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SchedulerCore {
        &mut self.core
    }

    /// Jump to the next pending action time and run that round.
    ///
    /// The clock never moves backwards.
    fn step(&mut self) -> Result<f64, EngineError> {
        if let Some(next) = self.queue.peek_time() {
            let now = next.max(self.core.time());
            *self.core.time_mut() = now;
            debug!("=== Round {} (t = {}) ===", self.core.num_steps() + 1, next);
            let mut held_over = Vec::new();
            let result = self.run_round(next, &mut held_over);
            for scheduled in held_over {
                self.queue.requeue(scheduled, now);
            }
            result?;
        }
        self.core.record_step();
        Ok(self.core.time())
    }

    fn set_agent(&mut self, agent: Agent) {
        self.core.set_agent(agent);
        self.seed();
    }

    fn update(&mut self) {
        self.core.update();
        self.seed();
    }

    fn reset(&mut self) {
        self.core.reset();
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::{FireResult, Timing};
    use crate::core::ports::connect;
    use crate::core::values::ValueMap;

    fn ticker() -> Component {
        let component = Component::new(|_: &ValueMap, states: &ValueMap| -> FireResult {
            let ticks = states.require_as::<u32>("ticks")? + 1;
            let mut next = states.clone();
            next.set("ticks", ticks);
            let mut outputs = ValueMap::new();
            outputs.set("ticks", ticks);
            Ok((outputs, next))
        });
        component.make_state::<u32>("ticks");
        component.make_out_port::<u32>("ticks");
        component
    }

    #[test]
    fn test_step_jumps_between_events() {
        let fast = ticker();
        let slow = ticker();
        slow.set_timing(Timing::default().with_interval(3.0));
        let agent = Agent::new();
        agent.add_component("fast", fast.clone());
        agent.add_component("slow", slow.clone());

        let mut scheduler = VirtualTimeScheduler::new(agent);
        assert_eq!(scheduler.next_event_time(), Some(0.0));
        assert_eq!(scheduler.step().unwrap(), 0.0);
        assert_eq!(scheduler.step().unwrap(), 1.0);
        assert_eq!(scheduler.step().unwrap(), 2.0);
        assert_eq!(scheduler.step().unwrap(), 3.0);

        // fast woke at 0, 1, 2, 3; slow at 0 and 3
        assert_eq!(fast.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 4);
        assert_eq!(slow.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 2);
        let published = slow.get_out_port("ticks").unwrap().get_buffer();
        assert_eq!(published.cloned::<u32>().unwrap(), 1);
    }

    #[test]
    fn test_offset_and_sleep() {
        let component = ticker();
        component.set_timing(
            Timing::default()
                .with_offset(5.0)
                .with_interval(1.0)
                .with_sleep(2.0),
        );
        let agent = Agent::new();
        agent.add_component("c", component.clone());
        let mut scheduler = VirtualTimeScheduler::new(agent);

        assert_eq!(scheduler.step().unwrap(), 5.0); // wake
        assert_eq!(scheduler.step().unwrap(), 6.0); // emit
        assert_eq!(scheduler.step().unwrap(), 8.0); // wake after sleeping
        assert_eq!(component.last_input_time(), 8.0);
        assert_eq!(component.last_output_time(), 6.0);
    }

    #[test]
    fn test_step_by_runs_every_due_round() {
        let component = ticker();
        let agent = Agent::new();
        agent.add_component("c", component.clone());
        let mut scheduler = VirtualTimeScheduler::new(agent);

        assert_eq!(scheduler.step_by(2.5).unwrap(), 2.5);
        // woke at 0, 1 and 2
        assert_eq!(component.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 3);
        assert_eq!(scheduler.next_event_time(), Some(3.0));
        assert_eq!(scheduler.current_time(), 2.5);
    }

    #[test]
    fn test_zero_interval_does_not_livelock() {
        let component = ticker();
        component.set_timing(Timing::default().with_interval(0.0));
        let agent = Agent::new();
        agent.add_component("c", component.clone());
        let mut scheduler = VirtualTimeScheduler::new(agent);

        assert_eq!(scheduler.step().unwrap(), 0.0);
        assert_eq!(scheduler.step().unwrap(), 0.0);
        assert_eq!(scheduler.step_by(0.0).unwrap(), 0.0);
        assert!(component.get_state("ticks").unwrap().cloned::<u32>().unwrap() >= 3);
    }

    #[test]
    fn test_step_by_with_mixed_timings_runs_every_round() {
        let eager = ticker();
        eager.set_timing(Timing::default().with_interval(0.0));
        let steady = ticker();
        let agent = Agent::new();
        agent.add_component("eager", eager.clone());
        agent.add_component("steady", steady.clone());
        let mut scheduler = VirtualTimeScheduler::new(agent);

        assert_eq!(scheduler.step_by(2.5).unwrap(), 2.5);
        // steady still woke at 0, 1 and 2 despite eager being held over at 0
        assert_eq!(steady.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 3);
        assert_eq!(eager.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 1);
        assert_eq!(scheduler.next_event_time(), Some(2.5));

        assert_eq!(scheduler.step().unwrap(), 2.5);
        assert_eq!(eager.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 2);
        assert_eq!(eager.last_input_time(), 2.5);

        assert_eq!(scheduler.step_by(1.0).unwrap(), 3.5);
        assert_eq!(steady.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 4);
    }

    #[test]
    fn test_clock_never_decreases() {
        let eager = ticker();
        eager.set_timing(Timing::default().with_interval(0.0));
        let slow = ticker();
        slow.set_timing(Timing::default().with_offset(0.5).with_interval(2.0));
        let agent = Agent::new();
        agent.add_component("eager", eager);
        agent.add_component("slow", slow);
        let mut scheduler = VirtualTimeScheduler::new(agent);

        let mut times = vec![scheduler.current_time()];
        for round in 0..12 {
            let time = if round % 3 == 0 {
                scheduler.step_by(0.75).unwrap()
            } else {
                scheduler.step().unwrap()
            };
            times.push(time);
        }
        assert!(times.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", times);
        assert!(scheduler.current_time() >= 3.0);
    }

    #[test]
    fn test_detached_components_are_skipped() {
        let component = ticker();
        let agent = Agent::new();
        agent.add_component("c", component.clone());
        let mut scheduler = VirtualTimeScheduler::new(agent);

        // replace the schedule behind the scheduler's back
        scheduler.core_mut().set_agent(Agent::new());
        assert_eq!(scheduler.step().unwrap(), 0.0);
        assert_eq!(component.get_state("ticks").unwrap().cloned::<u32>().unwrap(), 0);
        assert_eq!(scheduler.next_event_time(), None);
    }

    #[test]
    fn test_pipeline_propagates_through_rounds() {
        let source = ticker();
        let sink = Component::default();
        sink.make_in_port::<u32>("in");
        connect(&source, "ticks", &sink, "in").unwrap();
        let agent = Agent::new();
        agent.add_component("source", source);
        agent.add_component("sink", sink.clone());

        let mut scheduler = VirtualTimeScheduler::new(agent);
        scheduler.step().unwrap(); // t = 0
        assert_eq!(sink.get_input("in").unwrap().cloned::<u32>().unwrap(), 0);
        scheduler.step().unwrap(); // t = 1: source emits 1, sink reads it
        assert_eq!(sink.get_input("in").unwrap().cloned::<u32>().unwrap(), 1);
    }

    #[test]
    fn test_reset_drops_pending_events() {
        let agent = Agent::new();
        agent.add_component("c", ticker());
        let mut scheduler = VirtualTimeScheduler::new(agent);
        scheduler.step().unwrap();
        scheduler.reset();
        assert_eq!(scheduler.next_event_time(), None);
        assert_eq!(scheduler.step().unwrap(), 0.0);
        assert!(scheduler.components().is_empty());
    }
}
