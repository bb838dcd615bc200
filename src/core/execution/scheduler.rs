use super::config::SchedulerConfig;
use super::executor::PhaseExecutor;
use crate::core::components::{Agent, Component};
use crate::core::errors::EngineError;
use log::debug;

/// State every scheduler carries: the attached agent, its flattened component
/// list, the virtual clock and the phase executor.
///
/// The component list is captured when the agent is attached. Restructuring
/// the agent later has no effect until `set_agent` or `update` is called, and
/// must never happen while a step is running.
#[derive(Debug)]
pub struct SchedulerCore {
    agent: Agent,
    components: Vec<Component>,
    time: f64,
    num_steps: u64,
    executor: PhaseExecutor,
}

impl SchedulerCore {
    pub fn new(config: &SchedulerConfig) -> Result<Self, EngineError> {
        Ok(Self::with_executor(PhaseExecutor::new(config)?))
    }

    pub fn with_executor(executor: PhaseExecutor) -> Self {
        Self {
            agent: Agent::new(),
            components: Vec::new(),
            time: 0.0,
            num_steps: 0,
            executor,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn executor(&self) -> &PhaseExecutor {
        &self.executor
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Mutable access to the virtual clock, for scheduler implementations
    pub fn time_mut(&mut self) -> &mut f64 {
        &mut self.time
    }

    pub fn num_steps(&self) -> u64 {
        self.num_steps
    }

    pub fn record_step(&mut self) {
        self.num_steps += 1;
    }

    /// Reset the current agent, then adopt and flatten `agent`
    pub fn set_agent(&mut self, agent: Agent) {
        self.reset();
        self.components = agent.get_all_components();
        self.agent = agent;
        debug!(
            "attached {} with {} components",
            self.agent.id(),
            self.components.len()
        );
    }

    /// Re-flatten the current agent without resetting it
    pub fn update(&mut self) {
        self.components = self.agent.get_all_components();
        debug!("re-flattened {} into {} components", self.agent.id(), self.components.len());
    }

    /// Reset the agent's components, detach it, and zero the clock
    pub fn reset(&mut self) {
        self.components.clear();
        self.agent.reset();
        self.agent = Agent::new();
        self.time = 0.0;
        self.num_steps = 0;
    }
}

/// Drives an agent forward in virtual time.
///
/// Steps are not interruptible: a step either runs all of its phases or
/// fails part-way. After a failed step, call `reset` (or re-attach the agent)
/// before stepping again. To stop a run, stop calling `step` between steps.
pub trait Scheduler {
    fn core(&self) -> &SchedulerCore;

    fn core_mut(&mut self) -> &mut SchedulerCore;

    /// Advance by one step and return the new virtual time
    fn step(&mut self) -> Result<f64, EngineError>;

    fn set_agent(&mut self, agent: Agent) {
        self.core_mut().set_agent(agent);
    }

    fn update(&mut self) {
        self.core_mut().update();
    }

    fn reset(&mut self) {
        self.core_mut().reset();
    }

    fn agent(&self) -> &Agent {
        self.core().agent()
    }

    fn components(&self) -> &[Component] {
        self.core().components()
    }

    fn current_time(&self) -> f64 {
        self.core().time()
    }

    fn num_steps(&self) -> u64 {
        self.core().num_steps()
    }

    /// Call `step` `steps` times and return the final virtual time
    fn run(&mut self, steps: u64) -> Result<f64, EngineError> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(self.current_time())
    }
}
