use super::behavior::{Behavior, DefaultBehavior};
use crate::core::errors::{EngineError, LookupKind};
use crate::core::ports::{Port, Unit};
use crate::core::sync::lock;
use crate::core::types::{ComponentId, Phase};
use crate::core::values::{TypedValue, ValueMap};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, Mutex};

/// When a component runs under the event-driven scheduler.
///
/// It first wakes at `offset`. Each wake emits its outputs `interval` later,
/// and the component sleeps for `sleep` after emitting before waking again.
/// The barrier-synchronized scheduler ignores this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub offset: f64,
    pub interval: f64,
    pub sleep: f64,
}

impl Timing {
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_sleep(mut self, sleep: f64) -> Self {
        self.sleep = sleep;
        self
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            offset: 0.0,
            interval: 1.0,
            sleep: 0.0,
        }
    }
}

struct ComponentCore {
    last_input_time: f64,
    last_output_time: f64,
    timing: Timing,
    inputs: ValueMap,
    states: ValueMap,
    outputs: ValueMap,
    behavior: Arc<dyn Behavior>,
}

/// A unit with input, state and output maps driven by a [`Behavior`].
///
/// Each step the scheduler calls, in order:
/// 1. [`Component::input`] syncs every input port and copies its buffer into `inputs`.
/// 2. [`Component::fire`] replaces `outputs` and `states` with the behavior's result.
/// 3. [`Component::output`] writes every `outputs` entry into the matching output port.
///
/// `Component` is a handle: clones share ports, maps and timestamps.
#[derive(Clone)]
pub struct Component {
    id: ComponentId,
    unit: Unit,
    core: Arc<Mutex<ComponentCore>>,
}

impl Component {
    pub fn new(behavior: impl Behavior + 'static) -> Self {
        Self {
            id: ComponentId::new(),
            unit: Unit::new(),
            core: Arc::new(Mutex::new(ComponentCore {
                last_input_time: 0.0,
                last_output_time: 0.0,
                timing: Timing::default(),
                inputs: ValueMap::new(),
                states: ValueMap::new(),
                outputs: ValueMap::new(),
                behavior: Arc::new(behavior),
            })),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn set_behavior(&self, behavior: impl Behavior + 'static) {
        lock(&self.core).behavior = Arc::new(behavior);
    }

    /// Create an input port and its `inputs` entry, both holding `T::default()`
    pub fn make_in_port<T: Default + Send + Sync + Clone + 'static>(&self, key: &str) -> Port {
        let port = self.unit.make_in_port::<T>(key);
        lock(&self.core).inputs.set(key, T::default());
        port
    }

    pub fn remove_in_port(&self, key: &str) -> Option<Port> {
        lock(&self.core).inputs.erase(key);
        self.unit.remove_in_port(key)
    }

    /// Create an output port and its `outputs` entry, both holding `T::default()`
    pub fn make_out_port<T: Default + Send + Sync + Clone + 'static>(&self, key: &str) -> Port {
        let port = self.unit.make_out_port::<T>(key);
        lock(&self.core).outputs.set(key, T::default());
        port
    }

    pub fn remove_out_port(&self, key: &str) -> Option<Port> {
        lock(&self.core).outputs.erase(key);
        self.unit.remove_out_port(key)
    }

    pub fn get_input(&self, key: &str) -> Result<TypedValue, EngineError> {
        lock(&self.core)
            .inputs
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::Input, key))
    }

    pub fn set_input<T: Send + Sync + Clone + 'static>(&self, key: &str, value: T) {
        lock(&self.core).inputs.set(key, value);
    }

    /// Add a state entry holding `T::default()`
    pub fn make_state<T: Default + Send + Sync + Clone + 'static>(&self, key: &str) {
        lock(&self.core).states.set(key, T::default());
    }

    pub fn get_state(&self, key: &str) -> Result<TypedValue, EngineError> {
        lock(&self.core)
            .states
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::State, key))
    }

    pub fn set_state<T: Send + Sync + Clone + 'static>(&self, key: &str, value: T) {
        lock(&self.core).states.set(key, value);
    }

    pub fn insert_state(&self, key: &str, value: TypedValue) {
        lock(&self.core).states.insert(key, value);
    }

    pub fn remove_state(&self, key: &str) {
        lock(&self.core).states.erase(key);
    }

    pub fn get_output(&self, key: &str) -> Result<TypedValue, EngineError> {
        lock(&self.core)
            .outputs
            .get(key)
            .cloned()
            .ok_or_else(|| EngineError::not_found(LookupKind::Output, key))
    }

    pub fn set_output<T: Send + Sync + Clone + 'static>(&self, key: &str, value: T) {
        lock(&self.core).outputs.set(key, value);
    }

    /// Snapshot of the `inputs` map
    pub fn inputs(&self) -> ValueMap {
        lock(&self.core).inputs.clone()
    }

    /// Snapshot of the `states` map
    pub fn states(&self) -> ValueMap {
        lock(&self.core).states.clone()
    }

    /// Snapshot of the `outputs` map
    pub fn outputs(&self) -> ValueMap {
        lock(&self.core).outputs.clone()
    }

    pub fn timing(&self) -> Timing {
        lock(&self.core).timing
    }

    pub fn set_timing(&self, timing: Timing) {
        lock(&self.core).timing = timing;
    }

    pub fn last_input_time(&self) -> f64 {
        lock(&self.core).last_input_time
    }

    pub fn last_output_time(&self) -> f64 {
        lock(&self.core).last_output_time
    }

    /// Pull every input port and copy its buffer into `inputs`.
    ///
    /// `time` must not be earlier than the previous input time. Port callbacks
    /// run after the copy, once the component is unlocked.
    pub fn input(&self, time: f64) -> Result<(), EngineError> {
        let mut synced = Vec::new();
        {
            let mut core = lock(&self.core);
            // Written as a negation so NaN is rejected too
            if !(time >= core.last_input_time) {
                return Err(EngineError::PreconditionViolation {
                    phase: Phase::Input,
                    time,
                    last: core.last_input_time,
                });
            }
            core.last_input_time = time;

            let unit = &self.unit;
            core.inputs.try_for_each(|key, value| {
                let port = unit.get_in_port(key)?;
                port.sync();
                *value = port.get_buffer();
                synced.push(port);
                Ok(())
            })?;
        }
        for port in &synced {
            port.invoke_callbacks();
        }
        Ok(())
    }

    /// Run the behavior and replace `outputs` and `states` with its result
    pub fn fire(&self) -> Result<(), EngineError> {
        let mut core = lock(&self.core);
        let (outputs, states) = core.behavior.fire_at(
            core.last_input_time,
            core.last_output_time,
            &core.inputs,
            &core.states,
        )?;
        core.outputs = outputs;
        core.states = states;
        Ok(())
    }

    /// Write every `outputs` entry into the output port of the same name.
    ///
    /// `time` must not be earlier than the previous output time. Callbacks of
    /// the written ports run afterwards, once the component is unlocked.
    pub fn output(&self, time: f64) -> Result<(), EngineError> {
        let mut written = Vec::new();
        {
            let mut core = lock(&self.core);
            if !(time >= core.last_output_time) {
                return Err(EngineError::PreconditionViolation {
                    phase: Phase::Output,
                    time,
                    last: core.last_output_time,
                });
            }
            core.last_output_time = time;

            for (key, value) in &core.outputs {
                let port = self.unit.get_out_port(key)?;
                port.set_buffer(value.clone());
                written.push(port);
            }
        }
        for port in &written {
            port.invoke_callbacks();
        }
        Ok(())
    }

    /// Clear both step timestamps. State is left alone.
    pub fn reset(&self) {
        let mut core = lock(&self.core);
        core.last_input_time = 0.0;
        core.last_output_time = 0.0;
    }

    /// Whether both handles refer to the same component
    pub fn ptr_eq(&self, other: &Component) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }
}

impl Default for Component {
    fn default() -> Self {
        Self::new(DefaultBehavior)
    }
}

impl Deref for Component {
    type Target = Unit;

    fn deref(&self) -> &Unit {
        &self.unit
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = lock(&self.core);
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("unit", &self.unit)
            .field("last_input_time", &core.last_input_time)
            .field("last_output_time", &core.last_output_time)
            .field("timing", &core.timing)
            .finish_non_exhaustive()
    }
}
