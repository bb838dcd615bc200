use crate::core::errors::EngineError;
use crate::core::values::ValueMap;

/// Result of one firing: `(outputs, new_states)`
pub type FireResult = Result<(ValueMap, ValueMap), EngineError>;

/// The computation a component performs each step.
///
/// `fire` must depend only on its two arguments and must not touch anything
/// outside them. The exception is a behavior that drives components it owns
/// exclusively, as [`ComponentSet`](super::ComponentSet) does. Fire calls of
/// different components run concurrently with no ordering between them.
pub trait Behavior: Send + Sync {
    fn fire(&self, inputs: &ValueMap, states: &ValueMap) -> FireResult;

    /// Called by [`Component::fire`] with the component's latest input and
    /// output times. Only behaviors that drive other components need them.
    ///
    /// [`Component::fire`]: super::Component::fire
    fn fire_at(
        &self,
        _input_time: f64,
        _output_time: f64,
        inputs: &ValueMap,
        states: &ValueMap,
    ) -> FireResult {
        self.fire(inputs, states)
    }
}

impl<F> Behavior for F
where
    F: Fn(&ValueMap, &ValueMap) -> FireResult + Send + Sync,
{
    fn fire(&self, inputs: &ValueMap, states: &ValueMap) -> FireResult {
        self(inputs, states)
    }
}

/// Keeps the state and emits nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBehavior;

impl Behavior for DefaultBehavior {
    fn fire(&self, _inputs: &ValueMap, states: &ValueMap) -> FireResult {
        Ok((ValueMap::new(), states.clone()))
    }
}
