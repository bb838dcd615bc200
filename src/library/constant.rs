use crate::core::components::{Behavior, Component, FireResult};
use crate::core::values::ValueMap;

/// Emits every state entry on the output of the same name
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantBehavior;

impl Behavior for ConstantBehavior {
    fn fire(&self, _inputs: &ValueMap, states: &ValueMap) -> FireResult {
        let outputs = states
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok((outputs, states.clone()))
    }
}

/// A component emitting its states unchanged.
///
/// Set the emitted values with `set_state` and create a matching output port
/// for each of them.
pub fn constant() -> Component {
    Component::new(ConstantBehavior)
}
