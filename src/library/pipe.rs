use crate::core::components::{Behavior, Component, FireResult};
use crate::core::values::ValueMap;

/// Forwards inputs to outputs according to a routing table held in state.
///
/// Every state entry maps an input id (the key) to an output id (a `String`
/// value). Absent inputs forward the zero value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeBehavior;

impl Behavior for PipeBehavior {
    fn fire(&self, inputs: &ValueMap, states: &ValueMap) -> FireResult {
        let mut outputs = ValueMap::new();
        for (input_id, output_id) in states {
            let output_id = output_id.get::<String>()?;
            let value = inputs.get(input_id).cloned().unwrap_or_default();
            outputs.insert(output_id, value);
        }
        Ok((outputs, states.clone()))
    }
}

/// A pipe routing each `(input_id, output_id)` pair.
///
/// Ports are not created here; make them with the element type they carry.
pub fn pipe<'a>(routes: impl IntoIterator<Item = (&'a str, &'a str)>) -> Component {
    let component = Component::new(PipeBehavior);
    for (input_id, output_id) in routes {
        component.set_state(input_id, output_id.to_string());
    }
    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::EngineError;

    #[test]
    fn test_pipe_routes_inputs() {
        let component = pipe([("in", "out"), ("other", "copy")]);
        component.make_in_port::<f64>("in");
        component.make_out_port::<f64>("out");
        component.set_input("in", 1.5f64);
        component.fire().unwrap();

        assert_eq!(component.get_output("out").unwrap().cloned::<f64>().unwrap(), 1.5);
        // no "other" input: the zero value is forwarded
        assert_eq!(component.get_output("copy").unwrap().cloned::<i32>().unwrap(), 0);
    }

    #[test]
    fn test_pipe_rejects_non_string_route() {
        let component = pipe(Vec::<(&str, &str)>::new());
        component.set_state("in", 3i32);
        assert!(matches!(component.fire(), Err(EngineError::TypeMismatch { .. })));
    }
}
