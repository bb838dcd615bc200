use crate::core::components::{Component, DefaultBehavior};

/// A component that swallows whatever arrives on its input ports
pub fn null() -> Component {
    Component::new(DefaultBehavior)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_emits_nothing() {
        let component = null();
        component.make_in_port::<i32>("in");
        component.set_input("in", 5i32);
        component.fire().unwrap();
        assert!(component.outputs().is_empty());
    }
}
