//! Macros for building `ValueMap`s and declaring ports.

/// Build a `ValueMap` from `key => value` pairs
///
/// # Example
/// ```rust
/// use dataflow_sim::value_map;
///
/// let states = value_map! { "gain" => 2.0f64, "label" => String::from("amp") };
/// assert_eq!(states.len(), 2);
/// ```
#[macro_export]
macro_rules! value_map {
    () => {
        $crate::core::values::ValueMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        {
            let mut map = $crate::core::values::ValueMap::new();
            $(
                map.set($key, $value);
            )+
            map
        }
    };
}

/// Declare typed input and output ports on a component
///
/// # Example
/// ```rust
/// use dataflow_sim::{component_ports, Component};
///
/// let adder = Component::default();
/// component_ports!(adder, inputs: [a: i32, b: i32], outputs: [sum: i32]);
/// assert!(adder.has_in_port("a"));
/// assert!(adder.has_out_port("sum"));
/// ```
#[macro_export]
macro_rules! component_ports {
    (
        $component:expr,
        $(inputs: [$($input:ident : $in_ty:ty),* $(,)?])?
        $(, outputs: [$($output:ident : $out_ty:ty),* $(,)?])?
        $(,)?
    ) => {
        {
            let component: &$crate::core::components::Component = &$component;
            $($(
                component.make_in_port::<$in_ty>(stringify!($input));
            )*)?
            $($(
                component.make_out_port::<$out_ty>(stringify!($output));
            )*)?
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::components::Component;

    #[test]
    fn test_value_map_macro() {
        let empty = value_map!();
        assert!(empty.is_empty());

        let map = value_map! { "a" => 1i32, "b" => String::from("two"), };
        assert_eq!(map.require_as::<i32>("a").unwrap(), &1);
        assert_eq!(map.require_as::<String>("b").unwrap(), "two");
    }

    #[test]
    fn test_component_ports_macro() {
        let component = Component::default();
        component_ports!(component, inputs: [x: f64, y: f64], outputs: [product: f64]);

        assert_eq!(component.in_port_ids(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(component.out_port_ids(), vec!["product".to_string()]);
        assert!(component.get_input("x").unwrap().is_type::<f64>());
        assert!(component.get_output("product").unwrap().is_type::<f64>());
    }
}
