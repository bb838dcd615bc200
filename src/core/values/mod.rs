pub mod typed_value;
pub mod value_map;

// Re-export commonly used types
pub use typed_value::TypedValue;
pub use value_map::ValueMap;
