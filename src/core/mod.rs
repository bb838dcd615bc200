pub mod components;
pub mod errors;
pub mod execution;
pub mod ports;
pub(crate) mod sync;
pub mod types;
pub mod values;
