//! Declarative macros for building value maps and component ports.

pub mod value_macros;
