//! A dataflow execution engine.
//!
//! Components with private state and a pure behavior function are wired
//! together through named ports, grouped into nested modules under an
//! [`Agent`], and stepped through virtual time by a [`Scheduler`].

pub mod core;
pub mod library;
pub mod macros;

// Re-export commonly used types
pub use crate::core::components::{
    Agent, Behavior, Component, ComponentSet, FireResult, Module, Timing,
};
pub use crate::core::errors::{EngineError, LookupKind};
pub use crate::core::execution::{
    ConcurrencyMode, RealTimeSyncScheduler, Scheduler, SchedulerConfig, VirtualTimeScheduler,
    VirtualTimeSyncScheduler,
};
pub use crate::core::ports::{connect, Port, PortCallback, Unit};
pub use crate::core::types::{ComponentId, ModuleId, Phase};
pub use crate::core::values::{TypedValue, ValueMap};
