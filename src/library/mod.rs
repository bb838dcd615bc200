//! Ready-made component behaviors.
//!
//! These are plain [`Behavior`](crate::core::components::Behavior) implementations;
//! the engine treats them like any user-supplied behavior.

pub mod constant;
pub mod null;
pub mod pipe;

pub use constant::{constant, ConstantBehavior};
pub use null::null;
pub use pipe::{pipe, PipeBehavior};
