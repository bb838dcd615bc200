pub mod agent;
pub mod behavior;
pub mod component;
pub mod component_set;
pub mod module;

// Re-export commonly used types
pub use agent::Agent;
pub use behavior::{Behavior, DefaultBehavior, FireResult};
pub use component::{Component, Timing};
pub use component_set::ComponentSet;
pub use module::Module;
