pub mod config;
pub mod event_queue;
pub mod executor;
pub mod real_time_sync;
pub mod scheduler;
pub mod virtual_time;
pub mod virtual_time_sync;

// Re-export commonly used types
pub use config::{ConcurrencyMode, SchedulerConfig};
pub use executor::PhaseExecutor;
pub use real_time_sync::RealTimeSyncScheduler;
pub use scheduler::{Scheduler, SchedulerCore};
pub use virtual_time::VirtualTimeScheduler;
pub use virtual_time_sync::VirtualTimeSyncScheduler;
