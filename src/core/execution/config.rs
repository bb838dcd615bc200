//! Configuration for scheduler execution.
//!
//! Controls how the components of one phase are fanned out across workers.

use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Components of a phase run one after another on the calling thread
    Sequential,
    /// Components of a phase run concurrently on a Rayon pool
    #[default]
    Rayon,
}

/// Configuration for scheduler execution
///
/// Phases are barrier-separated in either mode; the mode only decides how the
/// work inside one phase is spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// Number of workers in a dedicated pool.
    /// `None` shares Rayon's global pool. Ignored in Sequential mode.
    pub thread_pool_size: Option<usize>,
}

impl SchedulerConfig {
    /// Create a new configuration with default values
    ///
    /// Default configuration uses Rayon mode on the global pool
    pub fn new() -> Self {
        Self {
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    /// Set the concurrency mode
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the number of workers in a dedicated pool
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new()
    }
}
