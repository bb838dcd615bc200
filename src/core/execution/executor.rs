use super::config::{ConcurrencyMode, SchedulerConfig};
use crate::core::components::Component;
use crate::core::errors::EngineError;
use crate::core::types::Phase;
use log::trace;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Runs one phase over a list of components and returns once every component
/// has finished it.
///
/// Returning is the barrier between phases: nothing from the next phase starts
/// until `run` is back on the caller's thread.
#[derive(Debug)]
pub struct PhaseExecutor {
    mode: ConcurrencyMode,
    pool: Option<ThreadPool>,
}

impl PhaseExecutor {
    /// Build an executor for `config`, starting a dedicated pool if one is sized
    pub fn new(config: &SchedulerConfig) -> Result<Self, EngineError> {
        let pool = match (config.concurrency_mode, config.thread_pool_size) {
            (ConcurrencyMode::Rayon, Some(size)) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(size)
                    .thread_name(|index| format!("dataflow-worker-{}", index))
                    .build()?,
            ),
            _ => None,
        };
        Ok(Self {
            mode: config.concurrency_mode,
            pool,
        })
    }

    /// Executor on Rayon's global pool
    pub fn global() -> Self {
        Self {
            mode: ConcurrencyMode::Rayon,
            pool: None,
        }
    }

    pub fn sequential() -> Self {
        Self {
            mode: ConcurrencyMode::Sequential,
            pool: None,
        }
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Workers available to a phase
    pub fn num_workers(&self) -> usize {
        match (self.mode, &self.pool) {
            (ConcurrencyMode::Sequential, _) => 1,
            (ConcurrencyMode::Rayon, Some(pool)) => pool.current_num_threads(),
            (ConcurrencyMode::Rayon, None) => rayon::current_num_threads(),
        }
    }

    /// Apply `task` to every component.
    ///
    /// No order is guaranteed between components. The first error is returned,
    /// but components already running still finish their task.
    pub fn run<F>(&self, phase: Phase, components: &[Component], task: F) -> Result<(), EngineError>
    where
        F: Fn(&Component) -> Result<(), EngineError> + Send + Sync,
    {
        trace!("{} phase over {} components", phase, components.len());
        match (self.mode, &self.pool) {
            (ConcurrencyMode::Sequential, _) => components.iter().try_for_each(&task),
            (ConcurrencyMode::Rayon, Some(pool)) => {
                pool.install(|| components.par_iter().try_for_each(&task))
            }
            (ConcurrencyMode::Rayon, None) => components.par_iter().try_for_each(&task),
        }
    }
}

impl Default for PhaseExecutor {
    fn default() -> Self {
        Self::global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn components(n: usize) -> Vec<Component> {
        (0..n).map(|_| Component::default()).collect()
    }

    #[test]
    fn test_every_component_visited_once() {
        let list = components(64);
        for executor in [
            PhaseExecutor::sequential(),
            PhaseExecutor::global(),
            PhaseExecutor::new(&SchedulerConfig::new().with_thread_pool_size(3)).unwrap(),
        ] {
            let seen = Mutex::new(HashSet::new());
            executor
                .run(Phase::Fire, &list, |component| {
                    assert!(seen.lock().unwrap().insert(component.id()));
                    Ok(())
                })
                .unwrap();
            assert_eq!(seen.lock().unwrap().len(), 64);
        }
    }

    #[test]
    fn test_dedicated_pool_size() {
        let executor =
            PhaseExecutor::new(&SchedulerConfig::new().with_thread_pool_size(2)).unwrap();
        assert_eq!(executor.num_workers(), 2);
        assert_eq!(PhaseExecutor::sequential().num_workers(), 1);
    }

    #[test]
    fn test_pool_size_ignored_when_sequential() {
        let config = SchedulerConfig::new()
            .with_concurrency(ConcurrencyMode::Sequential)
            .with_thread_pool_size(8);
        let executor = PhaseExecutor::new(&config).unwrap();
        assert_eq!(executor.mode(), ConcurrencyMode::Sequential);
        assert_eq!(executor.num_workers(), 1);
    }

    #[test]
    fn test_error_is_propagated() {
        let list = components(16);
        let calls = AtomicUsize::new(0);
        let result = PhaseExecutor::global().run(Phase::Input, &list, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(EngineError::Behavior("boom".to_string()))
        });
        assert!(matches!(result, Err(EngineError::Behavior(_))));
        assert!(calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_empty_phase() {
        PhaseExecutor::global()
            .run(Phase::Output, &[], |_| Ok(()))
            .unwrap();
    }
}
