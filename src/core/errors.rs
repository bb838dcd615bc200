use super::types::Phase;
use std::fmt;
use thiserror::Error;

/// What kind of name failed to resolve in a `NotFound` error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    InPort,
    OutPort,
    Key,
    Input,
    State,
    Output,
    Component,
    Submodule,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupKind::InPort => "input port",
            LookupKind::OutPort => "output port",
            LookupKind::Key => "key",
            LookupKind::Input => "input",
            LookupKind::State => "state",
            LookupKind::Output => "output",
            LookupKind::Component => "component",
            LookupKind::Submodule => "submodule",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by graph construction and step execution.
///
/// None of these are retried by the engine. They describe wiring or scheduling
/// mistakes that the caller has to fix.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A port, map entry or child was looked up under a name it does not have.
    #[error("{kind} '{key}' not found")]
    NotFound { kind: LookupKind, key: String },

    /// A `TypedValue` was read as a type other than the one it holds.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// `input`/`output` was called with a time earlier than the last one recorded.
    #[error("{phase} phase captured a time travel: {time} < {last}")]
    PreconditionViolation { phase: Phase, time: f64, last: f64 },

    /// Adding the submodule would make a module reachable from itself.
    #[error("submodule '{name}' would make the module contain itself")]
    CyclicComposition { name: String },

    /// The dedicated worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// Raised from inside a behavior function.
    #[error("behavior failed: {0}")]
    Behavior(String),
}

impl EngineError {
    pub fn not_found(kind: LookupKind, key: impl Into<String>) -> Self {
        EngineError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = EngineError::not_found(LookupKind::InPort, "in");
        assert_eq!(err.to_string(), "input port 'in' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_precondition_message() {
        let err = EngineError::PreconditionViolation {
            phase: Phase::Input,
            time: 1.0,
            last: 2.0,
        };
        assert!(err.to_string().contains("time travel"));
        assert!(!err.is_not_found());
    }
}
