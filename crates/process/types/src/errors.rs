//! Error types for the process engine

use crate::ElementKind;

/// Errors that can occur while building or driving a process graph.
///
/// Configuration defects inside a running graph (dangling references,
/// missing behavior) are not errors: they resolve to inert sentinels and
/// show up as stalls. These variants cover misuse of the API.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: ElementKind, id: String },

    #[error("Unknown {kind}: {id}")]
    UnknownElement { kind: ElementKind, id: String },

    #[error("Element is invalid: {0}")]
    InvalidElement(String),

    #[error("Graph is sealed; cannot rewire {0}")]
    Sealed(String),

    #[error("Task is not an activity: {0}")]
    NotAnActivity(String),

    #[error("Task already has a parent: {0}")]
    AlreadyAttached(String),

    #[error("Adding child would create a cycle: {0}")]
    CycleDetected(String),

    #[error("Value is read-only: {0}")]
    ReadOnlyValue(String),

    #[error("Process already admitted: {0}")]
    AlreadyAdmitted(String),

    #[error("Container not found: {0}")]
    UnknownContainer(String),

    #[error("Duplicate container: {0}")]
    DuplicateContainer(String),

    #[error("Behavior already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),

    #[error("Process '{process}' did not finish within {ticks} ticks")]
    Stalled { process: String, ticks: u64 },

    #[error("Interchange error: {0}")]
    Interchange(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProcessError {
    /// Failure reported by a task action
    pub fn action(message: impl Into<String>) -> Self {
        Self::ActionFailed(message.into())
    }
}

/// Result type alias for process engine operations
pub type ProcessResult<T> = Result<T, ProcessError>;
