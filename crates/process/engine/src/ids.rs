//! Typed arena indices
//!
//! Nodes reference each other through these indices instead of owning
//! pointers, so conditions can point at tasks and tasks at shared cells
//! without any reference cycles.

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }
    };
}

arena_id!(
    /// Index of a value cell or view
    ValueId
);
arena_id!(
    /// Index of a condition or event
    ConditionId
);
arena_id!(
    /// Index of a task or activity
    TaskId
);
arena_id!(
    /// Index of a process
    ProcessId
);
arena_id!(
    /// Index of a function reference
    FunctionId
);

/// Anything with a run action and a current state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunnableId {
    Task(TaskId),
    Process(ProcessId),
}

impl From<TaskId> for RunnableId {
    fn from(id: TaskId) -> Self {
        Self::Task(id)
    }
}

impl From<ProcessId> for RunnableId {
    fn from(id: ProcessId) -> Self {
        Self::Process(id)
    }
}
