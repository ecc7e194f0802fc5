//! Read-only views computed from other elements on every read

use crate::ids::{ConditionId, RunnableId, ValueId};
use serde::{Deserialize, Serialize};

/// A derived value. Views hold no data and are never buffered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// Boolean result of a condition
    Condition(ConditionId),
    /// Current state of a task or process, as its state name
    TaskState(RunnableId),
    /// Whether a cell's visible value changed in the current tick
    Changed(ValueId),
    /// Integer coercion of another value
    Index(ValueId),
}
