//! Conditions: the boolean gates that drive every state transition
//!
//! A condition never changes state on its own; the task and process
//! machines ask it whether it is met. The one exception is
//! [`Condition::Sequenced`], whose cursor advances as it is evaluated.

use crate::ids::{ConditionId, FunctionId, ProcessId, RunnableId, ValueId};
use process_types::{Element, RunState};
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Evaluation strategy of a gate
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Condition {
    /// A registered nullary predicate. No predicate means never met.
    Standalone { predicate: Option<FunctionId> },

    /// Compare two values by content, optionally through a registered
    /// comparison and optionally negated
    Value {
        value: ValueId,
        expected: ValueId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comparison: Option<FunctionId>,
        #[serde(default)]
        negate: bool,
    },

    /// A runnable is in the expected state
    Task {
        runnable: RunnableId,
        expected: RunState,
    },

    /// Every child is met (an empty set is met)
    All { children: Vec<ConditionId> },

    /// Some child is met (an empty set is met)
    Any { children: Vec<ConditionId> },

    /// Children must be met one after another on successive evaluations.
    ///
    /// Only `children[cursor]` is evaluated. Success advances the cursor,
    /// failure rewinds it to zero, and once the cursor reaches the end the
    /// condition stays met until rewound.
    Sequenced {
        children: Vec<ConditionId>,
        #[serde(default)]
        cursor: Cell<usize>,
    },

    /// A gate bound to a process lifecycle
    Event(EventBinding),
}

impl Condition {
    /// A gate that is never met
    pub fn never() -> Self {
        Self::Standalone { predicate: None }
    }

    pub fn standalone(predicate: FunctionId) -> Self {
        Self::Standalone {
            predicate: Some(predicate),
        }
    }

    /// `value == expected`
    pub fn value(value: ValueId, expected: ValueId) -> Self {
        Self::Value {
            value,
            expected,
            comparison: None,
            negate: false,
        }
    }

    /// `value != expected`
    pub fn value_ne(value: ValueId, expected: ValueId) -> Self {
        Self::Value {
            value,
            expected,
            comparison: None,
            negate: true,
        }
    }

    /// Compare through a registered comparison
    pub fn compare(value: ValueId, expected: ValueId, comparison: FunctionId) -> Self {
        Self::Value {
            value,
            expected,
            comparison: Some(comparison),
            negate: false,
        }
    }

    /// The runnable has reached `Done`
    pub fn task(runnable: impl Into<RunnableId>) -> Self {
        Self::task_state(runnable, RunState::Done)
    }

    pub fn task_state(runnable: impl Into<RunnableId>, expected: RunState) -> Self {
        Self::Task {
            runnable: runnable.into(),
            expected,
        }
    }

    pub fn all(children: Vec<ConditionId>) -> Self {
        Self::All { children }
    }

    pub fn any(children: Vec<ConditionId>) -> Self {
        Self::Any { children }
    }

    pub fn sequenced(children: Vec<ConditionId>) -> Self {
        Self::Sequenced {
            children,
            cursor: Cell::new(0),
        }
    }

    /// Conditions evaluated by this one
    pub fn child_conditions(&self) -> Vec<ConditionId> {
        match self {
            Self::All { children } | Self::Any { children } | Self::Sequenced { children, .. } => {
                children.clone()
            }
            Self::Event(binding) => vec![binding.gate],
            Self::Standalone { .. } | Self::Value { .. } | Self::Task { .. } => Vec::new(),
        }
    }

    /// Values read by this condition
    pub fn operand_values(&self) -> Vec<ValueId> {
        match self {
            Self::Value {
                value, expected, ..
            } => vec![*value, *expected],
            _ => Vec::new(),
        }
    }

    /// Function references used by this condition
    pub fn functions(&self) -> Vec<FunctionId> {
        match self {
            Self::Standalone {
                predicate: Some(f),
            } => vec![*f],
            Self::Value {
                comparison: Some(f),
                ..
            } => vec![*f],
            _ => Vec::new(),
        }
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    pub fn event(&self) -> Option<&EventBinding> {
        match self {
            Self::Event(binding) => Some(binding),
            _ => None,
        }
    }

    /// Current cursor of a sequenced condition
    pub fn cursor(&self) -> Option<usize> {
        match self {
            Self::Sequenced { cursor, .. } => Some(cursor.get()),
            _ => None,
        }
    }

    pub(crate) fn rewind(&self) {
        if let Self::Sequenced { cursor, .. } = self {
            cursor.set(0);
        }
    }
}

/// Binding of an event to the process it gates
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventBinding {
    pub process: ProcessId,
    pub gate: ConditionId,
    #[serde(default)]
    pub(crate) fired: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) last_fired: Option<u64>,
}

impl EventBinding {
    pub fn new(process: ProcessId, gate: ConditionId) -> Self {
        Self {
            process,
            gate,
            fired: 0,
            last_fired: None,
        }
    }

    /// Number of times the event fired
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Epoch of the most recent firing
    pub fn last_fired(&self) -> Option<u64> {
        self.last_fired
    }
}

/// A named condition in the graph arena
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConditionNode {
    pub(crate) element: Element,
    pub(crate) condition: Condition,
}

impl ConditionNode {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}
