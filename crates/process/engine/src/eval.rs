//! Condition evaluation and view computation
//!
//! Evaluation is read-only over the graph except for sequenced cursors,
//! which live in `Cell`s so the evaluator only needs `&ProcessGraph`.

use crate::condition::Condition;
use crate::graph::ProcessGraph;
use crate::ids::{ConditionId, ValueId};
use crate::registry::FunctionRegistry;
use crate::value::ValueKind;
use crate::view::View;
use process_types::{coerce_index, Payload};
use std::cell::Cell;

pub use process_types::DEFAULT_MAX_EVAL_DEPTH;

/// Evaluates conditions and reads values against a graph
pub struct Evaluator<'a> {
    graph: &'a ProcessGraph,
    functions: &'a FunctionRegistry,
    max_depth: u32,
    depth: Cell<u32>,
}

impl<'a> Evaluator<'a> {
    pub fn new(graph: &'a ProcessGraph, functions: &'a FunctionRegistry) -> Self {
        Self::with_max_depth(graph, functions, DEFAULT_MAX_EVAL_DEPTH)
    }

    pub fn with_max_depth(
        graph: &'a ProcessGraph,
        functions: &'a FunctionRegistry,
        max_depth: u32,
    ) -> Self {
        Self {
            graph,
            functions,
            max_depth,
            depth: Cell::new(0),
        }
    }

    pub fn graph(&self) -> &'a ProcessGraph {
        self.graph
    }

    /// Whether a condition is met. Unresolvable wiring is never met.
    pub fn met(&self, id: ConditionId) -> bool {
        let Some(_guard) = self.enter() else {
            tracing::warn!(
                condition = %self.graph.condition(id).element().id(),
                max_depth = self.max_depth,
                "Condition nesting too deep; treating as not met"
            );
            return false;
        };
        let node = self.graph.condition(id);
        if !node.element().is_valid() {
            return false;
        }
        match node.condition() {
            Condition::Standalone { predicate } => {
                let Some(fid) = predicate else {
                    return false;
                };
                let reference = self.graph.function(*fid).reference();
                match self.functions.predicate(reference) {
                    Some(predicate) => predicate(self),
                    None => {
                        tracing::debug!(function = %reference, "Unresolved predicate");
                        false
                    }
                }
            }
            Condition::Value {
                value,
                expected,
                comparison,
                negate,
            } => {
                let actual = self.read(*value);
                let wanted = self.read(*expected);
                let equal = match comparison {
                    Some(fid) => {
                        let reference = self.graph.function(*fid).reference();
                        match self.functions.comparison(reference) {
                            Some(compare) => compare(&actual, &wanted),
                            None => {
                                tracing::debug!(function = %reference, "Unresolved comparison");
                                return false;
                            }
                        }
                    }
                    None => actual == wanted,
                };
                equal != *negate
            }
            Condition::Task { runnable, expected } => {
                self.graph.observed_state_of(*runnable) == Some(*expected)
            }
            Condition::All { children } => children.iter().all(|c| self.met(*c)),
            Condition::Any { children } => {
                children.is_empty() || children.iter().any(|c| self.met(*c))
            }
            Condition::Sequenced { children, cursor } => {
                let at = cursor.get();
                if at >= children.len() {
                    return true;
                }
                if self.met(children[at]) {
                    cursor.set(at + 1);
                    at + 1 == children.len()
                } else {
                    cursor.set(0);
                    false
                }
            }
            Condition::Event(binding) => self.met(binding.gate),
        }
    }

    /// Visible payload of a value; views are computed on every read.
    pub fn read(&self, id: ValueId) -> Payload {
        let node = self.graph.value(id);
        match node.kind() {
            ValueKind::Cell(cell) => cell.get().clone(),
            ValueKind::View(view) => {
                let Some(_guard) = self.enter() else {
                    tracing::warn!(
                        view = %node.element().id(),
                        max_depth = self.max_depth,
                        "View nesting too deep; reading null"
                    );
                    return Payload::Null;
                };
                match view {
                    View::Condition(c) => Payload::Bool(self.met(*c)),
                    View::TaskState(runnable) => match self.graph.observed_state_of(*runnable) {
                        Some(state) => Payload::String(state.as_str().to_string()),
                        None => Payload::Null,
                    },
                    View::Changed(source) => Payload::Bool(self.changed(*source)),
                    View::Index(source) => Payload::from(coerce_index(&self.read(*source))),
                }
            }
        }
    }

    /// Whether a cell's visible value changed during this tick's commit
    pub fn changed(&self, id: ValueId) -> bool {
        match self.graph.value(id).kind() {
            ValueKind::Cell(cell) => cell.changed_in(self.graph.epoch()),
            ValueKind::View(View::Changed(source)) => self.changed(*source),
            ValueKind::View(_) => false,
        }
    }

    fn enter(&self) -> Option<DepthGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.max_depth {
            return None;
        }
        self.depth.set(depth + 1);
        Some(DepthGuard(&self.depth))
    }
}

struct DepthGuard<'a>(&'a Cell<u32>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
