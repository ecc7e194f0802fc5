//! Behavior registry: resolves function references to closures
//!
//! Graphs store only [`FunctionRef`] keys. Predicates, comparisons and
//! task actions are registered here when the host starts and looked up
//! on every evaluation. A reference with no entry, or with an entry of
//! the wrong kind, fails closed: predicates read as false, actions as
//! no-ops.

use crate::eval::Evaluator;
use crate::graph::ProcessGraph;
use crate::ids::FunctionId;
use crate::task::TaskScope;
use process_types::{Element, FunctionRef, Payload, ProcessError, ProcessResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Nullary gate evaluated against the graph
pub type PredicateFn = Arc<dyn Fn(&Evaluator<'_>) -> bool + Send + Sync>;

/// Content comparison used by value conditions
pub type ComparisonFn = Arc<dyn Fn(&Payload, &Payload) -> bool + Send + Sync>;

/// Run action of a task
pub type ActionFn = Arc<dyn Fn(&mut TaskScope<'_>) -> ProcessResult<()> + Send + Sync>;

/// A registered behavior
#[derive(Clone)]
pub enum Behavior {
    Predicate(PredicateFn),
    Comparison(ComparisonFn),
    Action(ActionFn),
}

impl Behavior {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Predicate(_) => "predicate",
            Self::Comparison(_) => "comparison",
            Self::Action(_) => "action",
        }
    }
}

impl std::fmt::Debug for Behavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Behavior::{}", self.kind())
    }
}

/// A function reference stored in the graph arena
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionNode {
    pub(crate) element: Element,
    pub(crate) reference: FunctionRef,
}

impl FunctionNode {
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn reference(&self) -> &FunctionRef {
        &self.reference
    }
}

/// Registry of behaviors keyed by function reference
#[derive(Clone, Debug, Default)]
pub struct FunctionRegistry {
    behaviors: HashMap<FunctionRef, Behavior>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior. Each reference may be registered once.
    pub fn register(&mut self, reference: FunctionRef, behavior: Behavior) -> ProcessResult<()> {
        if self.behaviors.contains_key(&reference) {
            return Err(ProcessError::AlreadyRegistered(reference.to_string()));
        }
        tracing::debug!(function = %reference, kind = behavior.kind(), "Behavior registered");
        self.behaviors.insert(reference, behavior);
        Ok(())
    }

    pub fn register_predicate(
        &mut self,
        reference: FunctionRef,
        predicate: PredicateFn,
    ) -> ProcessResult<()> {
        self.register(reference, Behavior::Predicate(predicate))
    }

    pub fn register_comparison(
        &mut self,
        reference: FunctionRef,
        comparison: ComparisonFn,
    ) -> ProcessResult<()> {
        self.register(reference, Behavior::Comparison(comparison))
    }

    pub fn register_action(&mut self, reference: FunctionRef, action: ActionFn) -> ProcessResult<()> {
        self.register(reference, Behavior::Action(action))
    }

    pub fn get(&self, reference: &FunctionRef) -> Option<&Behavior> {
        self.behaviors.get(reference)
    }

    pub fn predicate(&self, reference: &FunctionRef) -> Option<&PredicateFn> {
        match self.behaviors.get(reference) {
            Some(Behavior::Predicate(f)) => Some(f),
            _ => None,
        }
    }

    pub fn comparison(&self, reference: &FunctionRef) -> Option<&ComparisonFn> {
        match self.behaviors.get(reference) {
            Some(Behavior::Comparison(f)) => Some(f),
            _ => None,
        }
    }

    pub fn action(&self, reference: &FunctionRef) -> Option<&ActionFn> {
        match self.behaviors.get(reference) {
            Some(Behavior::Action(f)) => Some(f),
            _ => None,
        }
    }

    pub fn contains(&self, reference: &FunctionRef) -> bool {
        self.behaviors.contains_key(reference)
    }

    pub fn count(&self) -> usize {
        self.behaviors.len()
    }

    /// Valid function nodes of `graph` with no registered behavior
    pub fn unresolved(&self, graph: &ProcessGraph) -> Vec<FunctionId> {
        graph
            .functions
            .iter()
            .enumerate()
            .filter(|(_, node)| node.element.is_valid() && !self.contains(&node.reference))
            .map(|(index, _)| FunctionId::from_index(index))
            .collect()
    }
}
