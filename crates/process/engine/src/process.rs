//! Process lifecycle: start/stop events around a set of root tasks
//!
//! ```text
//! Ready --start event--> Starting --no starting tasks--> Running
//!   Running --stop event--> RunComplete --> Done
//! ```
//!
//! The start event is gated on the process's own state reading `Ready`,
//! so it fires on the first update after admission. The stop event is
//! gated on the done condition. `Stopping` is never entered.
//!
//! Conditions and views see a process through its published state, which
//! catches up with the live state in the commit pass. A transition made in
//! one tick is therefore observed by tasks from the next tick on, the same
//! one-tick lag every buffered value has.

use crate::condition::Condition;
use crate::container::Transition;
use crate::eval::Evaluator;
use crate::graph::ProcessGraph;
use crate::ids::{ConditionId, ProcessId, TaskId, ValueId};
use crate::registry::FunctionRegistry;
use process_types::{Element, RunState, TaskKind};
use std::collections::BTreeMap;

/// A process in the graph arena
#[derive(Clone, Debug)]
pub struct ProcessNode {
    pub(crate) element: Element,
    pub(crate) state: RunState,
    pub(crate) published: RunState,
    pub(crate) start_event: ConditionId,
    pub(crate) stop_event: ConditionId,
    pub(crate) events: Vec<ConditionId>,
    pub(crate) tasks: Vec<TaskId>,
    pub(crate) values: Vec<ValueId>,
    pub(crate) done_condition: ConditionId,
    pub(crate) containers: BTreeMap<TaskKind, String>,
    pub(crate) state_view: Option<ValueId>,
}

impl ProcessNode {
    pub(crate) fn new(element: Element, never: ConditionId) -> Self {
        Self {
            element,
            state: RunState::Ready,
            published: RunState::Ready,
            start_event: never,
            stop_event: never,
            events: Vec::new(),
            tasks: Vec::new(),
            values: Vec::new(),
            done_condition: never,
            containers: BTreeMap::new(),
            state_view: None,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// State as seen by conditions and views, as of the last commit pass
    pub fn published_state(&self) -> RunState {
        self.published
    }

    pub fn start_event(&self) -> ConditionId {
        self.start_event
    }

    pub fn stop_event(&self) -> ConditionId {
        self.stop_event
    }

    /// Auxiliary events polled while running
    pub fn events(&self) -> &[ConditionId] {
        &self.events
    }

    /// Root tasks
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// Values shared with the task tree
    pub fn values(&self) -> &[ValueId] {
        &self.values
    }

    pub fn done_condition(&self) -> ConditionId {
        self.done_condition
    }

    /// View reading the process state as a string
    pub fn state_view(&self) -> Option<ValueId> {
        self.state_view
    }

    pub fn containers(&self) -> &BTreeMap<TaskKind, String> {
        &self.containers
    }
}

/// Drives process transitions and fires lifecycle events
pub struct ProcessMachine<'f> {
    functions: &'f FunctionRegistry,
    max_depth: u32,
}

impl<'f> ProcessMachine<'f> {
    pub fn new(functions: &'f FunctionRegistry, max_depth: u32) -> Self {
        Self {
            functions,
            max_depth,
        }
    }

    /// Advance a process by at most one transition.
    ///
    /// Ids of every event fired are appended to `fired`.
    pub fn update(
        &self,
        graph: &mut ProcessGraph,
        process: ProcessId,
        out: &mut Vec<Transition>,
        fired: &mut Vec<String>,
    ) {
        let node = graph.process(process);
        if !node.element.is_valid() {
            return;
        }
        let from = node.state;
        let (start, stop) = (node.start_event, node.stop_event);
        let events = node.events.clone();

        let to = match from {
            RunState::Ready if self.met(graph, start) => {
                fired.push(self.fire(graph, start));
                Some(RunState::Starting)
            }
            RunState::Starting if self.starting_tasks(graph, process).is_empty() => {
                Some(RunState::Running)
            }
            RunState::Running => {
                for event in events {
                    if self.met(graph, event) {
                        fired.push(self.fire(graph, event));
                    }
                }
                if self.met(graph, stop) {
                    fired.push(self.fire(graph, stop));
                    Some(RunState::RunComplete)
                } else {
                    None
                }
            }
            RunState::RunComplete | RunState::Stopping => Some(RunState::Done),
            _ => None,
        };

        if let Some(to) = to {
            let node = graph.process_mut(process);
            node.state = to;
            let element = node.element.id().to_string();
            tracing::debug!(process = %element, from = %from, to = %to, "Process transition");
            out.push(Transition {
                runnable: process.into(),
                element,
                from,
                to,
                epoch: graph.epoch(),
            });
        }
    }

    /// Root tasks that are mid-run, or ready with their start condition met
    pub fn starting_tasks(&self, graph: &ProcessGraph, process: ProcessId) -> Vec<TaskId> {
        let eval = Evaluator::with_max_depth(graph, self.functions, self.max_depth);
        graph
            .process(process)
            .tasks
            .iter()
            .copied()
            .filter(|t| {
                let task = graph.task(*t);
                task.state.is_mid_run()
                    || (task.state == RunState::Ready && eval.met(task.start_condition))
            })
            .collect()
    }

    /// Fire an event: count it, stamp the epoch and rewind the
    /// sequenced cursors behind its gate. Returns the event id.
    pub fn fire(&self, graph: &mut ProcessGraph, event: ConditionId) -> String {
        let epoch = graph.epoch();
        let node = graph.condition_mut(event);
        let id = node.element.id().to_string();
        let gate = match &mut node.condition {
            Condition::Event(binding) => {
                binding.fired += 1;
                binding.last_fired = Some(epoch);
                Some(binding.gate)
            }
            _ => None,
        };
        if let Some(gate) = gate {
            graph.rewind(gate);
        }
        tracing::info!(event = %id, epoch, "Event fired");
        id
    }

    fn met(&self, graph: &ProcessGraph, condition: ConditionId) -> bool {
        Evaluator::with_max_depth(graph, self.functions, self.max_depth).met(condition)
    }
}
