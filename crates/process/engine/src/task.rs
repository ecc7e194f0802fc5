//! Tasks and activities: gated run state machines
//!
//! A task moves `Ready -> Running` when its start condition is met and
//! `Running -> Done` when its stop condition is met. Tasks with
//! `auto_rearm` go back to `Ready` on the next update; one-shot tasks
//! stay `Done`. An activity is a task that owns child tasks and drives
//! them after itself in both the run and the update pass.

use crate::container::{TaskFault, Transition};
use crate::eval::Evaluator;
use crate::graph::ProcessGraph;
use crate::ids::{ConditionId, FunctionId, ProcessId, TaskId, ValueId};
use crate::registry::FunctionRegistry;
use process_types::{
    coerce_index, Element, Payload, ProcessError, ProcessResult, RunState, TaskKind,
};

/// A task or activity in the graph arena
#[derive(Clone, Debug)]
pub struct TaskNode {
    pub(crate) element: Element,
    pub(crate) kind: TaskKind,
    pub(crate) state: RunState,
    pub(crate) start_condition: ConditionId,
    pub(crate) stop_condition: ConditionId,
    pub(crate) action: Option<FunctionId>,
    pub(crate) values: Vec<ValueId>,
    pub(crate) children: Vec<TaskId>,
    pub(crate) parent: Option<TaskId>,
    pub(crate) process: Option<ProcessId>,
    pub(crate) auto_rearm: bool,
    pub(crate) runs: u64,
}

impl TaskNode {
    pub(crate) fn new(element: Element, kind: TaskKind, never: ConditionId, auto_rearm: bool) -> Self {
        Self {
            element,
            kind,
            state: RunState::Ready,
            start_condition: never,
            stop_condition: never,
            action: None,
            values: Vec::new(),
            children: Vec::new(),
            parent: None,
            process: None,
            auto_rearm,
            runs: 0,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_activity(&self) -> bool {
        self.kind == TaskKind::Activity
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn start_condition(&self) -> ConditionId {
        self.start_condition
    }

    pub fn stop_condition(&self) -> ConditionId {
        self.stop_condition
    }

    pub fn action(&self) -> Option<FunctionId> {
        self.action
    }

    pub fn values(&self) -> &[ValueId] {
        &self.values
    }

    pub fn children(&self) -> &[TaskId] {
        &self.children
    }

    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    /// Process owning this task as a root task
    pub fn process(&self) -> Option<ProcessId> {
        self.process
    }

    pub fn auto_rearm(&self) -> bool {
        self.auto_rearm
    }

    /// Number of times the run action was invoked
    pub fn runs(&self) -> u64 {
        self.runs
    }
}

/// What a task action sees while it runs.
///
/// Values are addressed by element id. A name resolves against the
/// task's own values first, then each enclosing activity's, then the
/// owning process's shared values.
pub struct TaskScope<'a> {
    graph: &'a mut ProcessGraph,
    functions: &'a FunctionRegistry,
    task: TaskId,
    max_depth: u32,
}

impl<'a> TaskScope<'a> {
    pub(crate) fn new(
        graph: &'a mut ProcessGraph,
        functions: &'a FunctionRegistry,
        task: TaskId,
        max_depth: u32,
    ) -> Self {
        Self {
            graph,
            functions,
            task,
            max_depth,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task
    }

    /// Element id of the running task
    pub fn task_name(&self) -> &str {
        self.graph.task(self.task).element.id()
    }

    pub fn epoch(&self) -> u64 {
        self.graph.epoch()
    }

    /// Resolve a value id visible to this task
    pub fn lookup(&self, id: &str) -> Option<ValueId> {
        let mut current = Some(self.task);
        let mut root = self.task;
        while let Some(task) = current {
            let node = self.graph.task(task);
            if let Some(found) = self.find(&node.values, id) {
                return Some(found);
            }
            root = task;
            current = node.parent;
        }
        let process = self.graph.task(root).process?;
        self.find(&self.graph.process(process).values, id)
    }

    fn find(&self, values: &[ValueId], id: &str) -> Option<ValueId> {
        values
            .iter()
            .copied()
            .find(|v| self.graph.value(*v).element.id() == id)
    }

    /// Visible payload of a value, `None` when the task cannot see it
    pub fn get(&self, id: &str) -> Option<Payload> {
        let value = self.lookup(id)?;
        Some(self.evaluator().read(value))
    }

    /// A value coerced to an integer; unknown values read as 0
    pub fn get_index(&self, id: &str) -> i64 {
        self.get(id).map(|p| coerce_index(&p)).unwrap_or(0)
    }

    /// Whether the value changed in this tick's commit pass
    pub fn changed(&self, id: &str) -> bool {
        self.lookup(id)
            .map(|v| self.evaluator().changed(v))
            .unwrap_or(false)
    }

    /// Stage a write; it becomes visible on the next commit pass
    pub fn set(&mut self, id: &str, payload: impl Into<Payload>) -> ProcessResult<()> {
        let value = self.lookup(id).ok_or_else(|| ProcessError::UnknownElement {
            kind: process_types::ElementKind::Value,
            id: id.to_string(),
        })?;
        self.graph.set_value(value, payload)
    }

    pub fn met(&self, condition: ConditionId) -> bool {
        self.evaluator().met(condition)
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::with_max_depth(self.graph, self.functions, self.max_depth)
    }
}

/// Drives task and activity transitions and run actions
pub struct TaskMachine<'f> {
    functions: &'f FunctionRegistry,
    max_depth: u32,
}

impl<'f> TaskMachine<'f> {
    pub fn new(functions: &'f FunctionRegistry, max_depth: u32) -> Self {
        Self {
            functions,
            max_depth,
        }
    }

    /// Advance a task by at most one transition, then its children.
    pub fn update(&self, graph: &mut ProcessGraph, task: TaskId, out: &mut Vec<Transition>) {
        let node = graph.task(task);
        if !node.element.is_valid() {
            return;
        }
        let from = node.state;
        let next = {
            let eval = Evaluator::with_max_depth(graph, self.functions, self.max_depth);
            match from {
                RunState::Ready if eval.met(node.start_condition) => Some(RunState::Running),
                RunState::Running | RunState::RunComplete if eval.met(node.stop_condition) => {
                    Some(RunState::Done)
                }
                RunState::Done if node.auto_rearm => Some(RunState::Ready),
                _ => None,
            }
        };

        if let Some(to) = next {
            let node = graph.task_mut(task);
            node.state = to;
            let element = node.element.id().to_string();
            let is_activity = node.is_activity();
            tracing::debug!(task = %element, from = %from, to = %to, "Task transition");
            out.push(Transition {
                runnable: task.into(),
                element,
                from,
                to,
                epoch: graph.epoch(),
            });
            if to == RunState::Ready && is_activity {
                graph.rearm_descendants(task);
            }
        }

        let children = graph.task(task).children.clone();
        for child in children {
            self.update(graph, child, out);
        }
    }

    /// Invoke the run action of an active task, then of its active
    /// children. Returns how many actions ran.
    pub fn run(&self, graph: &mut ProcessGraph, task: TaskId, faults: &mut Vec<TaskFault>) -> usize {
        let node = graph.task(task);
        if !node.element.is_valid() || !node.state.is_active() {
            return 0;
        }
        let action = node.action;
        let children = node.children.clone();
        let is_activity = node.is_activity();

        if let Some(fid) = action {
            let reference = graph.function(fid).reference();
            match self.functions.action(reference) {
                Some(action) => {
                    let mut scope = TaskScope::new(graph, self.functions, task, self.max_depth);
                    if let Err(e) = action(&mut scope) {
                        let message = match e {
                            ProcessError::ActionFailed(m) => m,
                            other => other.to_string(),
                        };
                        faults.push(TaskFault {
                            task: graph.task(task).element.id().to_string(),
                            message,
                            epoch: graph.epoch(),
                        });
                    }
                }
                None => {
                    tracing::debug!(function = %reference, "Unresolved action; skipping");
                }
            }
        }
        graph.task_mut(task).runs += 1;

        let mut executed = 1;
        if is_activity {
            for child in children {
                executed += self.run(graph, child, faults);
            }
        }
        executed
    }
}
