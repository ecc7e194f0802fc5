//! The process graph arena
//!
//! All processes, tasks, conditions, values and function references live
//! in one [`ProcessGraph`] and point at each other through typed indices.
//! The graph has two phases: while building, names and wiring may change
//! freely and value writes are immediate. [`ProcessGraph::seal`] moves the
//! whole arena into the run phase: every element is locked and every cell
//! starts buffering its writes.

use crate::condition::{Condition, ConditionNode, EventBinding};
use crate::ids::{ConditionId, FunctionId, ProcessId, RunnableId, TaskId, ValueId};
use crate::process::ProcessNode;
use crate::registry::FunctionNode;
use crate::task::TaskNode;
use crate::value::{ValueKind, ValueNode};
use crate::view::View;
use process_types::{
    normalize, Element, ElementKind, FunctionRef, Payload, ProcessError, ProcessResult, RunState,
    TaskKind, ValueCell,
};
use std::collections::{BTreeMap, HashSet};

/// Build/run phase of the arena
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Build,
    Run,
}

/// Any node of the arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Value(ValueId),
    Condition(ConditionId),
    Task(TaskId),
    Process(ProcessId),
    Function(FunctionId),
}

/// Wiring that resolves to an undefined sentinel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingRef {
    /// Id of the element holding the reference
    pub owner: String,
    /// Which slot of the owner is dangling
    pub slot: String,
}

impl std::fmt::Display for DanglingRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} is undefined", self.owner, self.slot)
    }
}

#[derive(Clone, Debug, Default)]
struct Sentinels {
    value: Option<ValueId>,
    condition: Option<ConditionId>,
    task: Option<TaskId>,
    process: Option<ProcessId>,
    function: Option<FunctionId>,
}

/// Arena of every node of one or more processes
#[derive(Clone, Debug, Default)]
pub struct ProcessGraph {
    pub(crate) values: Vec<ValueNode>,
    pub(crate) conditions: Vec<ConditionNode>,
    pub(crate) tasks: Vec<TaskNode>,
    pub(crate) processes: Vec<ProcessNode>,
    pub(crate) functions: Vec<FunctionNode>,
    phase: Phase,
    epoch: u64,
    default_auto_rearm: bool,
    sentinels: Sentinels,
}

impl ProcessGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// New tasks re-arm from `Done` to `Ready` unless configured otherwise
    pub fn with_auto_rearm(mut self, auto_rearm: bool) -> Self {
        self.default_auto_rearm = auto_rearm;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_sealed(&self) -> bool {
        self.phase == Phase::Run
    }

    /// Number of ticks started on this graph
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn advance_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    /// Enter the run phase: lock every element and value cell.
    pub fn seal(&mut self) {
        if self.is_sealed() {
            return;
        }
        self.phase = Phase::Run;
        for node in &mut self.values {
            node.element.lock();
            if let ValueKind::Cell(cell) = &mut node.kind {
                cell.lock();
            }
        }
        for node in &mut self.conditions {
            node.element.lock();
        }
        for node in &mut self.tasks {
            node.element.lock();
        }
        for node in &mut self.processes {
            node.element.lock();
        }
        for node in &mut self.functions {
            node.element.lock();
        }
        tracing::debug!(
            values = self.values.len(),
            conditions = self.conditions.len(),
            tasks = self.tasks.len(),
            "Process graph sealed"
        );
    }

    // ── Node creation ────────────────────────────────────────────────

    /// Add a value cell
    pub fn add_value(
        &mut self,
        name: impl AsRef<str>,
        initial: impl Into<Payload>,
    ) -> ProcessResult<ValueId> {
        let element = self.unique(ElementKind::Value, name.as_ref())?;
        Ok(self.insert_value(element, ValueKind::Cell(ValueCell::new(initial))))
    }

    /// Add a read-only view
    pub fn add_view(&mut self, name: impl AsRef<str>, view: View) -> ProcessResult<ValueId> {
        let element = self.unique(ElementKind::View, name.as_ref())?;
        Ok(self.insert_value(element, ValueKind::View(view)))
    }

    /// Add a condition. Event conditions are registered as events.
    pub fn add_condition(
        &mut self,
        name: impl AsRef<str>,
        condition: Condition,
    ) -> ProcessResult<ConditionId> {
        let kind = if condition.is_event() {
            ElementKind::Event
        } else {
            ElementKind::Condition
        };
        let element = self.unique(kind, name.as_ref())?;
        Ok(self.insert_condition(element, condition))
    }

    /// Add a function reference
    pub fn add_function(
        &mut self,
        name: impl AsRef<str>,
        reference: FunctionRef,
    ) -> ProcessResult<FunctionId> {
        let element = self.unique(ElementKind::Function, name.as_ref())?;
        Ok(self.insert_function(element, reference))
    }

    /// Add a plain task with no gates wired
    pub fn add_task(&mut self, name: impl AsRef<str>) -> ProcessResult<TaskId> {
        let element = self.unique(ElementKind::Task, name.as_ref())?;
        let never = self.undefined_condition();
        let node = TaskNode::new(element, TaskKind::Task, never, self.default_auto_rearm);
        Ok(self.insert_task(node))
    }

    /// Add an activity: a task that drives child tasks
    pub fn add_activity(&mut self, name: impl AsRef<str>) -> ProcessResult<TaskId> {
        let element = self.unique(ElementKind::Activity, name.as_ref())?;
        let never = self.undefined_condition();
        let node = TaskNode::new(element, TaskKind::Activity, never, self.default_auto_rearm);
        Ok(self.insert_task(node))
    }

    /// Add a process with its lifecycle events.
    ///
    /// Creates the state view `<name> state`, the literal `<name> ready`,
    /// the admission gate `<name> admitted` (state view equals `Ready`),
    /// the start event `<name> start` and the stop event `<name> stop`.
    /// The stop event follows the done condition, which starts out
    /// undefined (never met).
    pub fn add_process(&mut self, name: impl AsRef<str>) -> ProcessResult<ProcessId> {
        // A sealed graph could hold the process but never wire its tasks
        if self.is_sealed() {
            return Err(ProcessError::Sealed(normalize(name.as_ref())));
        }
        let element = self.unique(ElementKind::Process, name.as_ref())?;
        let base = element.name().to_string();

        let state_name = format!("{base} state");
        let ready_name = format!("{base} ready");
        let admitted_name = format!("{base} admitted");
        let start_name = format!("{base} start");
        let stop_name = format!("{base} stop");
        for (kind, generated) in [
            (ElementKind::View, &state_name),
            (ElementKind::Value, &ready_name),
            (ElementKind::Condition, &admitted_name),
            (ElementKind::Event, &start_name),
            (ElementKind::Event, &stop_name),
        ] {
            if self.id_taken(kind, &normalize(generated)) {
                return Err(ProcessError::DuplicateId {
                    kind,
                    id: normalize(generated),
                });
            }
        }

        let never = self.undefined_condition();
        let pid = ProcessId::from_index(self.processes.len());
        self.insert_process(ProcessNode::new(element, never));

        let state_view = self.insert_value(
            Element::new(ElementKind::View, &state_name),
            ValueKind::View(View::TaskState(RunnableId::Process(pid))),
        );
        let ready = self.insert_value(
            Element::new(ElementKind::Value, &ready_name),
            ValueKind::Cell(ValueCell::new(RunState::Ready.as_str())),
        );
        let admitted = self.insert_condition(
            Element::new(ElementKind::Condition, &admitted_name),
            Condition::value(state_view, ready),
        );
        let start = self.insert_condition(
            Element::new(ElementKind::Event, &start_name),
            Condition::Event(EventBinding::new(pid, admitted)),
        );
        let stop = self.insert_condition(
            Element::new(ElementKind::Event, &stop_name),
            Condition::Event(EventBinding::new(pid, never)),
        );

        let process = &mut self.processes[pid.index()];
        process.state_view = Some(state_view);
        process.start_event = start;
        process.stop_event = stop;
        Ok(pid)
    }

    pub(crate) fn insert_value(&mut self, element: Element, kind: ValueKind) -> ValueId {
        let mut node = ValueNode { element, kind };
        if self.is_sealed() {
            node.element.lock();
            if let ValueKind::Cell(cell) = &mut node.kind {
                cell.lock();
            }
        }
        self.values.push(node);
        ValueId::from_index(self.values.len() - 1)
    }

    pub(crate) fn insert_condition(&mut self, element: Element, condition: Condition) -> ConditionId {
        let mut node = ConditionNode { element, condition };
        if self.is_sealed() {
            node.element.lock();
        }
        self.conditions.push(node);
        ConditionId::from_index(self.conditions.len() - 1)
    }

    pub(crate) fn insert_function(&mut self, element: Element, reference: FunctionRef) -> FunctionId {
        let mut node = FunctionNode { element, reference };
        if self.is_sealed() {
            node.element.lock();
        }
        self.functions.push(node);
        FunctionId::from_index(self.functions.len() - 1)
    }

    pub(crate) fn insert_task(&mut self, mut node: TaskNode) -> TaskId {
        if self.is_sealed() {
            node.element.lock();
        }
        self.tasks.push(node);
        TaskId::from_index(self.tasks.len() - 1)
    }

    pub(crate) fn insert_process(&mut self, mut node: ProcessNode) -> ProcessId {
        if self.is_sealed() {
            node.element.lock();
        }
        self.processes.push(node);
        ProcessId::from_index(self.processes.len() - 1)
    }

    // ── Undefined sentinels ──────────────────────────────────────────

    pub fn undefined_value(&mut self) -> ValueId {
        if let Some(id) = self.sentinels.value {
            return id;
        }
        let id = self.insert_value(
            Element::undefined(ElementKind::Value),
            ValueKind::Cell(ValueCell::default()),
        );
        self.sentinels.value = Some(id);
        id
    }

    pub fn undefined_condition(&mut self) -> ConditionId {
        if let Some(id) = self.sentinels.condition {
            return id;
        }
        let id = self.insert_condition(Element::undefined(ElementKind::Condition), Condition::never());
        self.sentinels.condition = Some(id);
        id
    }

    pub fn undefined_task(&mut self) -> TaskId {
        if let Some(id) = self.sentinels.task {
            return id;
        }
        let never = self.undefined_condition();
        let node = TaskNode::new(
            Element::undefined(ElementKind::Task),
            TaskKind::Task,
            never,
            false,
        );
        let id = self.insert_task(node);
        self.sentinels.task = Some(id);
        id
    }

    pub fn undefined_process(&mut self) -> ProcessId {
        if let Some(id) = self.sentinels.process {
            return id;
        }
        let never = self.undefined_condition();
        let id = self.insert_process(ProcessNode::new(
            Element::undefined(ElementKind::Process),
            never,
        ));
        self.sentinels.process = Some(id);
        id
    }

    pub fn undefined_function(&mut self) -> FunctionId {
        if let Some(id) = self.sentinels.function {
            return id;
        }
        let id = self.insert_function(
            Element::undefined(ElementKind::Function),
            FunctionRef::undefined(),
        );
        self.sentinels.function = Some(id);
        id
    }

    // ── Wiring ───────────────────────────────────────────────────────

    pub fn set_start_condition(&mut self, task: TaskId, condition: ConditionId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Task(task))?;
        self.tasks[task.index()].start_condition = condition;
        Ok(())
    }

    pub fn set_stop_condition(&mut self, task: TaskId, condition: ConditionId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Task(task))?;
        self.tasks[task.index()].stop_condition = condition;
        Ok(())
    }

    pub fn set_action(&mut self, task: TaskId, action: FunctionId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Task(task))?;
        self.tasks[task.index()].action = Some(action);
        Ok(())
    }

    pub fn set_auto_rearm(&mut self, task: TaskId, auto_rearm: bool) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Task(task))?;
        self.tasks[task.index()].auto_rearm = auto_rearm;
        Ok(())
    }

    /// Give a task access to a value. Shared cells are attached to every
    /// task that reads or writes them.
    pub fn attach_value(&mut self, task: TaskId, value: ValueId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Task(task))?;
        let values = &mut self.tasks[task.index()].values;
        if !values.contains(&value) {
            values.push(value);
        }
        Ok(())
    }

    /// Make `child` a child of `activity`
    pub fn add_child(&mut self, activity: TaskId, child: TaskId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Task(activity))?;
        let parent = &self.tasks[activity.index()];
        if parent.kind != TaskKind::Activity {
            return Err(ProcessError::NotAnActivity(parent.element.id().to_string()));
        }
        self.ensure_unattached(child)?;
        if self.task_tree(child).contains(&activity) {
            return Err(ProcessError::CycleDetected(
                self.tasks[child.index()].element.id().to_string(),
            ));
        }
        self.tasks[child.index()].parent = Some(activity);
        self.tasks[activity.index()].children.push(child);
        Ok(())
    }

    /// Add a root task to a process
    pub fn add_process_task(&mut self, process: ProcessId, task: TaskId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Process(process))?;
        self.ensure_unattached(task)?;
        self.tasks[task.index()].process = Some(process);
        self.processes[process.index()].tasks.push(task);
        Ok(())
    }

    /// Register a value owned by the process and shared with its tasks
    pub fn add_process_value(&mut self, process: ProcessId, value: ValueId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Process(process))?;
        let values = &mut self.processes[process.index()].values;
        if !values.contains(&value) {
            values.push(value);
        }
        Ok(())
    }

    /// Register an auxiliary event. Plain conditions are wrapped in an
    /// event bound to the process.
    pub fn add_event(&mut self, process: ProcessId, event: ConditionId) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Process(process))?;
        if !self.conditions[event.index()].condition.is_event() {
            let gate = event;
            let name = format!("{} event", self.conditions[gate.index()].element.name());
            let element = self.unique(ElementKind::Event, &name)?;
            let wrapped =
                self.insert_condition(element, Condition::Event(EventBinding::new(process, gate)));
            self.processes[process.index()].events.push(wrapped);
            return Ok(());
        }
        self.processes[process.index()].events.push(event);
        Ok(())
    }

    /// Reassign the done condition; the stop event follows it.
    ///
    /// Allowed in either phase.
    pub fn set_done_condition(&mut self, process: ProcessId, condition: ConditionId) {
        let node = &mut self.processes[process.index()];
        node.done_condition = condition;
        let stop = node.stop_event;
        if let Condition::Event(binding) = &mut self.conditions[stop.index()].condition {
            binding.gate = condition;
        }
    }

    /// Route root tasks of `kind` to the named container
    pub fn route(
        &mut self,
        process: ProcessId,
        kind: TaskKind,
        container: impl Into<String>,
    ) -> ProcessResult<()> {
        self.ensure_build(NodeRef::Process(process))?;
        self.processes[process.index()]
            .containers
            .insert(kind, container.into());
        Ok(())
    }

    /// Rename a node. Ignored (returns `false`) once the node is locked.
    pub fn rename(&mut self, node: NodeRef, name: impl AsRef<str>) -> ProcessResult<bool> {
        if !self.element(node).is_valid() {
            return Err(ProcessError::InvalidElement(self.element(node).id().to_string()));
        }
        if self.element(node).is_locked() {
            return Ok(false);
        }
        let kind = self.element(node).kind();
        let candidate = Element::new(kind, name.as_ref());
        if candidate.id() != self.element(node).id() && self.id_taken(kind, candidate.id()) {
            return Err(ProcessError::DuplicateId {
                kind,
                id: candidate.id().to_string(),
            });
        }
        Ok(self.element_mut(node).set_name(candidate.name()))
    }

    // ── Value access ─────────────────────────────────────────────────

    /// Write a cell. Buffered once the graph is sealed.
    pub fn set_value(&mut self, value: ValueId, payload: impl Into<Payload>) -> ProcessResult<()> {
        let node = &mut self.values[value.index()];
        match &mut node.kind {
            ValueKind::Cell(cell) if node.element.is_valid() => {
                cell.set(payload);
                Ok(())
            }
            ValueKind::Cell(_) => Err(ProcessError::InvalidElement(node.element.id().to_string())),
            ValueKind::View(_) => Err(ProcessError::ReadOnlyValue(node.element.id().to_string())),
        }
    }

    /// Promote a cell's staged write. Views are ignored.
    pub fn commit_value(&mut self, value: ValueId, epoch: u64) -> bool {
        match &mut self.values[value.index()].kind {
            ValueKind::Cell(cell) => cell.commit(epoch),
            ValueKind::View(_) => false,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────
    //
    // Ids index straight into the arena; an id minted by another graph
    // panics here like any out-of-bounds slice access.

    pub fn value(&self, id: ValueId) -> &ValueNode {
        &self.values[id.index()]
    }

    pub fn condition(&self, id: ConditionId) -> &ConditionNode {
        &self.conditions[id.index()]
    }

    pub fn task(&self, id: TaskId) -> &TaskNode {
        &self.tasks[id.index()]
    }

    pub fn process(&self, id: ProcessId) -> &ProcessNode {
        &self.processes[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionNode {
        &self.functions[id.index()]
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut TaskNode {
        &mut self.tasks[id.index()]
    }

    pub(crate) fn process_mut(&mut self, id: ProcessId) -> &mut ProcessNode {
        &mut self.processes[id.index()]
    }

    pub(crate) fn condition_mut(&mut self, id: ConditionId) -> &mut ConditionNode {
        &mut self.conditions[id.index()]
    }

    pub fn element(&self, node: NodeRef) -> &Element {
        match node {
            NodeRef::Value(id) => &self.values[id.index()].element,
            NodeRef::Condition(id) => &self.conditions[id.index()].element,
            NodeRef::Task(id) => &self.tasks[id.index()].element,
            NodeRef::Process(id) => &self.processes[id.index()].element,
            NodeRef::Function(id) => &self.functions[id.index()].element,
        }
    }

    fn element_mut(&mut self, node: NodeRef) -> &mut Element {
        match node {
            NodeRef::Value(id) => &mut self.values[id.index()].element,
            NodeRef::Condition(id) => &mut self.conditions[id.index()].element,
            NodeRef::Task(id) => &mut self.tasks[id.index()].element,
            NodeRef::Process(id) => &mut self.processes[id.index()].element,
            NodeRef::Function(id) => &mut self.functions[id.index()].element,
        }
    }

    pub fn runnable_element(&self, runnable: RunnableId) -> &Element {
        match runnable {
            RunnableId::Task(id) => &self.tasks[id.index()].element,
            RunnableId::Process(id) => &self.processes[id.index()].element,
        }
    }

    /// Current state of a runnable; `None` for undefined sentinels
    pub fn state_of(&self, runnable: RunnableId) -> Option<RunState> {
        let (element, state) = match runnable {
            RunnableId::Task(id) => {
                let node = &self.tasks[id.index()];
                (&node.element, node.state)
            }
            RunnableId::Process(id) => {
                let node = &self.processes[id.index()];
                (&node.element, node.state)
            }
        };
        element.is_valid().then_some(state)
    }

    /// State of a runnable as conditions see it. Tasks are observed live,
    /// processes through the state published by the last commit pass.
    pub fn observed_state_of(&self, runnable: RunnableId) -> Option<RunState> {
        match runnable {
            RunnableId::Task(_) => self.state_of(runnable),
            RunnableId::Process(id) => {
                let node = &self.processes[id.index()];
                node.element.is_valid().then_some(node.published)
            }
        }
    }

    /// Make a process's live state visible to conditions. Returns whether
    /// the published state changed.
    pub fn publish_state(&mut self, process: ProcessId) -> bool {
        let node = &mut self.processes[process.index()];
        let changed = node.published != node.state;
        node.published = node.state;
        changed
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        (0..self.tasks.len()).map(TaskId::from_index)
    }

    pub fn process_ids(&self) -> impl Iterator<Item = ProcessId> + '_ {
        (0..self.processes.len())
            .map(ProcessId::from_index)
            .filter(|id| self.processes[id.index()].element.is_valid())
    }

    // ── Lookup by element id ─────────────────────────────────────────

    pub fn value_id(&self, id: &str) -> Option<ValueId> {
        self.values
            .iter()
            .position(|n| n.element.is_valid() && n.element.id() == id)
            .map(ValueId::from_index)
    }

    pub fn condition_id(&self, id: &str) -> Option<ConditionId> {
        self.conditions
            .iter()
            .position(|n| n.element.is_valid() && n.element.id() == id)
            .map(ConditionId::from_index)
    }

    pub fn task_id(&self, id: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .position(|n| n.element.is_valid() && n.element.id() == id)
            .map(TaskId::from_index)
    }

    pub fn process_id(&self, id: &str) -> Option<ProcessId> {
        self.processes
            .iter()
            .position(|n| n.element.is_valid() && n.element.id() == id)
            .map(ProcessId::from_index)
    }

    pub fn function_id(&self, id: &str) -> Option<FunctionId> {
        self.functions
            .iter()
            .position(|n| n.element.is_valid() && n.element.id() == id)
            .map(FunctionId::from_index)
    }

    // ── Structure walks ──────────────────────────────────────────────

    /// `task` and all of its descendants, parents before children
    pub fn task_tree(&self, task: TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut stack = vec![task];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.tasks[id.index()].children.iter().rev().copied());
        }
        out
    }

    /// Every task of a process, root tasks first in pre-order
    pub fn process_tasks(&self, process: ProcessId) -> Vec<TaskId> {
        self.processes[process.index()]
            .tasks
            .iter()
            .flat_map(|t| self.task_tree(*t))
            .collect()
    }

    /// Conditions reachable from `roots`, including through condition views
    pub fn reachable_conditions(&self, roots: &[ConditionId]) -> Vec<ConditionId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut stack: Vec<ConditionId> = roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            out.push(id);
            let condition = &self.conditions[id.index()].condition;
            let mut next = condition.child_conditions();
            for value in condition.operand_values() {
                next.extend(self.view_conditions(value));
            }
            stack.extend(next.into_iter().rev());
        }
        out
    }

    fn view_conditions(&self, value: ValueId) -> Vec<ConditionId> {
        let mut out = Vec::new();
        let mut current = Some(value);
        let mut hops = 0;
        while let Some(id) = current.take() {
            hops += 1;
            if hops > self.values.len() {
                break;
            }
            match self.values[id.index()].view() {
                Some(View::Condition(c)) => out.push(*c),
                Some(View::Index(inner)) | Some(View::Changed(inner)) => current = Some(*inner),
                Some(View::TaskState(_)) | None => {}
            }
        }
        out
    }

    /// Every condition wired into a process: events, done condition and
    /// the gates of its whole task tree
    pub fn process_conditions(&self, process: ProcessId) -> Vec<ConditionId> {
        let node = &self.processes[process.index()];
        let mut roots = vec![node.start_event, node.stop_event, node.done_condition];
        roots.extend(node.events.iter().copied());
        for task in self.process_tasks(process) {
            let t = &self.tasks[task.index()];
            roots.push(t.start_condition);
            roots.push(t.stop_condition);
        }
        self.reachable_conditions(&roots)
    }

    /// Wiring of a process that points at undefined sentinels.
    ///
    /// Such wiring is never an error at run time; it silently stalls.
    pub fn dangling_references(&self, process: ProcessId) -> Vec<DanglingRef> {
        let mut out = Vec::new();
        let node = &self.processes[process.index()];
        let owner = node.element.id().to_string();
        let undefined_condition = |id: ConditionId| !self.conditions[id.index()].element.is_valid();

        if undefined_condition(node.done_condition) {
            out.push(DanglingRef {
                owner: owner.clone(),
                slot: "done_condition".into(),
            });
        }
        for task in self.process_tasks(process) {
            let t = &self.tasks[task.index()];
            if undefined_condition(t.start_condition) {
                out.push(DanglingRef {
                    owner: t.element.id().to_string(),
                    slot: "start_condition".into(),
                });
            }
            if undefined_condition(t.stop_condition) {
                out.push(DanglingRef {
                    owner: t.element.id().to_string(),
                    slot: "stop_condition".into(),
                });
            }
            for value in &t.values {
                if !self.values[value.index()].element.is_valid() {
                    out.push(DanglingRef {
                        owner: t.element.id().to_string(),
                        slot: "values".into(),
                    });
                }
            }
        }
        for id in self.process_conditions(process) {
            let c = &self.conditions[id.index()];
            if !c.element.is_valid() {
                continue;
            }
            let owner = c.element.id().to_string();
            match &c.condition {
                Condition::Task { runnable, .. } if self.state_of(*runnable).is_none() => {
                    out.push(DanglingRef {
                        owner,
                        slot: "runnable".into(),
                    });
                }
                Condition::Value {
                    value, expected, ..
                } => {
                    for (slot, v) in [("value", value), ("expected", expected)] {
                        if !self.values[v.index()].element.is_valid() {
                            out.push(DanglingRef {
                                owner: owner.clone(),
                                slot: slot.into(),
                            });
                        }
                    }
                }
                Condition::All { children }
                | Condition::Any { children }
                | Condition::Sequenced { children, .. } => {
                    if children.iter().any(|child| undefined_condition(*child)) {
                        out.push(DanglingRef {
                            owner,
                            slot: "children".into(),
                        });
                    }
                }
                _ => {}
            }
        }
        out
    }

    /// Return a process and its task tree to `Ready` and rewind every
    /// sequenced cursor wired into them.
    pub fn reset_process(&mut self, process: ProcessId) {
        for task in self.process_tasks(process) {
            self.tasks[task.index()].state = RunState::Ready;
        }
        for condition in self.process_conditions(process) {
            self.conditions[condition.index()].condition.rewind();
        }
        let node = &mut self.processes[process.index()];
        node.state = RunState::Ready;
        node.published = RunState::Ready;
        tracing::debug!(
            process = %self.processes[process.index()].element.id(),
            "Process reset"
        );
    }

    /// Rewind sequenced cursors reachable from `condition`
    pub fn rewind(&mut self, condition: ConditionId) {
        for id in self.reachable_conditions(&[condition]) {
            self.conditions[id.index()].condition.rewind();
        }
    }

    /// Reset the descendants of an activity to `Ready`
    pub(crate) fn rearm_descendants(&mut self, activity: TaskId) {
        for task in self.task_tree(activity).into_iter().skip(1) {
            let node = &mut self.tasks[task.index()];
            node.state = RunState::Ready;
            let (start, stop) = (node.start_condition, node.stop_condition);
            self.rewind(start);
            self.rewind(stop);
        }
    }

    /// Container names requested by a process, by task kind
    pub fn routes(&self, process: ProcessId) -> &BTreeMap<TaskKind, String> {
        &self.processes[process.index()].containers
    }

    // ── Internal helpers ─────────────────────────────────────────────

    fn unique(&self, kind: ElementKind, name: &str) -> ProcessResult<Element> {
        let element = Element::new(kind, name);
        if self.id_taken(kind, element.id()) {
            return Err(ProcessError::DuplicateId {
                kind,
                id: element.id().to_string(),
            });
        }
        Ok(element)
    }

    pub(crate) fn id_taken(&self, kind: ElementKind, id: &str) -> bool {
        match kind {
            ElementKind::Value | ElementKind::View => self.value_id(id).is_some(),
            ElementKind::Condition | ElementKind::Event => self.condition_id(id).is_some(),
            ElementKind::Task | ElementKind::Activity => self.task_id(id).is_some(),
            ElementKind::Process => self.process_id(id).is_some(),
            ElementKind::Function => self.function_id(id).is_some(),
        }
    }

    fn ensure_build(&self, node: NodeRef) -> ProcessResult<()> {
        if self.is_sealed() {
            return Err(ProcessError::Sealed(self.element(node).id().to_string()));
        }
        Ok(())
    }

    fn ensure_unattached(&self, task: TaskId) -> ProcessResult<()> {
        let node = &self.tasks[task.index()];
        if !node.element.is_valid() {
            return Err(ProcessError::InvalidElement(node.element.id().to_string()));
        }
        if node.parent.is_some() || node.process.is_some() {
            return Err(ProcessError::AlreadyAttached(node.element.id().to_string()));
        }
        Ok(())
    }
}
