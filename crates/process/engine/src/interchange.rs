//! Interchange: flat, id-keyed documents for storing process graphs
//!
//! Export walks a process and writes one record per reachable element.
//! Cross references are element ids, and references to undefined
//! sentinels are written as `null`. Import runs in two passes. The first
//! creates every element; the second resolves ids into arena indices.
//! An id that names nothing resolves to the matching sentinel and is
//! listed in [`ImportReport::unresolved`] instead of failing the import.

use crate::condition::{Condition, EventBinding};
use crate::graph::ProcessGraph;
use crate::ids::{ConditionId, FunctionId, ProcessId, RunnableId, TaskId, ValueId};
use crate::value::ValueKind;
use crate::view::View;
use process_types::{FunctionRef, Payload, ProcessError, ProcessResult, RunState, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Version written by [`export_process`]; import rejects anything else.
pub const FORMAT_VERSION: u32 = 1;

/// A stored process graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessDocument {
    pub format_version: u32,
    /// Id of the exported process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    pub elements: Vec<ElementRecord>,
}

impl ProcessDocument {
    pub fn to_json(&self) -> ProcessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ProcessResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// `(category, id)` of every record
    pub fn ids(&self) -> Vec<(&'static str, &str)> {
        self.elements
            .iter()
            .map(|e| (e.category(), e.id()))
            .collect()
    }
}

/// One element of a document, tagged by category
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ElementRecord {
    Process(ProcessRecord),
    Condition(ConditionRecord),
    Task(TaskRecord),
    Value(ValueRecord),
    Function(FunctionRecord),
}

impl ElementRecord {
    pub fn category(&self) -> &'static str {
        match self {
            Self::Process(_) => "process",
            Self::Condition(_) => "condition",
            Self::Task(_) => "task",
            Self::Value(_) => "value",
            Self::Function(_) => "function",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Process(r) => &r.id,
            Self::Condition(r) => &r.id,
            Self::Task(r) => &r.id,
            Self::Value(r) => &r.id,
            Self::Function(r) => &r.id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: String,
    pub name: String,
    pub start_event: Option<String>,
    pub stop_event: Option<String>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    pub done_condition: Option<String>,
    #[serde(default)]
    pub containers: BTreeMap<TaskKind, String>,
}

/// Reference to a task or a process
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnableRecord {
    Task(String),
    Process(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionRule {
    Standalone {
        predicate: Option<String>,
    },
    Value {
        value: Option<String>,
        expected: Option<String>,
        #[serde(default)]
        comparison: Option<String>,
        #[serde(default)]
        negate: bool,
    },
    Task {
        runnable: Option<RunnableRecord>,
        expected: RunState,
    },
    All {
        children: Vec<Option<String>>,
    },
    Any {
        children: Vec<Option<String>>,
    },
    Sequenced {
        children: Vec<Option<String>>,
    },
    Event {
        process: Option<String>,
        gate: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionRecord {
    pub id: String,
    pub name: String,
    pub rule: ConditionRule,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    pub kind: TaskKind,
    pub start_condition: Option<String>,
    pub stop_condition: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub auto_rearm: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueData {
    Cell { initial: Payload },
    Condition { condition: Option<String> },
    TaskState { runnable: Option<RunnableRecord> },
    Changed { source: Option<String> },
    Index { source: Option<String> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    pub id: String,
    pub name: String,
    pub data: ValueData,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub id: String,
    pub name: String,
    pub reference: FunctionRef,
}

/// Outcome of an import
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of records that produced or updated an element
    pub created: usize,
    /// References that named no element, as `owner.slot -> id`
    pub unresolved: Vec<String>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.unresolved.is_empty()
    }
}

// ── Export ───────────────────────────────────────────────────────────

/// Export one process and everything it reaches
pub fn export_process(graph: &ProcessGraph, process: ProcessId) -> ProcessDocument {
    let mut walk = Walk::new(graph);
    walk.process(process);
    walk.into_document(Some(graph.process(process).element().id().to_string()))
}

/// Export every valid process of a graph
pub fn export_graph(graph: &ProcessGraph) -> ProcessDocument {
    let mut walk = Walk::new(graph);
    for process in graph.process_ids() {
        walk.process(process);
    }
    walk.into_document(None)
}

/// Reachability walk collecting elements in discovery order
struct Walk<'g> {
    graph: &'g ProcessGraph,
    processes: Vec<ProcessId>,
    conditions: Vec<ConditionId>,
    tasks: Vec<TaskId>,
    values: Vec<ValueId>,
    functions: Vec<FunctionId>,
    seen_conditions: HashSet<ConditionId>,
    seen_tasks: HashSet<TaskId>,
    seen_values: HashSet<ValueId>,
    seen_functions: HashSet<FunctionId>,
}

impl<'g> Walk<'g> {
    fn new(graph: &'g ProcessGraph) -> Self {
        Self {
            graph,
            processes: Vec::new(),
            conditions: Vec::new(),
            tasks: Vec::new(),
            values: Vec::new(),
            functions: Vec::new(),
            seen_conditions: HashSet::new(),
            seen_tasks: HashSet::new(),
            seen_values: HashSet::new(),
            seen_functions: HashSet::new(),
        }
    }

    fn process(&mut self, id: ProcessId) {
        let graph = self.graph;
        let node = graph.process(id);
        if !node.element().is_valid() || self.processes.contains(&id) {
            return;
        }
        self.processes.push(id);
        if let Some(view) = node.state_view() {
            self.value(view);
        }
        self.condition(node.start_event());
        self.condition(node.stop_event());
        for event in node.events() {
            self.condition(*event);
        }
        self.condition(node.done_condition());
        for value in node.values() {
            self.value(*value);
        }
        for task in node.tasks() {
            self.task(*task);
        }
    }

    fn task(&mut self, id: TaskId) {
        let graph = self.graph;
        let node = graph.task(id);
        if !node.element().is_valid() || !self.seen_tasks.insert(id) {
            return;
        }
        self.tasks.push(id);
        self.condition(node.start_condition());
        self.condition(node.stop_condition());
        if let Some(action) = node.action() {
            self.function(action);
        }
        for value in node.values() {
            self.value(*value);
        }
        for child in node.children() {
            self.task(*child);
        }
    }

    fn condition(&mut self, id: ConditionId) {
        let graph = self.graph;
        let node = graph.condition(id);
        if !node.element().is_valid() || !self.seen_conditions.insert(id) {
            return;
        }
        self.conditions.push(id);
        let condition = node.condition();
        for child in condition.child_conditions() {
            self.condition(child);
        }
        for value in condition.operand_values() {
            self.value(value);
        }
        for function in condition.functions() {
            self.function(function);
        }
    }

    fn value(&mut self, id: ValueId) {
        let graph = self.graph;
        let node = graph.value(id);
        if !node.element().is_valid() || !self.seen_values.insert(id) {
            return;
        }
        self.values.push(id);
        match node.view() {
            Some(View::Condition(c)) => self.condition(*c),
            Some(View::Changed(source)) | Some(View::Index(source)) => self.value(*source),
            Some(View::TaskState(_)) | None => {}
        }
    }

    fn function(&mut self, id: FunctionId) {
        if self.graph.function(id).element().is_valid() && self.seen_functions.insert(id) {
            self.functions.push(id);
        }
    }

    fn into_document(self, root: Option<String>) -> ProcessDocument {
        let g = self.graph;
        let mut elements = Vec::new();
        for id in &self.processes {
            elements.push(ElementRecord::Process(process_record(g, *id)));
        }
        for id in &self.tasks {
            elements.push(ElementRecord::Task(task_record(g, *id)));
        }
        for id in &self.conditions {
            elements.push(ElementRecord::Condition(condition_record(g, *id)));
        }
        for id in &self.values {
            elements.push(ElementRecord::Value(value_record(g, *id)));
        }
        for id in &self.functions {
            let node = g.function(*id);
            elements.push(ElementRecord::Function(FunctionRecord {
                id: node.element().id().to_string(),
                name: node.element().name().to_string(),
                reference: node.reference().clone(),
            }));
        }
        ProcessDocument {
            format_version: FORMAT_VERSION,
            root,
            elements,
        }
    }
}

fn condition_ref(g: &ProcessGraph, id: ConditionId) -> Option<String> {
    let element = g.condition(id).element();
    element.is_valid().then(|| element.id().to_string())
}

fn condition_refs(g: &ProcessGraph, ids: &[ConditionId]) -> Vec<Option<String>> {
    ids.iter().map(|c| condition_ref(g, *c)).collect()
}

fn process_ref(g: &ProcessGraph, id: ProcessId) -> Option<String> {
    let element = g.process(id).element();
    element.is_valid().then(|| element.id().to_string())
}

fn value_ref(g: &ProcessGraph, id: ValueId) -> Option<String> {
    let element = g.value(id).element();
    element.is_valid().then(|| element.id().to_string())
}

fn function_ref(g: &ProcessGraph, id: FunctionId) -> Option<String> {
    let element = g.function(id).element();
    element.is_valid().then(|| element.id().to_string())
}

fn runnable_ref(g: &ProcessGraph, id: RunnableId) -> Option<RunnableRecord> {
    let element = g.runnable_element(id);
    if !element.is_valid() {
        return None;
    }
    let id_str = element.id().to_string();
    Some(match id {
        RunnableId::Task(_) => RunnableRecord::Task(id_str),
        RunnableId::Process(_) => RunnableRecord::Process(id_str),
    })
}

fn process_record(g: &ProcessGraph, id: ProcessId) -> ProcessRecord {
    let node = g.process(id);
    ProcessRecord {
        id: node.element().id().to_string(),
        name: node.element().name().to_string(),
        start_event: condition_ref(g, node.start_event()),
        stop_event: condition_ref(g, node.stop_event()),
        events: node
            .events()
            .iter()
            .filter_map(|e| condition_ref(g, *e))
            .collect(),
        tasks: node
            .tasks()
            .iter()
            .map(|t| g.task(*t).element().id().to_string())
            .collect(),
        values: node.values().iter().filter_map(|v| value_ref(g, *v)).collect(),
        done_condition: condition_ref(g, node.done_condition()),
        containers: node.containers().clone(),
    }
}

fn task_record(g: &ProcessGraph, id: TaskId) -> TaskRecord {
    let node = g.task(id);
    TaskRecord {
        id: node.element().id().to_string(),
        name: node.element().name().to_string(),
        kind: node.kind(),
        start_condition: condition_ref(g, node.start_condition()),
        stop_condition: condition_ref(g, node.stop_condition()),
        action: node.action().and_then(|f| function_ref(g, f)),
        values: node.values().iter().filter_map(|v| value_ref(g, *v)).collect(),
        children: node
            .children()
            .iter()
            .map(|t| g.task(*t).element().id().to_string())
            .collect(),
        auto_rearm: node.auto_rearm(),
    }
}

fn condition_record(g: &ProcessGraph, id: ConditionId) -> ConditionRecord {
    let node = g.condition(id);
    let rule = match node.condition() {
        Condition::Standalone { predicate } => ConditionRule::Standalone {
            predicate: predicate.and_then(|f| function_ref(g, f)),
        },
        Condition::Value {
            value,
            expected,
            comparison,
            negate,
        } => ConditionRule::Value {
            value: value_ref(g, *value),
            expected: value_ref(g, *expected),
            comparison: comparison.and_then(|f| function_ref(g, f)),
            negate: *negate,
        },
        Condition::Task { runnable, expected } => ConditionRule::Task {
            runnable: runnable_ref(g, *runnable),
            expected: *expected,
        },
        Condition::All { children } => ConditionRule::All {
            children: condition_refs(g, children),
        },
        Condition::Any { children } => ConditionRule::Any {
            children: condition_refs(g, children),
        },
        Condition::Sequenced { children, .. } => ConditionRule::Sequenced {
            children: condition_refs(g, children),
        },
        Condition::Event(binding) => ConditionRule::Event {
            process: process_ref(g, binding.process),
            gate: condition_ref(g, binding.gate),
        },
    };
    ConditionRecord {
        id: node.element().id().to_string(),
        name: node.element().name().to_string(),
        rule,
    }
}

fn value_record(g: &ProcessGraph, id: ValueId) -> ValueRecord {
    let node = g.value(id);
    let data = match node.kind() {
        ValueKind::Cell(cell) => ValueData::Cell {
            initial: cell.get().clone(),
        },
        ValueKind::View(View::Condition(c)) => ValueData::Condition {
            condition: condition_ref(g, *c),
        },
        ValueKind::View(View::TaskState(r)) => ValueData::TaskState {
            runnable: runnable_ref(g, *r),
        },
        ValueKind::View(View::Changed(v)) => ValueData::Changed {
            source: value_ref(g, *v),
        },
        ValueKind::View(View::Index(v)) => ValueData::Index {
            source: value_ref(g, *v),
        },
    };
    ValueRecord {
        id: node.element().id().to_string(),
        name: node.element().name().to_string(),
        data,
    }
}

// ── Import ───────────────────────────────────────────────────────────

/// Rebuild a graph from a document. The graph comes back unsealed.
pub fn import(doc: &ProcessDocument) -> ProcessResult<(ProcessGraph, ImportReport)> {
    if doc.format_version != FORMAT_VERSION {
        return Err(ProcessError::Interchange(format!(
            "unsupported format version {}",
            doc.format_version
        )));
    }
    let mut graph = ProcessGraph::new();
    let mut ids = IdTables::default();
    let mut report = ImportReport::default();

    // Pass 1: create. Processes first, since they generate their own
    // lifecycle elements which the matching records then update.
    let mut generated = HashSet::new();
    for record in &doc.elements {
        if let ElementRecord::Process(r) = record {
            let pid = graph.add_process(&r.name)?;
            ids.processes.insert(r.id.clone(), pid);
            let node = graph.process(pid);
            let (start, stop) = (node.start_event(), node.stop_event());
            let state_view = node.state_view();
            for c in [start, stop] {
                let id = graph.condition(c).element().id().to_string();
                generated.insert(("condition", id.clone()));
                ids.conditions.insert(id, c);
                if let Some(binding) = graph.condition(c).condition().event() {
                    let gate = binding.gate;
                    if graph.condition(gate).element().is_valid() {
                        let id = graph.condition(gate).element().id().to_string();
                        generated.insert(("condition", id.clone()));
                        ids.conditions.insert(id, gate);
                    }
                }
            }
            if let Some(view) = state_view {
                let mut literals = vec![view];
                literals.extend(graph.value_id(&format!("{}_ready", graph.process(pid).element().id())));
                for v in literals {
                    let id = graph.value(v).element().id().to_string();
                    generated.insert(("value", id.clone()));
                    ids.values.insert(id, v);
                }
            }
            report.created += 1;
        }
    }

    for record in &doc.elements {
        let key = (record.category(), record.id().to_string());
        let exists = match record {
            ElementRecord::Value(_) => ids.values.contains_key(record.id()),
            ElementRecord::Condition(_) => ids.conditions.contains_key(record.id()),
            ElementRecord::Task(_) => ids.tasks.contains_key(record.id()),
            ElementRecord::Function(_) => ids.functions.contains_key(record.id()),
            ElementRecord::Process(_) => continue,
        };
        if exists {
            if generated.contains(&key) {
                continue;
            }
            return Err(ProcessError::Interchange(format!(
                "duplicate {} record '{}'",
                key.0, key.1
            )));
        }
        match record {
            ElementRecord::Function(r) => {
                let id = graph.add_function(&r.name, r.reference.clone())?;
                ids.functions.insert(r.id.clone(), id);
            }
            ElementRecord::Value(r) => {
                let id = match &r.data {
                    ValueData::Cell { initial } => graph.add_value(&r.name, initial.clone())?,
                    _ => {
                        let placeholder = graph.undefined_value();
                        graph.add_view(&r.name, View::Index(placeholder))?
                    }
                };
                ids.values.insert(r.id.clone(), id);
            }
            ElementRecord::Condition(r) => {
                let placeholder = match r.rule {
                    ConditionRule::Event { .. } => {
                        let process = graph.undefined_process();
                        let gate = graph.undefined_condition();
                        Condition::Event(EventBinding::new(process, gate))
                    }
                    _ => Condition::never(),
                };
                let id = graph.add_condition(&r.name, placeholder)?;
                ids.conditions.insert(r.id.clone(), id);
            }
            ElementRecord::Task(r) => {
                let id = match r.kind {
                    TaskKind::Task => graph.add_task(&r.name)?,
                    TaskKind::Activity => graph.add_activity(&r.name)?,
                };
                ids.tasks.insert(r.id.clone(), id);
            }
            ElementRecord::Process(_) => {}
        }
        report.created += 1;
    }

    // Pass 2: resolve references
    for record in &doc.elements {
        match record {
            ElementRecord::Value(r) => {
                let Some(id) = ids.values.get(&r.id).copied() else {
                    continue;
                };
                let owner = r.id.as_str();
                let view = match &r.data {
                    ValueData::Cell { .. } => continue,
                    ValueData::Condition { condition } => {
                        View::Condition(ids.condition(&mut graph, owner, "condition", condition))
                    }
                    ValueData::TaskState { runnable } => {
                        View::TaskState(ids.runnable(&mut graph, owner, "runnable", runnable))
                    }
                    ValueData::Changed { source } => {
                        View::Changed(ids.value(&mut graph, owner, "source", source))
                    }
                    ValueData::Index { source } => {
                        View::Index(ids.value(&mut graph, owner, "source", source))
                    }
                };
                graph.values[id.index()].kind = ValueKind::View(view);
            }
            ElementRecord::Condition(r) => {
                let Some(id) = ids.conditions.get(&r.id).copied() else {
                    continue;
                };
                let condition = ids.build_condition(&mut graph, &r.id, &r.rule);
                graph.condition_mut(id).condition = condition;
            }
            ElementRecord::Task(r) => {
                let Some(id) = ids.tasks.get(&r.id).copied() else {
                    continue;
                };
                let owner = r.id.as_str();
                let start = ids.condition(&mut graph, owner, "start_condition", &r.start_condition);
                let stop = ids.condition(&mut graph, owner, "stop_condition", &r.stop_condition);
                graph.set_start_condition(id, start)?;
                graph.set_stop_condition(id, stop)?;
                if let Some(action) = ids.function(&mut graph, owner, "action", &r.action) {
                    graph.set_action(id, action)?;
                }
                graph.set_auto_rearm(id, r.auto_rearm)?;
                for value in &r.values {
                    if let Some(v) = ids.lookup_value(owner, "values", value) {
                        graph.attach_value(id, v)?;
                    }
                }
                for child in &r.children {
                    if let Some(c) = ids.lookup_task(owner, "children", child) {
                        graph.add_child(id, c)?;
                    }
                }
            }
            ElementRecord::Process(r) => {
                let Some(pid) = ids.processes.get(&r.id).copied() else {
                    continue;
                };
                let owner = r.id.as_str();
                for event in &r.events {
                    if let Some(e) = ids.lookup_condition(owner, "events", event) {
                        graph.add_event(pid, e)?;
                    }
                }
                for task in &r.tasks {
                    if let Some(t) = ids.lookup_task(owner, "tasks", task) {
                        graph.add_process_task(pid, t)?;
                    }
                }
                for value in &r.values {
                    if let Some(v) = ids.lookup_value(owner, "values", value) {
                        graph.add_process_value(pid, v)?;
                    }
                }
                let done = ids.condition(&mut graph, owner, "done_condition", &r.done_condition);
                graph.set_done_condition(pid, done);
                for (kind, container) in &r.containers {
                    graph.route(pid, *kind, container.clone())?;
                }
            }
            ElementRecord::Function(_) => {}
        }
    }

    report.unresolved = ids.unresolved;
    for missing in &report.unresolved {
        tracing::warn!(reference = %missing, "Unresolved reference resolved to undefined");
    }
    tracing::debug!(
        created = report.created,
        unresolved = report.unresolved.len(),
        "Process document imported"
    );
    Ok((graph, report))
}

/// Element id to arena index, per category
#[derive(Default)]
struct IdTables {
    processes: HashMap<String, ProcessId>,
    conditions: HashMap<String, ConditionId>,
    tasks: HashMap<String, TaskId>,
    values: HashMap<String, ValueId>,
    functions: HashMap<String, FunctionId>,
    unresolved: Vec<String>,
}

impl IdTables {
    fn miss(&mut self, owner: &str, slot: &str, id: &str) {
        self.unresolved.push(format!("{owner}.{slot} -> {id}"));
    }

    fn lookup_value(&mut self, owner: &str, slot: &str, id: &str) -> Option<ValueId> {
        let found = self.values.get(id).copied();
        if found.is_none() {
            self.miss(owner, slot, id);
        }
        found
    }

    fn lookup_task(&mut self, owner: &str, slot: &str, id: &str) -> Option<TaskId> {
        let found = self.tasks.get(id).copied();
        if found.is_none() {
            self.miss(owner, slot, id);
        }
        found
    }

    fn lookup_condition(&mut self, owner: &str, slot: &str, id: &str) -> Option<ConditionId> {
        let found = self.conditions.get(id).copied();
        if found.is_none() {
            self.miss(owner, slot, id);
        }
        found
    }

    fn value(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        slot: &str,
        id: &Option<String>,
    ) -> ValueId {
        id.as_deref()
            .and_then(|id| self.lookup_value(owner, slot, id))
            .unwrap_or_else(|| graph.undefined_value())
    }

    fn condition(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        slot: &str,
        id: &Option<String>,
    ) -> ConditionId {
        id.as_deref()
            .and_then(|id| self.lookup_condition(owner, slot, id))
            .unwrap_or_else(|| graph.undefined_condition())
    }

    fn function(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        slot: &str,
        id: &Option<String>,
    ) -> Option<FunctionId> {
        let id = id.as_deref()?;
        match self.functions.get(id).copied() {
            Some(f) => Some(f),
            None => {
                self.miss(owner, slot, id);
                Some(graph.undefined_function())
            }
        }
    }

    fn process(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        slot: &str,
        id: &Option<String>,
    ) -> ProcessId {
        if let Some(id) = id.as_deref() {
            if let Some(p) = self.processes.get(id).copied() {
                return p;
            }
            self.miss(owner, slot, id);
        }
        graph.undefined_process()
    }

    fn runnable(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        slot: &str,
        record: &Option<RunnableRecord>,
    ) -> RunnableId {
        match record {
            Some(RunnableRecord::Task(id)) => match self.lookup_task(owner, slot, id) {
                Some(t) => t.into(),
                None => graph.undefined_task().into(),
            },
            Some(RunnableRecord::Process(id)) => {
                self.process(graph, owner, slot, &Some(id.clone())).into()
            }
            None => graph.undefined_task().into(),
        }
    }

    fn conditions(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        ids: &[Option<String>],
    ) -> Vec<ConditionId> {
        ids.iter()
            .map(|c| self.condition(graph, owner, "children", c))
            .collect()
    }

    fn build_condition(
        &mut self,
        graph: &mut ProcessGraph,
        owner: &str,
        rule: &ConditionRule,
    ) -> Condition {
        match rule {
            ConditionRule::Standalone { predicate } => Condition::Standalone {
                predicate: self.function(graph, owner, "predicate", predicate),
            },
            ConditionRule::Value {
                value,
                expected,
                comparison,
                negate,
            } => Condition::Value {
                value: self.value(graph, owner, "value", value),
                expected: self.value(graph, owner, "expected", expected),
                comparison: self.function(graph, owner, "comparison", comparison),
                negate: *negate,
            },
            ConditionRule::Task { runnable, expected } => Condition::Task {
                runnable: self.runnable(graph, owner, "runnable", runnable),
                expected: *expected,
            },
            ConditionRule::All { children } => Condition::all(self.conditions(graph, owner, children)),
            ConditionRule::Any { children } => Condition::any(self.conditions(graph, owner, children)),
            ConditionRule::Sequenced { children } => {
                Condition::sequenced(self.conditions(graph, owner, children))
            }
            ConditionRule::Event { process, gate } => Condition::Event(EventBinding::new(
                self.process(graph, owner, "process", process),
                self.condition(graph, owner, "gate", gate),
            )),
        }
    }
}
