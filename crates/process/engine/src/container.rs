//! Containers: the tick scheduler over a set of root tasks
//!
//! A tick runs in phases. Every container finishes a phase before any
//! container starts the next one:
//!
//! 1. snapshot the active root tasks
//! 2. commit the buffered writes of task trees that are active or ran last
//!    tick, commit shared process values and publish process states
//! 3. execute the run actions of the snapshot
//! 4. update every process state machine
//! 5. update every task state machine
//!
//! Because all commits happen before any execution, a task always reads
//! the values committed at the start of the tick, whatever order tasks
//! run in. Writes made in phase 3 surface in the next tick's phase 2, even
//! when the writing task stopped in between.
//!
//! Processes update one pass behind their tasks: a process sees the task
//! states left by the previous tick, and tasks see the process state
//! published in this tick's commit.

use crate::graph::ProcessGraph;
use crate::ids::{ProcessId, RunnableId, TaskId};
use crate::process::ProcessMachine;
use crate::registry::FunctionRegistry;
use crate::task::TaskMachine;
use process_types::RunState;
use serde::{Deserialize, Serialize};

/// Receives task action failures
pub type ErrorHandler = Box<dyn FnMut(&TaskFault) + Send>;

/// A failed run action. The task keeps advancing on its own conditions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFault {
    /// Element id of the task
    pub task: String,
    pub message: String,
    pub epoch: u64,
}

/// A state change made during an update pass
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub runnable: RunnableId,
    /// Element id of the runnable
    pub element: String,
    pub from: RunState,
    pub to: RunState,
    pub epoch: u64,
}

/// Outcome of one tick
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub step: u64,
    pub epoch: u64,
    /// Number of run actions invoked
    pub executed: usize,
    /// Cells whose visible value changed in the commit pass
    pub committed: usize,
    pub faults: Vec<TaskFault>,
    pub transitions: Vec<Transition>,
    /// Ids of events fired by process updates
    pub fired_events: Vec<String>,
}

impl TickReport {
    pub fn new(step: u64, epoch: u64) -> Self {
        Self {
            step,
            epoch,
            ..Self::default()
        }
    }

    /// Transitions of one runnable
    pub fn transitions_of(&self, runnable: RunnableId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.runnable == runnable)
    }
}

fn log_fault(fault: &TaskFault) {
    tracing::error!(
        task = %fault.task,
        epoch = fault.epoch,
        message = %fault.message,
        "Task action failed"
    );
}

/// A scheduler for the root tasks routed to it
pub struct Container {
    name: String,
    tasks: Vec<TaskId>,
    processes: Vec<ProcessId>,
    active: Vec<TaskId>,
    /// Root tasks executed by the last execute pass
    ran: Vec<TaskId>,
    step: u64,
    error_handler: ErrorHandler,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
            processes: Vec::new(),
            active: Vec::new(),
            ran: Vec::new(),
            step: 0,
            error_handler: Box::new(log_fault),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root tasks in scheduling order
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn processes(&self) -> &[ProcessId] {
        &self.processes
    }

    /// Ticks this container took part in
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Active tasks captured by the last snapshot
    pub fn active(&self) -> &[TaskId] {
        &self.active
    }

    pub fn add_task(&mut self, task: TaskId) {
        if !self.tasks.contains(&task) {
            self.tasks.push(task);
        }
    }

    pub fn add_process(&mut self, process: ProcessId) {
        if !self.processes.contains(&process) {
            self.processes.push(process);
        }
    }

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = handler;
    }

    /// Capture the root tasks that will execute this tick
    pub fn snapshot_active(&mut self, graph: &ProcessGraph) -> &[TaskId] {
        self.step += 1;
        self.active = self
            .tasks
            .iter()
            .copied()
            .filter(|t| graph.task(*t).state().is_active())
            .collect();
        &self.active
    }

    /// Commit the values of active task trees, of trees that ran last
    /// tick and of every process, then publish process states.
    ///
    /// Returns the number of cells whose visible value changed.
    pub fn commit_pass(&self, graph: &mut ProcessGraph, epoch: u64) -> usize {
        let mut roots = self.active.clone();
        roots.extend(self.ran.iter().copied().filter(|t| !self.active.contains(t)));

        let mut values = Vec::new();
        for task in roots {
            for id in graph.task_tree(task) {
                values.extend(graph.task(id).values().iter().copied());
            }
        }
        for process in &self.processes {
            values.extend(graph.process(*process).values().iter().copied());
        }
        let committed = values
            .into_iter()
            .filter(|v| graph.commit_value(*v, epoch))
            .count();
        for process in &self.processes {
            graph.publish_state(*process);
        }
        committed
    }

    /// Run the snapshot. Faults go to the error handler and the report.
    pub fn execute_pass(
        &mut self,
        graph: &mut ProcessGraph,
        machine: &TaskMachine<'_>,
        report: &mut TickReport,
    ) {
        let mut faults = Vec::new();
        self.ran.clear();
        for task in &self.active {
            if graph.task(*task).state().is_active() {
                report.executed += machine.run(graph, *task, &mut faults);
                self.ran.push(*task);
            }
        }
        for fault in &faults {
            (self.error_handler)(fault);
        }
        report.faults.extend(faults);
    }

    pub fn update_tasks(
        &self,
        graph: &mut ProcessGraph,
        machine: &TaskMachine<'_>,
        report: &mut TickReport,
    ) {
        for task in &self.tasks {
            machine.update(graph, *task, &mut report.transitions);
        }
    }

    pub fn update_processes(
        &self,
        graph: &mut ProcessGraph,
        machine: &ProcessMachine<'_>,
        report: &mut TickReport,
    ) {
        for process in &self.processes {
            machine.update(
                graph,
                *process,
                &mut report.transitions,
                &mut report.fired_events,
            );
        }
    }

    /// Run every phase for this container alone, advancing the epoch.
    pub fn tick(
        &mut self,
        graph: &mut ProcessGraph,
        functions: &FunctionRegistry,
        max_depth: u32,
    ) -> TickReport {
        let epoch = graph.advance_epoch();
        let tasks = TaskMachine::new(functions, max_depth);
        let processes = ProcessMachine::new(functions, max_depth);

        self.snapshot_active(graph);
        let mut report = TickReport::new(self.step, epoch);
        report.committed = self.commit_pass(graph, epoch);
        self.execute_pass(graph, &tasks, &mut report);
        self.update_processes(graph, &processes, &mut report);
        self.update_tasks(graph, &tasks, &mut report);
        report
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("tasks", &self.tasks)
            .field("processes", &self.processes)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}
