//! Runtime: the entry point that owns a graph and drives it tick by tick
//!
//! The runtime holds the graph, the behavior registry and a set of named
//! containers. Admitting a process seals the graph and hands the process
//! and its root tasks to containers. Each [`Runtime::tick`] runs every
//! phase across all containers, so commits in one container can never
//! interleave with executions in another.

use crate::container::{Container, ErrorHandler, TickReport};
use crate::graph::ProcessGraph;
use crate::ids::{ProcessId, RunnableId};
use crate::process::ProcessMachine;
use crate::registry::FunctionRegistry;
use crate::task::TaskMachine;
use crate::trace::TraceLog;
use process_types::{EngineConfig, ProcessError, ProcessResult, RunState};

/// Owns a process graph and schedules it
#[derive(Debug)]
pub struct Runtime {
    config: EngineConfig,
    graph: ProcessGraph,
    functions: FunctionRegistry,
    containers: Vec<Container>,
    admitted: Vec<ProcessId>,
    step: u64,
    trace: TraceLog,
}

impl Runtime {
    /// Create a runtime with an empty graph and the default container
    pub fn new(config: EngineConfig) -> ProcessResult<Self> {
        let graph = ProcessGraph::new().with_auto_rearm(config.auto_rearm);
        Self::with_parts(config, graph, FunctionRegistry::new())
    }

    /// Create a runtime around a graph built elsewhere
    pub fn with_parts(
        config: EngineConfig,
        graph: ProcessGraph,
        functions: FunctionRegistry,
    ) -> ProcessResult<Self> {
        config.validate()?;
        let trace = TraceLog::new(if config.trace { config.trace_capacity } else { 0 });
        let containers = vec![Container::new(config.default_container.clone())];
        Ok(Self {
            config,
            graph,
            functions,
            containers,
            admitted: Vec::new(),
            step: 0,
            trace,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    /// Mutable graph access, for building before admission and for
    /// staging writes from the host between ticks
    pub fn graph_mut(&mut self) -> &mut ProcessGraph {
        &mut self.graph
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    /// Ticks run so far
    pub fn step(&self) -> u64 {
        self.step
    }

    // ── Containers ───────────────────────────────────────────────────

    pub fn add_container(&mut self, name: impl Into<String>) -> ProcessResult<()> {
        let name = name.into();
        if self.container(&name).is_some() {
            return Err(ProcessError::DuplicateContainer(name));
        }
        tracing::debug!(container = %name, "Container added");
        self.containers.push(Container::new(name));
        Ok(())
    }

    pub fn container(&self, name: &str) -> Option<&Container> {
        self.containers.iter().find(|c| c.name() == name)
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    pub fn set_error_handler(&mut self, container: &str, handler: ErrorHandler) -> ProcessResult<()> {
        let c = self
            .containers
            .iter_mut()
            .find(|c| c.name() == container)
            .ok_or_else(|| ProcessError::UnknownContainer(container.to_string()))?;
        c.set_error_handler(handler);
        Ok(())
    }

    fn container_index(&self, name: &str) -> ProcessResult<usize> {
        self.containers
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| ProcessError::UnknownContainer(name.to_string()))
    }

    // ── Admission ────────────────────────────────────────────────────

    /// Seal the graph and schedule a process.
    ///
    /// Root tasks go to the container routed for their kind, or to the
    /// default container. The process itself is updated by the default
    /// container.
    ///
    /// The first admission seals the whole graph, so every process must
    /// be built and wired before any of them is admitted. Adding a process
    /// afterwards fails with [`ProcessError::Sealed`].
    pub fn admit(&mut self, process: ProcessId) -> ProcessResult<()> {
        let node = self.graph.process(process);
        let id = node.element().id().to_string();
        if !node.element().is_valid() {
            return Err(ProcessError::InvalidElement(id));
        }
        if self.admitted.contains(&process) {
            return Err(ProcessError::AlreadyAdmitted(id));
        }

        let default = self.container_index(&self.config.default_container)?;
        let mut placements = Vec::new();
        for task in node.tasks() {
            let kind = self.graph.task(*task).kind();
            let index = match self.graph.routes(process).get(&kind) {
                Some(name) => self.container_index(name)?,
                None => default,
            };
            placements.push((index, *task));
        }

        self.graph.seal();
        for (index, task) in placements {
            self.containers[index].add_task(task);
        }
        self.containers[default].add_process(process);
        self.admitted.push(process);

        for dangling in self.graph.dangling_references(process) {
            tracing::warn!(process = %id, reference = %dangling, "Dangling reference");
        }
        for function in self.functions.unresolved(&self.graph) {
            tracing::warn!(
                process = %id,
                function = %self.graph.function(function).reference(),
                "Function reference has no registered behavior"
            );
        }
        tracing::info!(process = %id, tasks = self.graph.process(process).tasks().len(), "Process admitted");
        Ok(())
    }

    pub fn is_admitted(&self, process: ProcessId) -> bool {
        self.admitted.contains(&process)
    }

    // ── Ticking ──────────────────────────────────────────────────────

    /// Run one tick across every container
    pub fn tick(&mut self) -> TickReport {
        let epoch = self.graph.advance_epoch();
        self.step += 1;
        let mut report = TickReport::new(self.step, epoch);

        let depth = self.config.max_eval_depth;
        let tasks = TaskMachine::new(&self.functions, depth);
        let processes = ProcessMachine::new(&self.functions, depth);

        for container in &mut self.containers {
            container.snapshot_active(&self.graph);
        }
        for container in &self.containers {
            report.committed += container.commit_pass(&mut self.graph, epoch);
        }
        for container in &mut self.containers {
            container.execute_pass(&mut self.graph, &tasks, &mut report);
        }
        for container in &self.containers {
            container.update_processes(&mut self.graph, &processes, &mut report);
        }
        for container in &self.containers {
            container.update_tasks(&mut self.graph, &tasks, &mut report);
        }

        if self.config.trace {
            self.trace.record_tick(&report);
        }
        tracing::trace!(
            step = report.step,
            executed = report.executed,
            transitions = report.transitions.len(),
            "Tick complete"
        );
        report
    }

    pub fn run_ticks(&mut self, ticks: u64) -> Vec<TickReport> {
        (0..ticks).map(|_| self.tick()).collect()
    }

    /// Tick until the process is `Done`. Returns the ticks taken.
    pub fn run_until_done(&mut self, process: ProcessId) -> ProcessResult<u64> {
        let mut ticks = 0;
        while self.graph.state_of(process.into()) != Some(RunState::Done) {
            if ticks == self.config.max_ticks {
                let id = self.graph.process(process).element().id().to_string();
                tracing::warn!(process = %id, ticks, "Process stalled");
                return Err(ProcessError::Stalled { process: id, ticks });
            }
            self.tick();
            ticks += 1;
        }
        Ok(ticks)
    }

    pub fn state_of(&self, runnable: impl Into<RunnableId>) -> Option<RunState> {
        self.graph.state_of(runnable.into())
    }

    /// Put an admitted process back to `Ready` so it runs again.
    pub fn reset(&mut self, process: ProcessId) {
        self.graph.reset_process(process);
    }
}
