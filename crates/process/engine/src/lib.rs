//! Process Engine
//!
//! A synchronous, tick-driven runtime for small BPMN-style processes.
//! Tasks and activities advance through explicit lifecycle states under
//! boolean gate conditions; processes wrap a set of root tasks with start
//! and stop events and a done condition.
//!
//! # Architecture
//!
//! ```text
//! Runtime
//!   ├── ProcessGraph      (arena of processes, tasks, conditions, values)
//!   ├── FunctionRegistry  (predicates, comparisons, actions by reference)
//!   ├── Container(s)      (tick phases over routed root tasks)
//!   └── TraceLog          (transitions, faults, fired events)
//! ```
//!
//! Each tick: advance the epoch, snapshot active tasks, commit buffered
//! writes and publish process states, execute run actions, then update
//! every process and every task state machine. Writes made while executing
//! become visible on the next tick, so execution order inside a tick never
//! matters.
//!
//! # Example
//!
//! ```
//! use process_engine::{Condition, Runtime};
//! use process_types::{EngineConfig, RunState};
//!
//! let mut runtime = Runtime::new(EngineConfig::default()).unwrap();
//! let graph = runtime.graph_mut();
//! let process = graph.add_process("Hello").unwrap();
//! let done = graph.add_condition("always", Condition::all(vec![])).unwrap();
//! graph.set_done_condition(process, done);
//!
//! runtime.admit(process).unwrap();
//! runtime.run_until_done(process).unwrap();
//! assert_eq!(runtime.state_of(process), Some(RunState::Done));
//! ```

#![deny(unsafe_code)]

pub mod condition;
pub mod container;
pub mod eval;
pub mod graph;
pub mod ids;
pub mod interchange;
pub mod process;
pub mod registry;
pub mod runtime;
pub mod task;
pub mod trace;
pub mod value;
pub mod view;

pub use condition::{Condition, ConditionNode, EventBinding};
pub use container::{Container, ErrorHandler, TaskFault, TickReport, Transition};
pub use eval::{Evaluator, DEFAULT_MAX_EVAL_DEPTH};
pub use graph::{DanglingRef, NodeRef, Phase, ProcessGraph};
pub use ids::{ConditionId, FunctionId, ProcessId, RunnableId, TaskId, ValueId};
pub use interchange::{export_graph, export_process, import, ImportReport, ProcessDocument};
pub use process::{ProcessMachine, ProcessNode};
pub use registry::{ActionFn, Behavior, ComparisonFn, FunctionNode, FunctionRegistry, PredicateFn};
pub use runtime::Runtime;
pub use task::{TaskMachine, TaskNode, TaskScope};
pub use trace::{TraceEvent, TraceLog, TraceRecord};
pub use value::{ValueKind, ValueNode};
pub use view::View;
