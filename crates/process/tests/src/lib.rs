//! Shared fixtures for the process engine test suites.
//!
//! Each fixture builds a graph, registers its behaviors and hands back an
//! unadmitted [`Runtime`] together with the ids a test needs to inspect.

use process_engine::{Condition, ProcessId, Runtime, TaskId, TaskScope};
use process_types::{EngineConfig, FunctionRef, ProcessResult, RunState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Install a test subscriber once. Honors `RUST_LOG`; silent by default.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_test_writer()
        .try_init();
}

/// The countdown process: one activity driving a decrementing task and a
/// task that records every change of the shared counter.
pub struct Countdown {
    pub runtime: Runtime,
    pub process: ProcessId,
    pub activity: TaskId,
    pub countdown: TaskId,
    pub display: TaskId,
    /// Values seen by `display`, in order
    pub shown: Arc<Mutex<Vec<i64>>>,
    pub decrements: Arc<AtomicUsize>,
}

impl Countdown {
    pub fn shown(&self) -> Vec<i64> {
        self.shown.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn decrements(&self) -> usize {
        self.decrements.load(Ordering::SeqCst)
    }
}

pub const COUNTDOWN_START: i64 = 10;

pub fn countdown_runtime(config: EngineConfig) -> ProcessResult<Countdown> {
    let mut runtime = Runtime::new(config)?;
    let shown = Arc::new(Mutex::new(Vec::new()));
    let decrements = Arc::new(AtomicUsize::new(0));

    let decrement_ref = FunctionRef::new("countdown", "decrement", "task");
    let display_ref = FunctionRef::new("countdown", "display", "task");

    let graph = runtime.graph_mut();
    let process = graph.add_process("Countdown")?;
    let count = graph.add_value("count", COUNTDOWN_START)?;
    let zero = graph.add_value("zero", 0)?;
    let running = graph.add_value("running", RunState::Running.as_str())?;
    graph.add_process_value(process, count)?;

    let state_view = graph
        .process(process)
        .state_view()
        .ok_or_else(|| process_types::ProcessError::InvalidElement("countdown".into()))?;
    let process_running =
        graph.add_condition("countdown running", Condition::value(state_view, running))?;
    let at_zero = graph.add_condition("count is zero", Condition::value(count, zero))?;

    let activity = graph.add_activity("Countdown Activity")?;
    let countdown = graph.add_task("countdown")?;
    let display = graph.add_task("display")?;
    graph.add_child(activity, countdown)?;
    graph.add_child(activity, display)?;
    graph.add_process_task(process, activity)?;

    let activity_running = graph.add_condition(
        "activity running",
        Condition::task_state(activity, RunState::Running),
    )?;
    let countdown_done = graph.add_condition(
        "countdown done",
        Condition::task_state(countdown, RunState::Done),
    )?;
    let display_done =
        graph.add_condition("display done", Condition::task_state(display, RunState::Done))?;
    let children_done = graph.add_condition(
        "children done",
        Condition::all(vec![countdown_done, display_done]),
    )?;
    let display_stop = graph.add_condition(
        "display stop",
        Condition::any(vec![countdown_done, at_zero]),
    )?;
    let activity_done = graph.add_condition("activity done", Condition::task(activity))?;

    graph.set_start_condition(activity, process_running)?;
    graph.set_stop_condition(activity, children_done)?;
    graph.set_start_condition(countdown, activity_running)?;
    graph.set_stop_condition(countdown, at_zero)?;
    graph.set_start_condition(display, activity_running)?;
    graph.set_stop_condition(display, display_stop)?;

    let decrement_fn = graph.add_function("decrement", decrement_ref.clone())?;
    let display_fn = graph.add_function("display", display_ref.clone())?;
    graph.set_action(countdown, decrement_fn)?;
    graph.set_action(display, display_fn)?;
    graph.set_done_condition(process, activity_done);

    let counter = Arc::clone(&decrements);
    runtime.functions_mut().register_action(
        decrement_ref,
        Arc::new(move |scope: &mut TaskScope<'_>| -> ProcessResult<()> {
            let n = scope.get_index("count");
            if n > 0 {
                counter.fetch_add(1, Ordering::SeqCst);
                scope.set("count", n - 1)?;
            }
            Ok(())
        }),
    )?;

    let sink = Arc::clone(&shown);
    runtime.functions_mut().register_action(
        display_ref,
        Arc::new(move |scope: &mut TaskScope<'_>| -> ProcessResult<()> {
            if scope.changed("count") {
                let n = scope.get_index("count");
                if let Ok(mut shown) = sink.lock() {
                    shown.push(n);
                }
            }
            Ok(())
        }),
    )?;

    Ok(Countdown {
        runtime,
        process,
        activity,
        countdown,
        display,
        shown,
        decrements,
    })
}

/// A process with a single task that starts once the process is running
/// and stops one tick after its own action has run.
pub struct SingleTask {
    pub runtime: Runtime,
    pub process: ProcessId,
    pub task: TaskId,
}

pub fn single_task_runtime(config: EngineConfig) -> ProcessResult<SingleTask> {
    let mut runtime = Runtime::new(config)?;
    let finish_ref = FunctionRef::new("single", "finish", "task");

    let graph = runtime.graph_mut();
    let process = graph.add_process("Single")?;
    let task = graph.add_task("DefaultTask")?;
    graph.add_process_task(process, task)?;

    let finished = graph.add_value("finished", false)?;
    let yes = graph.add_value("yes", true)?;
    let running = graph.add_value("running", RunState::Running.as_str())?;
    graph.attach_value(task, finished)?;

    let state_view = graph
        .process(process)
        .state_view()
        .ok_or_else(|| process_types::ProcessError::InvalidElement("single".into()))?;
    let start = graph.add_condition("single running", Condition::value(state_view, running))?;
    let stop = graph.add_condition("task finished", Condition::value(finished, yes))?;
    let done = graph.add_condition("task done", Condition::task(task))?;
    graph.set_start_condition(task, start)?;
    graph.set_stop_condition(task, stop)?;
    graph.set_done_condition(process, done);

    let finish = graph.add_function("finish", finish_ref.clone())?;
    graph.set_action(task, finish)?;
    runtime.functions_mut().register_action(
        finish_ref,
        Arc::new(|scope: &mut TaskScope<'_>| -> ProcessResult<()> { scope.set("finished", true) }),
    )?;

    Ok(SingleTask {
        runtime,
        process,
        task,
    })
}

/// States of a process and a task before the first tick and after each
/// tick, until the process is `Done` or `max_ticks` have run.
pub fn state_history(
    runtime: &mut Runtime,
    process: ProcessId,
    task: TaskId,
    max_ticks: u64,
) -> (Vec<RunState>, Vec<RunState>) {
    let snapshot = |rt: &Runtime| {
        (
            rt.state_of(process).unwrap_or_default(),
            rt.state_of(task).unwrap_or_default(),
        )
    };
    let (p, t) = snapshot(&*runtime);
    let (mut processes, mut tasks) = (vec![p], vec![t]);
    for _ in 0..max_ticks {
        if processes.last() == Some(&RunState::Done) {
            break;
        }
        runtime.tick();
        let (p, t) = snapshot(&*runtime);
        processes.push(p);
        tasks.push(t);
    }
    (processes, tasks)
}
