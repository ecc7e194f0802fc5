//! E2E: failing actions and missing behaviors.
//!
//! A failed action is reported, never fatal: the task keeps advancing on
//! its own conditions and the process still completes.

use process_engine::{Condition, ProcessId, Runtime, TaskFault, TaskId, TaskScope};
use process_tests::init_tracing;
use process_types::{EngineConfig, FunctionRef, ProcessError, ProcessResult, RunState};
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A task that bumps `attempts` on every run, then fails. It stops once
/// three attempts are visible.
fn flaky(register: bool) -> (Runtime, ProcessId, TaskId) {
    init_tracing();
    let mut runtime = Runtime::new(EngineConfig::default()).unwrap();
    let reference = FunctionRef::new("faults", "flaky", "task");

    let g = runtime.graph_mut();
    let p = g.add_process("Faulty").unwrap();
    let t = g.add_task("flaky").unwrap();
    g.add_process_task(p, t).unwrap();
    let attempts = g.add_value("attempts", 0).unwrap();
    let three = g.add_value("three", 3).unwrap();
    let running = g.add_value("running", RunState::Running.as_str()).unwrap();
    g.attach_value(t, attempts).unwrap();

    let state = g.process(p).state_view().unwrap();
    let start = g.add_condition("faulty running", Condition::value(state, running)).unwrap();
    let stop = g.add_condition("three attempts", Condition::value(attempts, three)).unwrap();
    let done = g.add_condition("flaky done", Condition::task(t)).unwrap();
    g.set_start_condition(t, start).unwrap();
    g.set_stop_condition(t, stop).unwrap();
    g.set_done_condition(p, done);
    let f = g.add_function("flaky", reference.clone()).unwrap();
    g.set_action(t, f).unwrap();

    if register {
        runtime
            .functions_mut()
            .register_action(
                reference,
                Arc::new(|scope: &mut TaskScope<'_>| -> ProcessResult<()> {
                    let n = scope.get_index("attempts");
                    scope.set("attempts", n + 1)?;
                    Err(ProcessError::action(format!("attempt {n} failed")))
                }),
            )
            .unwrap();
    }
    (runtime, p, t)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn failing_action_is_reported_each_run() {
    let (mut runtime, p, t) = flaky(true);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    runtime
        .set_error_handler(
            "main",
            Box::new(move |fault: &TaskFault| {
                if let Ok(mut faults) = sink.lock() {
                    faults.push((fault.epoch, fault.message.clone()));
                }
            }),
        )
        .unwrap();
    runtime.admit(p).unwrap();

    assert_eq!(runtime.run_until_done(p).unwrap(), 9);
    assert_eq!(runtime.state_of(t), Some(RunState::Done));
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        [
            (4, "attempt 0 failed".to_string()),
            (5, "attempt 1 failed".to_string()),
            (6, "attempt 2 failed".to_string()),
            (7, "attempt 3 failed".to_string()),
        ]
    );
}

#[test]
fn faults_land_in_the_tick_report() {
    let (mut runtime, p, _) = flaky(true);
    runtime.admit(p).unwrap();
    let reports = runtime.run_ticks(4);
    let faults: Vec<_> = reports.iter().flat_map(|r| r.faults.iter()).collect();
    assert_eq!(faults.len(), 1);
    assert_eq!(faults[0].task, "flaky");
}

#[test]
fn unregistered_action_is_skipped() {
    let (mut runtime, p, t) = flaky(false);
    assert_eq!(runtime.functions().unresolved(runtime.graph()).len(), 1);
    runtime.admit(p).unwrap();

    let reports = runtime.run_ticks(10);
    assert!(reports.iter().all(|r| r.faults.is_empty()));
    // Nothing ever writes `attempts`, so the task never stops
    assert_eq!(runtime.state_of(t), Some(RunState::Running));
    assert_eq!(runtime.state_of(p), Some(RunState::Running));
}

#[test]
fn writing_an_unknown_value_is_a_fault() {
    init_tracing();
    let mut runtime = Runtime::new(EngineConfig::default()).unwrap();
    let reference = FunctionRef::new("faults", "stray", "task");
    let g = runtime.graph_mut();
    let p = g.add_process("Stray").unwrap();
    let t = g.add_task("stray").unwrap();
    g.add_process_task(p, t).unwrap();
    let state = g.process(p).state_view().unwrap();
    let running = g.add_value("running", RunState::Running.as_str()).unwrap();
    let start = g.add_condition("stray running", Condition::value(state, running)).unwrap();
    g.set_start_condition(t, start).unwrap();
    let f = g.add_function("stray", reference.clone()).unwrap();
    g.set_action(t, f).unwrap();
    runtime
        .functions_mut()
        .register_action(
            reference,
            Arc::new(|scope: &mut TaskScope<'_>| -> ProcessResult<()> {
                scope.set("nowhere", 1)
            }),
        )
        .unwrap();
    runtime.admit(p).unwrap();

    let reports = runtime.run_ticks(4);
    let fault = &reports[3].faults[0];
    assert_eq!(fault.message, "Unknown value: nowhere");
}

#[test]
fn last_write_of_a_stopping_task_is_committed() {
    init_tracing();
    let mut runtime = Runtime::new(EngineConfig::default()).unwrap();
    let reference = FunctionRef::new("faults", "once", "task");
    let g = runtime.graph_mut();
    let p = g.add_process("Once").unwrap();
    let t = g.add_task("once").unwrap();
    g.add_process_task(p, t).unwrap();
    let out = g.add_value("out", 0).unwrap();
    let one = g.add_value("one", 1).unwrap();
    let running = g.add_value("running", RunState::Running.as_str()).unwrap();
    g.attach_value(t, out).unwrap();

    let state = g.process(p).state_view().unwrap();
    let start = g.add_condition("once running", Condition::value(state, running)).unwrap();
    let always = g.add_condition("always", Condition::all(vec![])).unwrap();
    let written = g.add_condition("out written", Condition::value(out, one)).unwrap();
    g.set_start_condition(t, start).unwrap();
    g.set_stop_condition(t, always).unwrap();
    g.set_done_condition(p, written);
    let f = g.add_function("once", reference.clone()).unwrap();
    g.set_action(t, f).unwrap();
    runtime
        .functions_mut()
        .register_action(
            reference,
            Arc::new(|scope: &mut TaskScope<'_>| -> ProcessResult<()> { scope.set("out", 1) }),
        )
        .unwrap();
    runtime.admit(p).unwrap();

    // The task runs and stops at t4; its write lands in the t5 commit
    assert_eq!(runtime.run_until_done(p).unwrap(), 6);
    assert_eq!(runtime.state_of(t), Some(RunState::Done));
    assert_eq!(runtime.graph().task(t).runs(), 1);
    let cell = runtime.graph().value(out).cell().unwrap();
    assert_eq!(cell.get(), &serde_json::json!(1));
    assert!(cell.pending().is_none());
}

#[test]
fn stalled_process_reports_its_budget() {
    let (runtime, p, _) = flaky(false);
    let mut runtime = Runtime::with_parts(
        EngineConfig {
            max_ticks: 12,
            ..EngineConfig::default()
        },
        runtime.graph().clone(),
        runtime.functions().clone(),
    )
    .unwrap();
    runtime.admit(p).unwrap();
    match runtime.run_until_done(p) {
        Err(ProcessError::Stalled { process, ticks }) => {
            assert_eq!(process, "faulty");
            assert_eq!(ticks, 12);
        }
        other => panic!("expected a stall, got {other:?}"),
    }
}
