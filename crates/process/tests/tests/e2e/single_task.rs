//! E2E: a process with one task gated on the process running.
//!
//! The task's action writes `finished`; the write is only seen by the stop
//! condition on the following tick.

use process_tests::{init_tracing, single_task_runtime, state_history, SingleTask};
use process_types::{EngineConfig, RunState};
use serde_json::json;

use RunState::*;

fn admitted() -> SingleTask {
    init_tracing();
    let mut fx = single_task_runtime(EngineConfig::default()).unwrap();
    fx.runtime.admit(fx.process).unwrap();
    fx
}

#[test]
fn process_and_task_advance_in_lockstep() {
    let mut fx = admitted();
    let (processes, tasks) = state_history(&mut fx.runtime, fx.process, fx.task, 20);

    assert_eq!(
        processes,
        vec![Ready, Starting, Running, Running, Running, Running, RunComplete, Done]
    );
    assert_eq!(
        tasks,
        vec![Ready, Ready, Ready, Running, Running, Done, Done, Done]
    );
}

#[test]
fn write_is_visible_one_tick_after_execution() {
    let mut fx = admitted();
    let finished = fx.runtime.graph().value_id("finished").unwrap();

    fx.runtime.run_ticks(3);
    assert_eq!(fx.runtime.state_of(fx.task), Some(Running));

    // t4: the action runs and stages the write
    let report = fx.runtime.tick();
    assert_eq!(report.executed, 1);
    let cell = fx.runtime.graph().value(finished).cell().unwrap();
    assert_eq!(cell.get(), &json!(false));
    assert!(cell.is_modified());
    assert_eq!(fx.runtime.state_of(fx.task), Some(Running));

    // t5: committed before execution, so the stop condition sees it
    let report = fx.runtime.tick();
    assert_eq!(report.committed, 1);
    let cell = fx.runtime.graph().value(finished).cell().unwrap();
    assert_eq!(cell.get(), &json!(true));
    assert_eq!(fx.runtime.state_of(fx.task), Some(Done));
    // The process sees the stopped task one pass later
    assert_eq!(fx.runtime.state_of(fx.process), Some(Running));
    fx.runtime.tick();
    assert_eq!(fx.runtime.state_of(fx.process), Some(RunComplete));
}

#[test]
fn run_until_done_counts_ticks() {
    let mut fx = admitted();
    assert_eq!(fx.runtime.run_until_done(fx.process).unwrap(), 7);
    assert_eq!(fx.runtime.graph().task(fx.task).runs(), 2);
}

#[test]
fn one_shot_task_does_not_restart() {
    let mut fx = admitted();
    fx.runtime.run_until_done(fx.process).unwrap();
    fx.runtime.run_ticks(3);
    assert_eq!(fx.runtime.state_of(fx.task), Some(Done));
    assert_eq!(fx.runtime.graph().task(fx.task).runs(), 2);
}

#[test]
fn admission_locks_names() {
    let mut fx = admitted();
    let node = process_engine::NodeRef::Task(fx.task);
    assert!(!fx.runtime.graph_mut().rename(node, "Renamed").unwrap());
    assert_eq!(fx.runtime.graph().task(fx.task).element().id(), "defaulttask");
}
