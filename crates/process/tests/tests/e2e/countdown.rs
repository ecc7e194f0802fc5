//! E2E: the countdown process.
//!
//! One activity drives `countdown`, which decrements a shared counter from
//! 10 to 0, and `display`, which records the counter whenever it changed.

use process_engine::{RunnableId, TickReport, TraceEvent};
use process_tests::{countdown_runtime, init_tracing, Countdown, COUNTDOWN_START};
use process_types::{EngineConfig, RunState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn admitted() -> Countdown {
    init_tracing();
    let mut fx = countdown_runtime(EngineConfig::default()).unwrap();
    fx.runtime.admit(fx.process).unwrap();
    fx
}

fn run_to_done(fx: &mut Countdown) -> Vec<TickReport> {
    let mut reports = Vec::new();
    while fx.runtime.state_of(fx.process) != Some(RunState::Done) {
        assert!(reports.len() < 100, "countdown never finished");
        reports.push(fx.runtime.tick());
    }
    reports
}

fn entered(reports: &[TickReport], runnable: RunnableId, to: RunState) -> Vec<u64> {
    reports
        .iter()
        .flat_map(|r| r.transitions_of(runnable))
        .filter(|t| t.to == to)
        .map(|t| t.epoch)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn countdown_completes_after_ten_decrements() {
    let mut fx = admitted();
    let reports = run_to_done(&mut fx);

    assert_eq!(reports.len(), 17);
    assert_eq!(fx.decrements(), COUNTDOWN_START as usize);

    let count = fx.runtime.graph().value_id("count").unwrap();
    let cell = fx.runtime.graph().value(count).cell().unwrap();
    assert_eq!(cell.get(), &serde_json::json!(0));
}

#[test]
fn display_fires_once_per_change() {
    let mut fx = admitted();
    run_to_done(&mut fx);
    assert_eq!(fx.shown(), (0..COUNTDOWN_START).rev().collect::<Vec<_>>());
}

#[test]
fn process_enters_done_exactly_once() {
    let mut fx = admitted();
    let mut reports = run_to_done(&mut fx);
    reports.extend(fx.runtime.run_ticks(5));

    assert_eq!(entered(&reports, fx.process.into(), RunState::Done), vec![17]);
    assert_eq!(
        entered(&reports, fx.process.into(), RunState::RunComplete),
        vec![16]
    );
    // Nothing runs once the process is done
    assert_eq!(fx.shown().len(), COUNTDOWN_START as usize);
    assert_eq!(fx.runtime.state_of(fx.activity), Some(RunState::Done));
}

#[test]
fn children_finish_before_their_activity() {
    let mut fx = admitted();
    let reports = run_to_done(&mut fx);

    assert_eq!(entered(&reports, fx.activity.into(), RunState::Running), vec![3]);
    assert_eq!(entered(&reports, fx.countdown.into(), RunState::Running), vec![3]);
    assert_eq!(entered(&reports, fx.countdown.into(), RunState::Done), vec![14]);
    assert_eq!(entered(&reports, fx.display.into(), RunState::Done), vec![14]);
    assert_eq!(entered(&reports, fx.activity.into(), RunState::Done), vec![15]);
}

#[test]
fn decrements_surface_one_tick_later() {
    let mut fx = admitted();
    let count = fx.runtime.graph().value_id("count").unwrap();

    // Ready, Starting, Running: no task has executed yet
    fx.runtime.run_ticks(3);
    // First decrement is staged, not visible
    let report = fx.runtime.tick();
    assert_eq!(report.committed, 0);
    let cell = fx.runtime.graph().value(count).cell().unwrap();
    assert_eq!(cell.get(), &serde_json::json!(10));
    assert_eq!(cell.pending(), Some(&serde_json::json!(9)));

    let report = fx.runtime.tick();
    assert_eq!(report.committed, 1);
    let cell = fx.runtime.graph().value(count).cell().unwrap();
    assert_eq!(cell.get(), &serde_json::json!(9));
}

#[test]
fn trace_shows_process_lifecycle() {
    init_tracing();
    let mut fx = countdown_runtime(EngineConfig::debug()).unwrap();
    fx.runtime.admit(fx.process).unwrap();
    fx.runtime.run_until_done(fx.process).unwrap();

    let fired: Vec<_> = fx
        .runtime
        .trace()
        .records()
        .filter(|r| matches!(r.event, TraceEvent::EventFired))
        .map(|r| r.element.clone())
        .collect();
    assert_eq!(fired, vec!["countdown_start", "countdown_stop"]);
    assert_eq!(
        fx.runtime.trace().states_of("countdown_activity"),
        vec![RunState::Running, RunState::Done]
    );
}
