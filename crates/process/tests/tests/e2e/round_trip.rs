//! E2E: export a process to the interchange form, import it back and run it.

use process_engine::interchange::ElementRecord;
use process_engine::{export_graph, export_process, import, ProcessDocument, Runtime};
use process_tests::{countdown_runtime, init_tracing, single_task_runtime};
use process_types::{EngineConfig, RunState};
use std::collections::BTreeSet;

#[test]
fn countdown_survives_json_round_trip() {
    init_tracing();
    let fx = countdown_runtime(EngineConfig::default()).unwrap();
    let doc = export_process(fx.runtime.graph(), fx.process);

    let json = doc.to_json().unwrap();
    let parsed = ProcessDocument::from_json(&json).unwrap();
    let (graph, report) = import(&parsed).unwrap();
    assert!(report.is_clean(), "{:?}", report.unresolved);

    let process = graph.process_id("countdown").unwrap();
    let again = export_process(&graph, process);
    assert_eq!(again, doc);

    let original: BTreeSet<_> = doc.ids().into_iter().collect();
    let restored: BTreeSet<_> = again.ids().into_iter().collect();
    assert_eq!(original, restored);
}

#[test]
fn imported_graph_runs_like_the_original() {
    init_tracing();
    let fx = countdown_runtime(EngineConfig::default()).unwrap();
    let doc = export_process(fx.runtime.graph(), fx.process);
    let (graph, _) = import(&doc).unwrap();

    // The registry is keyed by function reference, so the original
    // behaviors bind to the imported graph unchanged.
    let mut runtime = Runtime::with_parts(
        EngineConfig::default(),
        graph,
        fx.runtime.functions().clone(),
    )
    .unwrap();
    let process = runtime.graph().process_id("countdown").unwrap();
    runtime.admit(process).unwrap();

    assert_eq!(runtime.run_until_done(process).unwrap(), 17);
    assert_eq!(fx.shown(), (0..10).rev().collect::<Vec<_>>());
    assert_eq!(fx.decrements(), 10);
}

#[test]
fn function_references_are_preserved() {
    let fx = single_task_runtime(EngineConfig::default()).unwrap();
    let doc = export_graph(fx.runtime.graph());
    let (graph, _) = import(&doc).unwrap();

    let original = fx.runtime.graph().function_id("finish").unwrap();
    let imported = graph.function_id("finish").unwrap();
    assert_eq!(
        fx.runtime.graph().function(original).reference(),
        graph.function(imported).reference()
    );

    let task = graph.task_id("defaulttask").unwrap();
    assert_eq!(graph.task(task).action(), Some(imported));
    assert_eq!(graph.state_of(task.into()), Some(RunState::Ready));
}

#[test]
fn tampered_reference_is_reported_not_fatal() {
    let fx = single_task_runtime(EngineConfig::default()).unwrap();
    let mut doc = export_process(fx.runtime.graph(), fx.process);
    for element in &mut doc.elements {
        if let ElementRecord::Task(task) = element {
            task.stop_condition = Some("task_vanished".into());
        }
    }

    let (graph, report) = import(&doc).unwrap();
    assert_eq!(
        report.unresolved,
        vec!["defaulttask.stop_condition -> task_vanished".to_string()]
    );

    // The task can start but never stop, so the process stalls
    let mut runtime = Runtime::with_parts(
        EngineConfig {
            max_ticks: 20,
            ..EngineConfig::default()
        },
        graph,
        fx.runtime.functions().clone(),
    )
    .unwrap();
    let process = runtime.graph().process_id("single").unwrap();
    let task = runtime.graph().task_id("defaulttask").unwrap();
    runtime.admit(process).unwrap();
    assert!(runtime.run_until_done(process).is_err());
    assert_eq!(runtime.state_of(task), Some(RunState::Running));
}
