//! Property tests: rule conditions over arbitrary child outcomes.

use process_engine::{Condition, ConditionId, Evaluator, FunctionRegistry, ProcessGraph};
use proptest::prelude::*;

/// A graph with one literal condition per outcome
fn literals(outcomes: &[bool]) -> (ProcessGraph, Vec<ConditionId>) {
    let mut graph = ProcessGraph::new();
    let yes = graph.add_value("yes", true).unwrap();
    let mut ids = Vec::new();
    for (i, outcome) in outcomes.iter().enumerate() {
        let v = graph.add_value(format!("v{i}"), *outcome).unwrap();
        ids.push(graph.add_condition(format!("c{i}"), Condition::value(v, yes)).unwrap());
    }
    (graph, ids)
}

proptest! {
    #[test]
    fn all_is_conjunction(outcomes in prop::collection::vec(any::<bool>(), 0..8)) {
        let (mut graph, ids) = literals(&outcomes);
        let all = graph.add_condition("all", Condition::all(ids)).unwrap();
        let functions = FunctionRegistry::new();
        let eval = Evaluator::new(&graph, &functions);
        prop_assert_eq!(eval.met(all), outcomes.iter().all(|o| *o));
    }

    #[test]
    fn any_is_disjunction_with_empty_neutral(outcomes in prop::collection::vec(any::<bool>(), 0..8)) {
        let (mut graph, ids) = literals(&outcomes);
        let any = graph.add_condition("any", Condition::any(ids)).unwrap();
        let functions = FunctionRegistry::new();
        let eval = Evaluator::new(&graph, &functions);
        let expected = outcomes.is_empty() || outcomes.iter().any(|o| *o);
        prop_assert_eq!(eval.met(any), expected);
    }

    #[test]
    fn sequenced_over_true_children_needs_one_call_each(len in 1usize..6) {
        let (mut graph, ids) = literals(&vec![true; len]);
        let seq = graph.add_condition("seq", Condition::sequenced(ids)).unwrap();
        let functions = FunctionRegistry::new();
        let eval = Evaluator::new(&graph, &functions);
        for _ in 1..len {
            prop_assert!(!eval.met(seq));
        }
        prop_assert!(eval.met(seq));
        // Saturated: stays met
        prop_assert!(eval.met(seq));
        prop_assert_eq!(graph.condition(seq).condition().cursor(), Some(len));
    }

    #[test]
    fn sequenced_restarts_on_a_false_child(len in 2usize..6, broken in 0usize..6) {
        let broken = broken % len;
        let mut outcomes = vec![true; len];
        outcomes[broken] = false;
        let (mut graph, ids) = literals(&outcomes);
        let seq = graph.add_condition("seq", Condition::sequenced(ids)).unwrap();
        let functions = FunctionRegistry::new();
        let eval = Evaluator::new(&graph, &functions);
        for _ in 0..(2 * len) {
            prop_assert!(!eval.met(seq));
        }
        prop_assert!(graph.condition(seq).condition().cursor().unwrap() < broken + 1);
    }
}
