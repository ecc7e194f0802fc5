//! Property tests: element ids are always the normalized form of the name.

use process_engine::{NodeRef, ProcessGraph};
use process_types::{normalize, Element, ElementKind};
use proptest::prelude::*;

fn arb_name() -> impl Strategy<Value = String> {
    "[ \t]{0,2}[A-Za-z][A-Za-z0-9 ]{0,15}[ \t]{0,2}"
}

proptest! {
    #[test]
    fn normalize_is_idempotent(name in "[A-Za-z0-9 \t_]{0,24}") {
        let once = normalize(&name);
        prop_assert_eq!(normalize(&once), once.clone());
        prop_assert!(!once.chars().any(char::is_whitespace));
    }

    #[test]
    fn normalize_ignores_surrounding_whitespace(
        lead in "[ \t\n]{0,3}",
        core in "[A-Za-z0-9 _]{0,16}",
        trail in "[ \t\n]{0,3}"
    ) {
        let padded = format!("{lead}{core}{trail}");
        prop_assert_eq!(normalize(&padded), normalize(padded.trim()));
        prop_assert_eq!(normalize(&padded), normalize(&core));
    }

    #[test]
    fn id_tracks_every_rename(first in arb_name(), second in arb_name()) {
        let mut element = Element::new(ElementKind::Task, &first);
        prop_assert_eq!(element.id(), normalize(&first));
        prop_assert!(element.set_name(&second));
        prop_assert_eq!(element.id(), normalize(&second));
        prop_assert_eq!(element.name(), second.trim());
    }

    #[test]
    fn locked_names_are_frozen(first in arb_name(), second in arb_name()) {
        let mut graph = ProcessGraph::new();
        let task = graph.add_task(&first).unwrap();
        graph.seal();
        let renamed = graph.rename(NodeRef::Task(task), &second).unwrap();
        prop_assert!(!renamed);
        prop_assert_eq!(graph.task(task).element().id(), normalize(&first));
    }

    #[test]
    fn blank_names_get_a_fallback(blank in "[ \t]{0,4}") {
        let element = Element::new(ElementKind::Value, &blank);
        prop_assert!(element.name().starts_with("value"));
        prop_assert_eq!(element.id(), normalize(element.name()));
    }
}

#[test]
fn empty_and_blank_names_normalize_alike() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("   "), "");
    assert_eq!(normalize("\t \n"), normalize(""));
}
