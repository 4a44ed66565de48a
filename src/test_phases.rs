//! Ordering scenarios across many phases and registration orders.

use crate::handler::{callback, selector, Callback};
use crate::manager::EventManager;
use crate::testing::{for_all_permutations, ExecutionTester};
use std::sync::Arc;

fn phase_chain() -> [String; 5] {
    [
        "very_early".to_owned(),
        "early".to_owned(),
        "default".to_owned(),
        "late".to_owned(),
        "very_late".to_owned(),
    ]
}

/// Eight listeners spread over five chained phases must run in the phase
/// order, whatever the registration order of the phases.
#[test]
fn phase_chain_orders_listeners_for_every_registration_order() {
    let events = EventManager::of("default");
    let tester = Arc::new(ExecutionTester::new());

    let entries: Vec<(&str, Vec<usize>)> = vec![
        ("very_early", vec![0]),
        ("early", vec![1]),
        ("default", vec![2, 3]),
        ("late", vec![4]),
        ("very_late", vec![5, 6, 7]),
    ];

    for_all_permutations(&entries, |ordering| {
        let event = events
            .create_with_phases::<Callback<str>>(&phase_chain())
            .unwrap();

        tester.reset();
        for (phase, positions) in ordering {
            for &position in positions {
                let tester = tester.clone();
                event.register_in(
                    (*phase).to_owned(),
                    callback(move |_: &str| tester.assert_order(position)),
                );
            }
        }

        (event.invoker())("Hello World!");
        tester.assert_called(8);
    });
}

#[derive(Clone)]
struct GuardedEntry {
    phase: &'static str,
    listeners: Vec<(usize, Option<&'static str>)>,
}

/// Filtered events must keep the canonical phase order for global and
/// guarded listeners alike, for every registration order.
#[test]
fn filtered_phase_chain_orders_listeners_for_every_registration_order() {
    let events = EventManager::of("default");
    let tester = Arc::new(ExecutionTester::new());
    tester.use_strict_order(false);

    let entries = vec![
        GuardedEntry {
            phase: "very_early",
            listeners: vec![(0, None)],
        },
        GuardedEntry {
            phase: "early",
            listeners: vec![(1, None)],
        },
        GuardedEntry {
            phase: "default",
            listeners: vec![(2, Some("contextualized")), (3, None)],
        },
        GuardedEntry {
            phase: "late",
            listeners: vec![(4, Some("contextualized"))],
        },
        GuardedEntry {
            phase: "very_late",
            listeners: vec![(5, None), (6, Some("some other context")), (7, None)],
        },
    ];

    for_all_permutations(&entries, |ordering| {
        let event = events
            .create_filtered_with_phases::<Callback<str>, String>(&phase_chain())
            .unwrap();

        tester.reset();
        for entry in ordering {
            for &(position, context) in &entry.listeners {
                let counted = tester.clone();
                match context {
                    None => event.register_in(
                        entry.phase.to_owned(),
                        callback(move |_: &str| counted.assert_order(position)),
                    ),
                    Some(context) => {
                        event.register_when_in(
                            entry.phase.to_owned(),
                            callback(move |_: &str| counted.assert_order(position)),
                            selector(move |candidate: &String| candidate == context),
                        );
                        // A twin behind the opposite selector must stay
                        // silent in that context.
                        let silent = tester.clone();
                        event.register_when_in(
                            entry.phase.to_owned(),
                            callback(move |_: &str| silent.skip()),
                            selector(move |candidate: &String| candidate != context),
                        );
                    }
                }
            }
        }

        // The event's own invoker runs the global listeners only.
        (event.invoker())("Hello world!");
        tester.assert_called(5);

        tester.reset();
        let contextualized = event.for_context("contextualized".to_owned());
        (contextualized.invoker())("Hello world!");
        tester.assert_called(7);

        tester.reset();
        let other = event.for_context("some other context".to_owned());
        (other.invoker())("Hello world!");
        tester.assert_called(6);
    });
}
