//! Concurrent mutation and dispatch.

use crate::handler::{callback, selector, Callback};
use crate::manager::EventManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_registration_and_dispatch() {
    let events = EventManager::of("default");
    let event = Arc::new(events.create::<Callback<str>>());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut workers = Vec::new();
    for _ in 0..4 {
        let event = event.clone();
        let calls = calls.clone();
        workers.push(thread::spawn(move || {
            for _ in 0..50 {
                let calls = calls.clone();
                event.register(callback(move |_: &str| {
                    calls.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }));
    }
    for _ in 0..2 {
        let event = event.clone();
        workers.push(thread::spawn(move || {
            // Dispatches interleave with registrations; each one sees some
            // consistent snapshot.
            for _ in 0..50 {
                (event.invoker())("interleaved");
            }
        }));
    }
    for worker in workers {
        worker.join().unwrap();
    }

    calls.store(0, Ordering::SeqCst);
    (event.invoker())("settled");
    assert_eq!(calls.load(Ordering::SeqCst), 200);
}

#[test]
fn concurrent_phase_ordering_keeps_the_schedule_consistent() {
    let events = EventManager::of("default");
    let event = Arc::new(events.create::<Callback<str>>());
    let early_calls = Arc::new(AtomicUsize::new(0));
    let late_calls = Arc::new(AtomicUsize::new(0));

    let register = {
        let event = event.clone();
        let early_calls = early_calls.clone();
        let late_calls = late_calls.clone();
        thread::spawn(move || {
            for index in 0..30 {
                let early_calls = early_calls.clone();
                let late_calls = late_calls.clone();
                if index % 2 == 0 {
                    event.register_in(
                        "early".to_owned(),
                        callback(move |_: &str| {
                            early_calls.fetch_add(1, Ordering::SeqCst);
                        }),
                    );
                } else {
                    event.register_in(
                        "late".to_owned(),
                        callback(move |_: &str| {
                            late_calls.fetch_add(1, Ordering::SeqCst);
                        }),
                    );
                }
            }
        })
    };
    let order = {
        let event = event.clone();
        thread::spawn(move || {
            event
                .add_phase_ordering("early".to_owned(), "default".to_owned())
                .unwrap();
            event
                .add_phase_ordering("default".to_owned(), "late".to_owned())
                .unwrap();
            // A redundant transitive edge must not disturb the schedule.
            event
                .add_phase_ordering("early".to_owned(), "late".to_owned())
                .unwrap();
        })
    };

    register.join().unwrap();
    order.join().unwrap();

    (event.invoker())("settled");
    assert_eq!(early_calls.load(Ordering::SeqCst), 15);
    assert_eq!(late_calls.load(Ordering::SeqCst), 15);
}

#[test]
fn concurrent_contextualization_observes_parent_registrations() {
    let events = EventManager::of("default");
    let event = Arc::new(events.create_filtered::<Callback<str>, String>());
    let matched = Arc::new(AtomicUsize::new(0));

    let register = {
        let event = event.clone();
        let matched = matched.clone();
        thread::spawn(move || {
            for _ in 0..25 {
                let matched = matched.clone();
                event.register_when(
                    callback(move |_: &str| {
                        matched.fetch_add(1, Ordering::SeqCst);
                    }),
                    selector(|context: &String| context == "watched"),
                );
            }
        })
    };
    let observe = {
        let event = event.clone();
        thread::spawn(move || {
            for _ in 0..25 {
                let contextualized = event.for_context("watched".to_owned());
                (contextualized.invoker())("sampling");
            }
        })
    };

    register.join().unwrap();
    observe.join().unwrap();

    matched.store(0, Ordering::SeqCst);
    let contextualized = event.for_context("watched".to_owned());
    (contextualized.invoker())("settled");
    assert_eq!(matched.load(Ordering::SeqCst), 25);

    let unmatched = event.for_context("ignored".to_owned());
    matched.store(0, Ordering::SeqCst);
    (unmatched.invoker())("settled");
    assert_eq!(matched.load(Ordering::SeqCst), 0);
}
