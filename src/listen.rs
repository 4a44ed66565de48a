//! Registering one listener object on several events at once.
//!
//! A listener object participates in an event by implementing
//! [`Listens<T>`] for the event's listener type `T`: the implementation
//! extracts the listener value, and may declare a phase name which the
//! manager resolves through its phase-name parser.
//!
//! [`EventManager::listen_all`] then registers the object on a whole tuple
//! of events in one call. Every check is performed before the first
//! registration, so a rejected call leaves all events untouched.
//!
//! # Examples
//!
//! ```rust
//! use phasic::{Callback, EventManager, Listens};
//! use std::sync::Arc;
//!
//! struct AuditLog;
//!
//! impl Listens<Callback<str>> for AuditLog {
//!     // No phase declaration: the manager's default phase is used.
//!     fn listener(&self) -> Callback<str> {
//!         Arc::new(|text: &str| println!("saw {text}"))
//!     }
//! }
//!
//! impl Listens<Callback<str, bool>> for AuditLog {
//!     const PHASE: Option<&'static str> = Some("late");
//!
//!     fn listener(&self) -> Callback<str, bool> {
//!         Arc::new(|_: &str| false)
//!     }
//! }
//!
//! let events = EventManager::of("default");
//! let notify = events.create::<Callback<str>>();
//! let filter = events.create::<Callback<str, bool>>();
//!
//! events.listen_all(&AuditLog, (&notify, &filter)).unwrap();
//! ```

use crate::error::{EventError, EventResult};
use crate::event::{ListenableEvent, PhaseId};
use crate::handler::Listener;
use crate::manager::EventManager;

/// Declares that a listener object participates in events with listener
/// type `T`.
///
/// The optional [`PHASE`](Listens::PHASE) constant names the phase the
/// listener wants for such events; it is resolved through the manager's
/// phase-name parser. Without a declaration, registrations land in the
/// manager's default phase.
pub trait Listens<T: Listener> {
    /// The declared phase name for events with listener type `T`, if any.
    const PHASE: Option<&'static str> = None;

    /// The listener value to register.
    fn listener(&self) -> T;
}

/// A tuple of event references that one listener object can be registered
/// on in a single call.
///
/// Implemented for tuples of up to eight `&impl ListenableEvent` entries
/// whose listener types the object all [`Listens`] to. The empty tuple is
/// rejected at run time with [`EventError::NoEventsGiven`].
pub trait EventGroup<I: PhaseId, L: ?Sized> {
    /// Registers `listener` on every event of the group.
    fn register_all(&self, manager: &EventManager<I>, listener: &L) -> EventResult<()>;
}

impl<I: PhaseId, L: ?Sized> EventGroup<I, L> for () {
    fn register_all(&self, _manager: &EventManager<I>, _listener: &L) -> EventResult<()> {
        Err(EventError::NoEventsGiven)
    }
}

macro_rules! impl_event_group {
    ($(($event:ident, $listener_type:ident, $event_var:ident, $phase_var:ident)),+) => {
        impl<'group, I, L, $($listener_type,)+ $($event,)+> EventGroup<I, L> for ($(&'group $event,)+)
        where
            I: PhaseId,
            L: ?Sized $(+ Listens<$listener_type>)+,
            $($listener_type: Listener,)+
            $($event: ListenableEvent<I, $listener_type>,)+
        {
            fn register_all(&self, manager: &EventManager<I>, listener: &L) -> EventResult<()> {
                let ($($event_var,)+) = self;

                // Resolve every target phase before touching any event, so
                // that registration is all-or-nothing.
                $(
                    let $phase_var = match <L as Listens<$listener_type>>::PHASE {
                        Some(name) => manager.parse_phase_id(name),
                        None => manager.default_phase_id().clone(),
                    };
                )+

                $(
                    $event_var.register_in($phase_var, <L as Listens<$listener_type>>::listener(listener));
                )+

                Ok(())
            }
        }
    };
}

impl_event_group!((E1, T1, event1, phase1));
impl_event_group!((E1, T1, event1, phase1), (E2, T2, event2, phase2));
impl_event_group!(
    (E1, T1, event1, phase1),
    (E2, T2, event2, phase2),
    (E3, T3, event3, phase3)
);
impl_event_group!(
    (E1, T1, event1, phase1),
    (E2, T2, event2, phase2),
    (E3, T3, event3, phase3),
    (E4, T4, event4, phase4)
);
impl_event_group!(
    (E1, T1, event1, phase1),
    (E2, T2, event2, phase2),
    (E3, T3, event3, phase3),
    (E4, T4, event4, phase4),
    (E5, T5, event5, phase5)
);
impl_event_group!(
    (E1, T1, event1, phase1),
    (E2, T2, event2, phase2),
    (E3, T3, event3, phase3),
    (E4, T4, event4, phase4),
    (E5, T5, event5, phase5),
    (E6, T6, event6, phase6)
);
impl_event_group!(
    (E1, T1, event1, phase1),
    (E2, T2, event2, phase2),
    (E3, T3, event3, phase3),
    (E4, T4, event4, phase4),
    (E5, T5, event5, phase5),
    (E6, T6, event6, phase6),
    (E7, T7, event7, phase7)
);
impl_event_group!(
    (E1, T1, event1, phase1),
    (E2, T2, event2, phase2),
    (E3, T3, event3, phase3),
    (E4, T4, event4, phase4),
    (E5, T5, event5, phase5),
    (E6, T6, event6, phase6),
    (E7, T7, event7, phase7),
    (E8, T8, event8, phase8)
);

impl<I: PhaseId> EventManager<I> {
    /// Registers `listener` on every event of the given tuple, in each
    /// event's declared or default phase.
    ///
    /// # Errors
    ///
    /// Fails with [`EventError::NoEventsGiven`] for the empty tuple; no
    /// event is modified on failure.
    pub fn listen_all<L: ?Sized, G: EventGroup<I, L>>(
        &self,
        listener: &L,
        events: G,
    ) -> EventResult<()> {
        events.register_all(self, listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Callback;
    use crate::testing::ExecutionTester;
    use std::sync::Arc;

    struct Recorder {
        tester: Arc<ExecutionTester>,
        call_order: usize,
        filter_order: usize,
    }

    impl Listens<Callback<str>> for Recorder {
        fn listener(&self) -> Callback<str> {
            let tester = self.tester.clone();
            let order = self.call_order;
            Arc::new(move |_: &str| tester.assert_order(order))
        }
    }

    impl Listens<Callback<str, bool>> for Recorder {
        fn listener(&self) -> Callback<str, bool> {
            let tester = self.tester.clone();
            let order = self.filter_order;
            Arc::new(move |_: &str| {
                tester.assert_order(order);
                false
            })
        }
    }

    #[test]
    fn the_empty_event_group_is_rejected() {
        let events = EventManager::of("default");
        let recorder = Recorder {
            tester: Arc::new(ExecutionTester::new()),
            call_order: 0,
            filter_order: 0,
        };

        assert_eq!(
            events.listen_all(&recorder, ()),
            Err(EventError::NoEventsGiven)
        );
    }

    #[test]
    fn one_object_listens_to_several_events() {
        let events = EventManager::of("default");
        let notify = events.create::<Callback<str>>();
        let filter = events.create::<Callback<str, bool>>();
        let tester = Arc::new(ExecutionTester::new());

        let recorder = Recorder {
            tester: tester.clone(),
            call_order: 0,
            filter_order: 1,
        };
        events.listen_all(&recorder, (&notify, &filter)).unwrap();

        (notify.invoker())("notification");
        tester.assert_called(1);

        assert!(!(filter.invoker())("query"));
        tester.assert_called(2);
    }

    struct EarlyRiser(Arc<ExecutionTester>);

    impl Listens<Callback<str>> for EarlyRiser {
        const PHASE: Option<&'static str> = Some("early");

        fn listener(&self) -> Callback<str> {
            let tester = self.0.clone();
            Arc::new(move |_: &str| tester.assert_order(0))
        }
    }

    struct Sleeper(Arc<ExecutionTester>);

    impl Listens<Callback<str>> for Sleeper {
        const PHASE: Option<&'static str> = Some("late");

        fn listener(&self) -> Callback<str> {
            let tester = self.0.clone();
            Arc::new(move |_: &str| tester.assert_order(2))
        }
    }

    struct Regular(Arc<ExecutionTester>);

    impl Listens<Callback<str>> for Regular {
        fn listener(&self) -> Callback<str> {
            let tester = self.0.clone();
            Arc::new(move |_: &str| tester.assert_order(1))
        }
    }

    #[test]
    fn declared_phases_are_resolved_through_the_manager() {
        let events = EventManager::of("default");
        let event = events
            .create_with_phases::<Callback<str>>(&[
                "early".to_owned(),
                "default".to_owned(),
                "late".to_owned(),
            ])
            .unwrap();
        let tester = Arc::new(ExecutionTester::new());

        // Registration order does not matter; the declared phases do.
        events.listen_all(&Sleeper(tester.clone()), (&event,)).unwrap();
        events.listen_all(&Regular(tester.clone()), (&event,)).unwrap();
        events.listen_all(&EarlyRiser(tester.clone()), (&event,)).unwrap();

        (event.invoker())("phased");
        tester.assert_called(3);
    }

    #[test]
    fn contextualized_events_can_join_a_group() {
        let events = EventManager::of("default");
        let filtered = events.create_filtered::<Callback<str>, String>();
        let contextualized = filtered.for_context("ctx".to_owned());
        let tester = Arc::new(ExecutionTester::new());
        tester.use_strict_order(false);

        events
            .listen_all(&Regular(tester.clone()), (&*contextualized,))
            .unwrap();

        (contextualized.invoker())("direct");
        tester.assert_called(1);

        // The registration stayed local to the contextualized event.
        (filtered.invoker())("parent untouched");
        tester.assert_called(1);
    }
}
