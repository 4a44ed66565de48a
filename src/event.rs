//! The core event type: phased listener storage with a single dispatch
//! façade.
//!
//! An [`Event`] stores listeners of a user-chosen type `T` grouped into
//! named, ordered *phases*, and exposes one [invoker](Event::invoker): a
//! value of `T` that dispatches to every registered listener in the
//! canonical phase order. Registration and phase ordering take the event's
//! internal lock; reading the invoker never does.

use crate::error::{EventError, EventResult};
use crate::handler::Listener;
use crate::invoker::{DefaultInvoker, InvokerFactory};
use crate::toposort::{self, NodeLinks, SortableNode};
use arc_swap::ArcSwap;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

/// Marker for phase identifier types.
///
/// Phase identifiers distinguish phases by equality and break ordering ties
/// by their total order. Strings are the usual choice.
pub trait PhaseId: Clone + Ord + Eq + Hash + Debug + Send + Sync + 'static {}

impl<I: Clone + Ord + Eq + Hash + Debug + Send + Sync + 'static> PhaseId for I {}

/// An event-like object that can be executed through an invoker of the
/// listener type.
pub trait InvokableEvent<T> {
    /// Returns the current invoker.
    ///
    /// The result must not be cached across registrations: any mutation of
    /// the event replaces the invoker. Always re-acquire it when you intend
    /// to dispatch.
    fn invoker(&self) -> T;
}

/// An event-like object that accepts listener registrations into phases.
pub trait ListenableEvent<I: PhaseId, T: Listener> {
    /// The phase listeners land in when no phase is specified.
    fn default_phase_id(&self) -> &I;

    /// Registers a listener in the default phase.
    fn register(&self, listener: T);

    /// Registers a listener in a specific phase, creating the phase if
    /// needed.
    fn register_in(&self, phase: I, listener: T);

    /// Declares that the listeners of `first` run before the listeners of
    /// `second`, creating either phase if needed.
    ///
    /// # Errors
    ///
    /// Fails with [`EventError::SelfOrderedPhase`] if both identifiers are
    /// equal. Contradictory constraints between distinct phases are *not*
    /// errors: cycles degrade to a grouped, deterministic order and a
    /// warning.
    fn add_phase_ordering(&self, first: I, second: I) -> EventResult<()>;
}

/// One phase of an event: an identifier, the listeners registered in it (in
/// insertion order) and the ordering edges to other phases.
pub(crate) struct PhaseData<I, T> {
    pub(crate) id: I,
    pub(crate) listeners: Vec<T>,
    pub(crate) links: NodeLinks<I>,
}

impl<I: PhaseId, T> PhaseData<I, T> {
    pub(crate) fn new(id: I) -> Self {
        Self {
            id,
            listeners: Vec::new(),
            links: NodeLinks::new(),
        }
    }
}

impl<'a, I: PhaseId, T> SortableNode for &'a PhaseData<I, T> {
    type Id = I;

    fn id(&self) -> &I {
        &self.id
    }

    fn following(&self) -> &BTreeSet<I> {
        self.links.following()
    }

    fn preceding(&self) -> &BTreeSet<I> {
        self.links.preceding()
    }
}

/// Computes the canonical phase order of a phase map.
pub(crate) fn sort_phase_ids<I, N>(phases: &HashMap<I, N>) -> Vec<I>
where
    I: PhaseId,
    for<'a> &'a N: SortableNode<Id = I>,
{
    let mut nodes: Vec<&N> = phases.values().collect();
    toposort::sort(&mut nodes, "event phases");
    nodes.into_iter().map(|node| node.id().clone()).collect()
}

/// Flattens per-phase listener vectors into one consolidated vector
/// following `sorted`.
pub(crate) fn concat_listeners<I, N, T>(
    sorted: &[I],
    phases: &HashMap<I, N>,
    listeners_of: impl Fn(&N) -> &[T],
) -> Vec<T>
where
    I: PhaseId,
    T: Clone,
{
    if let [only] = sorted {
        // Single phase: its listener vector already is the dispatch order.
        return listeners_of(&phases[only]).to_vec();
    }

    sorted
        .iter()
        .flat_map(|id| listeners_of(&phases[id]).iter().cloned())
        .collect()
}

struct EventState<I, T> {
    phases: HashMap<I, PhaseData<I, T>>,
    sorted: Vec<I>,
    listeners: Vec<T>,
}

/// An object which stores event listeners and dispatches to them through a
/// synthesized invoker.
///
/// Every listener belongs to a phase ([`Event::default_phase_id`] when
/// unspecified); phases are ordered among themselves by explicit
/// [`Event::add_phase_ordering`] constraints, resolved into a canonical
/// deterministic order. Within a phase, listeners run in registration
/// order.
///
/// Events are usually created through an [`EventManager`](crate::EventManager),
/// which picks the invoker strategy from the listener type and announces
/// the new event on its creation event.
///
/// # Examples
///
/// ```rust
/// use phasic::{Callback, EventManager};
/// use std::sync::Arc;
///
/// let events = EventManager::of("default");
/// let event = events.create::<Callback<str>>();
///
/// event.register(Arc::new(|text: &str| {
///     println!("first: {text}");
/// }));
/// event.register(Arc::new(|text: &str| {
///     println!("second: {text}");
/// }));
///
/// (event.invoker())("hello");
/// ```
///
/// # Concurrency
///
/// Registration and ordering changes lock the event; dispatching through
/// [`Event::invoker`] is lock-free and observes the latest published
/// listener snapshot.
pub struct Event<I: PhaseId, T: Listener> {
    default_phase_id: I,
    factory: Arc<dyn InvokerFactory<T>>,
    state: Mutex<EventState<I, T>>,
    invoker: ArcSwap<T>,
}

impl<I: PhaseId, T: Listener> Event<I, T> {
    /// Creates an event with an explicit invoker factory.
    ///
    /// The initial invoker is built from an empty listener array.
    pub fn new(default_phase_id: I, factory: impl InvokerFactory<T>) -> Self {
        Self::from_factory(default_phase_id, Arc::new(factory))
    }

    /// Creates an event whose invoker strategy is inferred from the
    /// listener type.
    pub fn with_default_invoker(default_phase_id: I) -> Self
    where
        T: DefaultInvoker,
    {
        Self::new(default_phase_id, T::synthesize)
    }

    pub(crate) fn from_factory(default_phase_id: I, factory: Arc<dyn InvokerFactory<T>>) -> Self {
        let invoker = factory.build_invoker(Vec::new());
        Self {
            default_phase_id,
            factory,
            state: Mutex::new(EventState {
                phases: HashMap::new(),
                sorted: Vec::new(),
                listeners: Vec::new(),
            }),
            invoker: ArcSwap::from_pointee(invoker),
        }
    }

    /// Builds a derived event from pre-filled phases, sharing `factory`.
    pub(crate) fn from_phases(
        default_phase_id: I,
        factory: Arc<dyn InvokerFactory<T>>,
        phases: HashMap<I, PhaseData<I, T>>,
    ) -> Self {
        let event = Self::from_factory(default_phase_id, factory);
        {
            let mut state = event.lock_state();
            state.phases = phases;
            state.sorted = sort_phase_ids(&state.phases);
            event.rebuild_invoker(&mut state);
        }
        event
    }

    /// The phase listeners land in when no phase is specified.
    pub fn default_phase_id(&self) -> &I {
        &self.default_phase_id
    }

    /// The name of the listener type, for diagnostics.
    pub fn listener_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    /// Returns the current invoker.
    ///
    /// See [`InvokableEvent::invoker`] for the caching caveat.
    pub fn invoker(&self) -> T {
        let invoker = self.invoker.load();
        (**invoker).clone()
    }

    /// Registers a listener in the default phase.
    ///
    /// Registering the same listener twice makes it run twice per
    /// dispatch, in its two registration positions.
    pub fn register(&self, listener: T) {
        self.register_in(self.default_phase_id.clone(), listener);
    }

    /// Registers a listener in a specific phase, creating the phase if
    /// needed.
    pub fn register_in(&self, phase: I, listener: T) {
        let mut state = self.lock_state();
        Self::get_or_create_phase(&mut state, &phase, true);
        state
            .phases
            .get_mut(&phase)
            .expect("phase was just created")
            .listeners
            .push(listener);
        self.rebuild_invoker(&mut state);
    }

    /// Declares that the listeners of `first` run before the listeners of
    /// `second`.
    ///
    /// See [`ListenableEvent::add_phase_ordering`] for the error and cycle
    /// behaviour.
    pub fn add_phase_ordering(&self, first: I, second: I) -> EventResult<()> {
        if first == second {
            return Err(EventError::SelfOrderedPhase(format!("{first:?}")));
        }

        self.link_phases(first, second);
        Ok(())
    }

    /// Links two distinct phases; the caller has already ruled out
    /// `first == second`.
    pub(crate) fn link_phases(&self, first: I, second: I) {
        let mut state = self.lock_state();
        Self::get_or_create_phase(&mut state, &first, false);
        Self::get_or_create_phase(&mut state, &second, false);

        state
            .phases
            .get_mut(&first)
            .expect("first phase exists")
            .links
            .add_following(second.clone());
        state
            .phases
            .get_mut(&second)
            .expect("second phase exists")
            .links
            .add_preceding(first);

        state.sorted = sort_phase_ids(&state.phases);
        self.rebuild_invoker(&mut state);
    }

    fn lock_state(&self) -> MutexGuard<'_, EventState<I, T>> {
        self.state.lock().unwrap()
    }

    fn get_or_create_phase(state: &mut EventState<I, T>, id: &I, sort_if_create: bool) {
        if state.phases.contains_key(id) {
            return;
        }

        state.phases.insert(id.clone(), PhaseData::new(id.clone()));
        state.sorted.push(id.clone());
        if sort_if_create {
            state.sorted = sort_phase_ids(&state.phases);
        }
    }

    /// Re-derives the consolidated listener vector from the sorted phases
    /// and publishes a fresh invoker. Must be called with the state lock
    /// held for every mutation.
    fn rebuild_invoker(&self, state: &mut EventState<I, T>) {
        state.listeners =
            concat_listeners(&state.sorted, &state.phases, |phase| phase.listeners.as_slice());
        let invoker = self.factory.build_invoker(state.listeners.clone());
        self.invoker.store(Arc::new(invoker));
    }
}

impl<I: PhaseId, T: Listener> InvokableEvent<T> for Event<I, T> {
    fn invoker(&self) -> T {
        Event::invoker(self)
    }
}

impl<I: PhaseId, T: Listener> ListenableEvent<I, T> for Event<I, T> {
    fn default_phase_id(&self) -> &I {
        Event::default_phase_id(self)
    }

    fn register(&self, listener: T) {
        Event::register(self, listener);
    }

    fn register_in(&self, phase: I, listener: T) {
        Event::register_in(self, phase, listener);
    }

    fn add_phase_ordering(&self, first: I, second: I) -> EventResult<()> {
        Event::add_phase_ordering(self, first, second)
    }
}

impl<I: PhaseId, T: Listener> Debug for Event<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("Event")
            .field("listener_type", &self.listener_type_name())
            .field("default_phase_id", &self.default_phase_id)
            .field("phases", &state.sorted)
            .field("listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}
