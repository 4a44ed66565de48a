//! Context-filtered events and their contextualized projections.
//!
//! A [`FilteredEvent`] is an event whose listeners may each carry a
//! [`Selector`] over a *context* value. The event's own invoker only runs
//! the global (unguarded) listeners; to run the listeners relevant to a
//! specific context, [`FilteredEvent::for_context`] materializes a
//! [`ContextualizedEvent`] holding exactly the matching subset, in the
//! parent's canonical phase order.
//!
//! Contextualized events stay live: any listener later registered on the
//! parent whose selector accepts their context is forwarded to them, and
//! phase orderings added to the parent are replayed. The parent only holds
//! them weakly, so dropping the last external handle releases them.

use crate::error::{EventError, EventResult};
use crate::event::{
    concat_listeners, sort_phase_ids, Event, InvokableEvent, ListenableEvent, PhaseData, PhaseId,
};
use crate::handler::{Listener, Selector};
use crate::invoker::{DefaultInvoker, InvokerFactory};
use crate::toposort::{NodeLinks, SortableNode};
use arc_swap::ArcSwap;
use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Marker for context types of a [`FilteredEvent`].
///
/// Contexts key the map of live contextualized events, by equality.
pub trait Context: Clone + Eq + Hash + Send + Sync + 'static {}

impl<C: Clone + Eq + Hash + Send + Sync + 'static> Context for C {}

/// A listener together with its optional context selector; no selector
/// means the listener is global.
struct GuardedListener<T, C> {
    listener: T,
    selector: Option<Selector<C>>,
}

impl<T: Clone, C> Clone for GuardedListener<T, C> {
    fn clone(&self) -> Self {
        Self {
            listener: self.listener.clone(),
            selector: self.selector.clone(),
        }
    }
}

impl<T, C> GuardedListener<T, C> {
    fn accepts(&self, context: &C) -> bool {
        self.selector
            .as_ref()
            .map_or(true, |selector| selector(context))
    }
}

/// A phase of a filtered event: the plain listener vector holds the global
/// listeners only, while the guarded vector carries every listener with
/// its selector.
struct FilteredPhaseData<I, T, C> {
    id: I,
    global: Vec<T>,
    guarded: Vec<GuardedListener<T, C>>,
    links: NodeLinks<I>,
}

impl<I: PhaseId, T, C> FilteredPhaseData<I, T, C> {
    fn new(id: I) -> Self {
        Self {
            id,
            global: Vec::new(),
            guarded: Vec::new(),
            links: NodeLinks::new(),
        }
    }

    /// Projects this phase for one context, keeping the matching listeners
    /// and all ordering edges.
    fn project(&self, context: &C) -> PhaseData<I, T>
    where
        T: Clone,
    {
        let mut phase = PhaseData::new(self.id.clone());
        phase.listeners = self
            .guarded
            .iter()
            .filter(|guarded| guarded.accepts(context))
            .map(|guarded| guarded.listener.clone())
            .collect();
        phase.links = self.links.clone();
        phase
    }
}

impl<'a, I: PhaseId, T, C> SortableNode for &'a FilteredPhaseData<I, T, C> {
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

struct FilteredState<I: PhaseId, T: Listener, C: Context> {
    phases: HashMap<I, FilteredPhaseData<I, T, C>>,
    sorted: Vec<I>,
    listeners: Vec<T>,
    contexts: HashMap<C, Weak<ContextualizedEvent<I, T, C>>>,
}

/// An event which can filter its listeners by an invocation context.
///
/// Registering through [`register`](FilteredEvent::register) adds a global
/// listener, invoked no matter the context. Registering through
/// [`register_when`](FilteredEvent::register_when) guards the listener
/// with a selector; guarded listeners only run through a
/// [`ContextualizedEvent`] whose context they accept.
///
/// # Examples
///
/// ```rust
/// use phasic::{Callback, EventManager};
/// use std::sync::Arc;
///
/// let events = EventManager::of("default");
/// let event = events.create_filtered::<Callback<str>, String>();
///
/// event.register(Arc::new(|text: &str| println!("always: {text}")));
/// event.register_when(
///     Arc::new(|text: &str| println!("only in tests: {text}")),
///     Arc::new(|context: &String| context == "test"),
/// );
///
/// let test_run = event.for_context("test".to_owned());
/// (test_run.invoker())("both listeners run");
/// (event.invoker())("only the global listener runs");
/// ```
pub struct FilteredEvent<I: PhaseId, T: Listener, C: Context> {
    default_phase_id: I,
    factory: Arc<dyn InvokerFactory<T>>,
    state: Mutex<FilteredState<I, T, C>>,
    invoker: ArcSwap<T>,
}

impl<I: PhaseId, T: Listener, C: Context> FilteredEvent<I, T, C> {
    /// Creates a filtered event with an explicit invoker factory.
    pub fn new(default_phase_id: I, factory: impl InvokerFactory<T>) -> Self {
        Self::from_factory(default_phase_id, Arc::new(factory))
    }

    /// Creates a filtered event whose invoker strategy is inferred from
    /// the listener type.
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
            state: Mutex::new(FilteredState {
                phases: HashMap::new(),
                sorted: Vec::new(),
                listeners: Vec::new(),
                contexts: HashMap::new(),
            }),
            invoker: ArcSwap::from_pointee(invoker),
        }
    }

    /// The phase listeners land in when no phase is specified.
    pub fn default_phase_id(&self) -> &I {
        &self.default_phase_id
    }

    /// The name of the listener type, for diagnostics.
    pub fn listener_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    /// Returns the current invoker, which dispatches to the global
    /// listeners only.
    ///
    /// See [`InvokableEvent::invoker`] for the caching caveat.
    pub fn invoker(&self) -> T {
        let invoker = self.invoker.load();
        (**invoker).clone()
    }

    /// Registers a global listener in the default phase.
    pub fn register(&self, listener: T) {
        self.register_in(self.default_phase_id.clone(), listener);
    }

    /// Registers a global listener in a specific phase.
    pub fn register_in(&self, phase: I, listener: T) {
        let mut state = self.lock_state();
        purge_contexts(&mut state);
        Self::get_or_create_phase(&mut state, &phase, true);

        let data = state
            .phases
            .get_mut(&phase)
            .expect("phase was just created");
        data.global.push(listener.clone());
        data.guarded.push(GuardedListener {
            listener: listener.clone(),
            selector: None,
        });

        self.rebuild_invoker(&mut state);
        notify_registration(&state, &phase, &listener, None);
    }

    /// Registers a listener in the default phase, guarded by a selector.
    ///
    /// The listener never runs through this event's own invoker; it only
    /// runs through contextualized events whose context the selector
    /// accepts.
    pub fn register_when(&self, listener: T, selector: Selector<C>) {
        self.register_when_in(self.default_phase_id.clone(), listener, selector);
    }

    /// Registers a guarded listener in a specific phase.
    pub fn register_when_in(&self, phase: I, listener: T, selector: Selector<C>) {
        let mut state = self.lock_state();
        purge_contexts(&mut state);
        Self::get_or_create_phase(&mut state, &phase, true);

        state
            .phases
            .get_mut(&phase)
            .expect("phase was just created")
            .guarded
            .push(GuardedListener {
                listener: listener.clone(),
                selector: Some(selector.clone()),
            });

        self.rebuild_invoker(&mut state);
        notify_registration(&state, &phase, &listener, Some(&selector));
    }

    /// Declares that the listeners of `first` run before the listeners of
    /// `second`, here and in every live contextualized event.
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

    pub(crate) fn link_phases(&self, first: I, second: I) {
        let mut state = self.lock_state();
        purge_contexts(&mut state);
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
            .add_preceding(first.clone());

        state.sorted = sort_phase_ids(&state.phases);
        self.rebuild_invoker(&mut state);

        for contextualized in live_contexts(&state) {
            contextualized.event.link_phases(first.clone(), second.clone());
        }
    }

    /// Returns the contextualized event for `context`, creating it if no
    /// live one exists.
    ///
    /// The result holds exactly the listeners whose selector accepts
    /// `context` (plus every global listener), in this event's canonical
    /// phase order, and keeps receiving matching registrations made here.
    /// This event retains it only weakly: it lives for as long as the
    /// caller keeps the returned handle.
    pub fn for_context(&self, context: C) -> Arc<ContextualizedEvent<I, T, C>> {
        self.contextualize(context, false)
    }

    /// Builds a fresh contextualized event for `context`, replacing any
    /// live one.
    ///
    /// The replaced event keeps dispatching its own listeners but no
    /// longer receives registrations from this event.
    pub fn for_context_replace(&self, context: C) -> Arc<ContextualizedEvent<I, T, C>> {
        self.contextualize(context, true)
    }

    fn contextualize(&self, context: C, replace: bool) -> Arc<ContextualizedEvent<I, T, C>> {
        let mut state = self.lock_state();

        if !replace {
            if let Some(existing) = state.contexts.get(&context).and_then(Weak::upgrade) {
                return existing;
            }
        }

        let phases = state
            .phases
            .values()
            .map(|phase| (phase.id.clone(), phase.project(&context)))
            .collect();
        let contextualized = Arc::new(ContextualizedEvent {
            event: Event::from_phases(
                self.default_phase_id.clone(),
                self.factory.clone(),
                phases,
            ),
            context: context.clone(),
        });
        state
            .contexts
            .insert(context, Arc::downgrade(&contextualized));

        contextualized
    }

    fn lock_state(&self) -> MutexGuard<'_, FilteredState<I, T, C>> {
        self.state.lock().unwrap()
    }

    fn get_or_create_phase(state: &mut FilteredState<I, T, C>, id: &I, sort_if_create: bool) {
        if state.phases.contains_key(id) {
            return;
        }

        state
            .phases
            .insert(id.clone(), FilteredPhaseData::new(id.clone()));
        state.sorted.push(id.clone());
        if sort_if_create {
            state.sorted = sort_phase_ids(&state.phases);
        }
    }

    fn rebuild_invoker(&self, state: &mut FilteredState<I, T, C>) {
        state.listeners =
            concat_listeners(&state.sorted, &state.phases, |phase| phase.global.as_slice());
        let invoker = self.factory.build_invoker(state.listeners.clone());
        self.invoker.store(Arc::new(invoker));
    }

    #[cfg(test)]
    fn live_context_count(&self) -> usize {
        live_contexts(&self.lock_state()).len()
    }
}

/// Drops map entries whose contextualized event has been released.
fn purge_contexts<I: PhaseId, T: Listener, C: Context>(state: &mut FilteredState<I, T, C>) {
    state
        .contexts
        .retain(|_, contextualized| contextualized.strong_count() > 0);
}

fn live_contexts<I: PhaseId, T: Listener, C: Context>(
    state: &FilteredState<I, T, C>,
) -> Vec<Arc<ContextualizedEvent<I, T, C>>> {
    state.contexts.values().filter_map(Weak::upgrade).collect()
}

/// Offers a new parent registration to every live contextualized event.
fn notify_registration<I: PhaseId, T: Listener, C: Context>(
    state: &FilteredState<I, T, C>,
    phase: &I,
    listener: &T,
    selector: Option<&Selector<C>>,
) {
    for contextualized in live_contexts(state) {
        contextualized.register_from_parent(phase.clone(), listener.clone(), selector);
    }
}

impl<I: PhaseId, T: Listener, C: Context> InvokableEvent<T> for FilteredEvent<I, T, C> {
    fn invoker(&self) -> T {
        FilteredEvent::invoker(self)
    }
}

impl<I: PhaseId, T: Listener, C: Context> ListenableEvent<I, T> for FilteredEvent<I, T, C> {
    fn default_phase_id(&self) -> &I {
        FilteredEvent::default_phase_id(self)
    }

    fn register(&self, listener: T) {
        FilteredEvent::register(self, listener);
    }

    fn register_in(&self, phase: I, listener: T) {
        FilteredEvent::register_in(self, phase, listener);
    }

    fn add_phase_ordering(&self, first: I, second: I) -> EventResult<()> {
        FilteredEvent::add_phase_ordering(self, first, second)
    }
}

impl<I: PhaseId, T: Listener, C: Context> Debug for FilteredEvent<I, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("FilteredEvent")
            .field("listener_type", &self.listener_type_name())
            .field("default_phase_id", &self.default_phase_id)
            .field("phases", &state.sorted)
            .field("global_listeners", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

/// The projection of a [`FilteredEvent`] for one specific context.
///
/// A contextualized event behaves like a plain [`Event`] over the subset
/// of the parent's listeners relevant to its context. Listeners may also
/// be registered on it directly; such registrations stay local and are
/// never propagated back to the parent.
pub struct ContextualizedEvent<I: PhaseId, T: Listener, C: Context> {
    event: Event<I, T>,
    context: C,
}

impl<I: PhaseId, T: Listener, C: Context> ContextualizedEvent<I, T, C> {
    /// The context this event was materialized for.
    pub fn context(&self) -> &C {
        &self.context
    }

    /// The phase listeners land in when no phase is specified.
    pub fn default_phase_id(&self) -> &I {
        self.event.default_phase_id()
    }

    /// Returns the current invoker over the context-relevant listeners.
    ///
    /// See [`InvokableEvent::invoker`] for the caching caveat.
    pub fn invoker(&self) -> T {
        self.event.invoker()
    }

    /// Registers a listener in the default phase of this contextualized
    /// event only.
    pub fn register(&self, listener: T) {
        self.event.register(listener);
    }

    /// Registers a listener in a specific phase of this contextualized
    /// event only.
    pub fn register_in(&self, phase: I, listener: T) {
        self.event.register_in(phase, listener);
    }

    /// Declares a phase ordering on this contextualized event only.
    ///
    /// See [`ListenableEvent::add_phase_ordering`] for the error and cycle
    /// behaviour.
    pub fn add_phase_ordering(&self, first: I, second: I) -> EventResult<()> {
        self.event.add_phase_ordering(first, second)
    }

    fn register_from_parent(&self, phase: I, listener: T, selector: Option<&Selector<C>>) {
        let accepted = selector.map_or(true, |selector| selector(&self.context));
        if accepted {
            self.event.register_in(phase, listener);
        }
    }
}

impl<I: PhaseId, T: Listener, C: Context> InvokableEvent<T> for ContextualizedEvent<I, T, C> {
    fn invoker(&self) -> T {
        ContextualizedEvent::invoker(self)
    }
}

impl<I: PhaseId, T: Listener, C: Context> ListenableEvent<I, T> for ContextualizedEvent<I, T, C> {
    fn default_phase_id(&self) -> &I {
        ContextualizedEvent::default_phase_id(self)
    }

    fn register(&self, listener: T) {
        ContextualizedEvent::register(self, listener);
    }

    fn register_in(&self, phase: I, listener: T) {
        ContextualizedEvent::register_in(self, phase, listener);
    }

    fn add_phase_ordering(&self, first: I, second: I) -> EventResult<()> {
        ContextualizedEvent::add_phase_ordering(self, first, second)
    }
}

impl<I: PhaseId, T: Listener, C: Context> Debug for ContextualizedEvent<I, T, C>
where
    C: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualizedEvent")
            .field("context", &self.context)
            .field("event", &self.event)
            .finish()
    }
}
