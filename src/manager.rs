//! The event manager: an event factory sharing a phase identifier type, a
//! default phase and a creation meta-event.

use crate::error::{EventError, EventResult};
use crate::event::{Event, PhaseId};
use crate::filtered::{Context, FilteredEvent};
use crate::handler::Listener;
use crate::invoker::{DefaultInvoker, InvokerFactory};
use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

/// A type-erased view of a freshly created event, handed to
/// [creation-event](EventManager::creation_event) listeners.
///
/// [`AnyEvent::as_any`] allows downcasting back to the concrete
/// [`Event`] or [`FilteredEvent`] type, for example to register listeners
/// before any user registration happens.
pub trait AnyEvent<I: PhaseId>: Send + Sync {
    /// The default phase identifier of the created event.
    fn default_phase_id(&self) -> &I;

    /// This event as [`Any`], for downcasting to its concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl<I: PhaseId, T: Listener> AnyEvent<I> for Event<I, T> {
    fn default_phase_id(&self) -> &I {
        Event::default_phase_id(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<I: PhaseId, T: Listener, C: Context> AnyEvent<I> for FilteredEvent<I, T, C> {
    fn default_phase_id(&self) -> &I {
        FilteredEvent::default_phase_id(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Listener shape of the [creation event](EventManager::creation_event):
/// called once per event created through the manager, with the manager and
/// the new event.
pub type EventCreation<I> = Arc<dyn Fn(&EventManager<I>, &dyn AnyEvent<I>) + Send + Sync>;

/// Creates and announces [`Event`]s sharing one phase identifier type and
/// one default phase identifier.
///
/// The manager also owns the phase-name parser used by
/// [`listen_all`](EventManager::listen_all) to turn declared phase names
/// into identifiers.
///
/// # Examples
///
/// ```rust
/// use phasic::{Callback, EventManager, TriState};
/// use std::sync::Arc;
///
/// let events = EventManager::of("default");
///
/// // The invoker strategy follows the listener's result type.
/// let notify = events.create::<Callback<str>>();
/// let filter = events.create::<Callback<str, bool>>();
/// let vote = events.create::<Callback<str, TriState>>();
///
/// filter.register(Arc::new(|text: &str| text.is_empty()));
/// assert!((filter.invoker())(""));
/// assert!(!(filter.invoker())("no"));
///
/// notify.register(Arc::new(|_: &str| {}));
/// assert_eq!((vote.invoker())("nobody voted"), TriState::Default);
/// ```
pub struct EventManager<I: PhaseId> {
    default_phase_id: I,
    phase_id_parser: Arc<dyn Fn(&str) -> I + Send + Sync>,
    creation_event: Event<I, EventCreation<I>>,
}

impl EventManager<String> {
    /// Creates a manager with string phase identifiers.
    pub fn of(default_phase_id: impl Into<String>) -> Self {
        Self::new(default_phase_id.into(), str::to_owned)
    }
}

impl<I: PhaseId> EventManager<I> {
    /// Creates a manager from the default phase identifier and the parser
    /// used to resolve declared phase names.
    pub fn new(
        default_phase_id: I,
        phase_id_parser: impl Fn(&str) -> I + Send + Sync + 'static,
    ) -> Self {
        let creation_event = Event::new(
            default_phase_id.clone(),
            |listeners: Vec<EventCreation<I>>| -> EventCreation<I> {
                Arc::new(move |manager: &EventManager<I>, event: &dyn AnyEvent<I>| {
                    for listener in &listeners {
                        listener(manager, event);
                    }
                })
            },
        );

        Self {
            default_phase_id,
            phase_id_parser: Arc::new(phase_id_parser),
            creation_event,
        }
    }

    /// The default phase identifier of every event created by this
    /// manager.
    pub fn default_phase_id(&self) -> &I {
        &self.default_phase_id
    }

    /// The event fired once per event created through this manager, after
    /// its construction and before any user registration.
    pub fn creation_event(&self) -> &Event<I, EventCreation<I>> {
        &self.creation_event
    }

    /// Resolves a declared phase name through this manager's parser.
    pub fn parse_phase_id(&self, name: &str) -> I {
        (self.phase_id_parser)(name)
    }

    /// Creates an event whose invoker strategy is inferred from the
    /// listener type.
    pub fn create<T: DefaultInvoker>(&self) -> Event<I, T> {
        self.create_with(T::synthesize)
    }

    /// Creates an event with an explicit invoker factory.
    pub fn create_with<T: Listener>(&self, factory: impl InvokerFactory<T>) -> Event<I, T> {
        let event = Event::new(self.default_phase_id.clone(), factory);
        self.announce(&event);
        event
    }

    /// Creates an event with a dedicated empty implementation.
    ///
    /// With no listeners the invoker *is* `empty`; with exactly one
    /// listener the invoker is that listener, unchanged; only from two
    /// listeners up does `factory` run. Intended for very hot dispatch
    /// paths; [`create`](Self::create) covers everything else.
    pub fn create_with_empty<T: Listener>(
        &self,
        empty: T,
        factory: impl InvokerFactory<T>,
    ) -> Event<I, T> {
        self.create_with(hot_path(empty, factory))
    }

    /// Creates an event with a chain of default phases, each ordered
    /// before the next, using the inferred invoker strategy.
    ///
    /// # Errors
    ///
    /// Fails with [`EventError::MissingDefaultPhase`] if `phases` does not
    /// contain [`default_phase_id`](Self::default_phase_id), and with
    /// [`EventError::DuplicatePhase`] if it contains the same phase twice.
    /// No event is created and nothing is announced on failure.
    pub fn create_with_phases<T: DefaultInvoker>(&self, phases: &[I]) -> EventResult<Event<I, T>> {
        self.create_with_phases_and(T::synthesize, phases)
    }

    /// Creates an event with a chain of default phases and an explicit
    /// invoker factory.
    ///
    /// See [`create_with_phases`](Self::create_with_phases) for the
    /// validation rules.
    pub fn create_with_phases_and<T: Listener>(
        &self,
        factory: impl InvokerFactory<T>,
        phases: &[I],
    ) -> EventResult<Event<I, T>> {
        self.validate_default_phases(phases)?;

        let event = Event::new(self.default_phase_id.clone(), factory);
        for pair in phases.windows(2) {
            event.link_phases(pair[0].clone(), pair[1].clone());
        }
        self.announce(&event);
        Ok(event)
    }

    /// Creates a filtered event whose invoker strategy is inferred from
    /// the listener type.
    pub fn create_filtered<T: DefaultInvoker, C: Context>(&self) -> FilteredEvent<I, T, C> {
        self.create_filtered_with(T::synthesize)
    }

    /// Creates a filtered event with an explicit invoker factory.
    pub fn create_filtered_with<T: Listener, C: Context>(
        &self,
        factory: impl InvokerFactory<T>,
    ) -> FilteredEvent<I, T, C> {
        let event = FilteredEvent::new(self.default_phase_id.clone(), factory);
        self.announce(&event);
        event
    }

    /// Creates a filtered event with a dedicated empty implementation.
    ///
    /// See [`create_with_empty`](Self::create_with_empty).
    pub fn create_filtered_with_empty<T: Listener, C: Context>(
        &self,
        empty: T,
        factory: impl InvokerFactory<T>,
    ) -> FilteredEvent<I, T, C> {
        self.create_filtered_with(hot_path(empty, factory))
    }

    /// Creates a filtered event with a chain of default phases, using the
    /// inferred invoker strategy.
    ///
    /// See [`create_with_phases`](Self::create_with_phases) for the
    /// validation rules.
    pub fn create_filtered_with_phases<T: DefaultInvoker, C: Context>(
        &self,
        phases: &[I],
    ) -> EventResult<FilteredEvent<I, T, C>> {
        self.create_filtered_with_phases_and(T::synthesize, phases)
    }

    /// Creates a filtered event with a chain of default phases and an
    /// explicit invoker factory.
    ///
    /// See [`create_with_phases`](Self::create_with_phases) for the
    /// validation rules.
    pub fn create_filtered_with_phases_and<T: Listener, C: Context>(
        &self,
        factory: impl InvokerFactory<T>,
        phases: &[I],
    ) -> EventResult<FilteredEvent<I, T, C>> {
        self.validate_default_phases(phases)?;

        let event = FilteredEvent::new(self.default_phase_id.clone(), factory);
        for pair in phases.windows(2) {
            event.link_phases(pair[0].clone(), pair[1].clone());
        }
        self.announce(&event);
        Ok(event)
    }

    fn announce(&self, event: &dyn AnyEvent<I>) {
        (self.creation_event.invoker())(self, event);
    }

    fn validate_default_phases(&self, phases: &[I]) -> EventResult<()> {
        if !phases.contains(&self.default_phase_id) {
            return Err(EventError::MissingDefaultPhase);
        }

        for (position, phase) in phases.iter().enumerate() {
            if phases[position + 1..].contains(phase) {
                return Err(EventError::DuplicatePhase(format!("{phase:?}")));
            }
        }

        Ok(())
    }
}

impl<I: PhaseId> Debug for EventManager<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("default_phase_id", &self.default_phase_id)
            .finish_non_exhaustive()
    }
}

/// Wraps a factory so that zero listeners dispatch through `empty` and a
/// sole listener dispatches through itself.
fn hot_path<T: Listener>(
    empty: T,
    factory: impl InvokerFactory<T>,
) -> impl Fn(Vec<T>) -> T + Send + Sync + 'static {
    move |mut listeners: Vec<T>| match listeners.len() {
        0 => empty.clone(),
        1 => listeners.remove(0),
        _ => factory.build_invoker(listeners),
    }
}
