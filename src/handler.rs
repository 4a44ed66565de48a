//! Listener shapes and context selectors.
//!
//! An event stores values of an arbitrary user-chosen listener type; the
//! only requirement is the [`Listener`] marker bound. The canonical shape
//! for a listener is [`Callback`]: a shared closure over one borrowed
//! argument, for which ready-made invoker strategies exist (see
//! [`crate::invoker`]). Events with several dispatch arguments simply use a
//! wider closure type together with a custom invoker factory.

use std::sync::Arc;

/// Marker for types that can be registered on an event.
///
/// Listeners are held by shared reference semantics: the event clones them
/// into the consolidated dispatch array, so the type must be cheap to clone
/// (an [`Arc`]-based type in practice) and safe to share across threads.
pub trait Listener: Clone + Send + Sync + 'static {}

impl<T: Clone + Send + Sync + 'static> Listener for T {}

/// A shared listener closure taking one borrowed argument of type `A` and
/// returning `R`.
///
/// This is the canonical listener shape: `Callback<str>` for plain
/// notification listeners, `Callback<str, bool>` for filters, and
/// `Callback<str, TriState>` for tri-state filters.
pub type Callback<A, R = ()> = Arc<dyn Fn(&A) -> R + Send + Sync>;

/// A shared predicate over a filtering context of type `C`.
pub type Selector<C> = Arc<dyn Fn(&C) -> bool + Send + Sync>;

/// Wraps a closure into a [`Callback`].
///
/// # Examples
///
/// ```rust
/// use phasic::handler::{callback, Callback};
///
/// let greet: Callback<str> = callback(|name: &str| println!("hello, {name}"));
/// greet("world");
/// ```
pub fn callback<A, R, F>(f: F) -> Callback<A, R>
where
    A: ?Sized + 'static,
    R: 'static,
    F: Fn(&A) -> R + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps a closure into a [`Selector`].
pub fn selector<C, F>(f: F) -> Selector<C>
where
    C: ?Sized + 'static,
    F: Fn(&C) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A selector that accepts every context.
pub fn always<C: ?Sized + 'static>() -> Selector<C> {
    Arc::new(|_| true)
}

/// A selector that rejects every context.
pub fn never<C: ?Sized + 'static>() -> Selector<C> {
    Arc::new(|_| false)
}

/// Negates a selector.
pub fn not<C: ?Sized + 'static>(selector: Selector<C>) -> Selector<C> {
    Arc::new(move |context| !selector(context))
}

/// A selector that accepts a context accepted by any of the given
/// selectors. With no selectors this never accepts.
pub fn any_of<C: ?Sized + 'static>(selectors: Vec<Selector<C>>) -> Selector<C> {
    Arc::new(move |context| selectors.iter().any(|selector| selector(context)))
}

/// A selector that accepts a context accepted by all of the given
/// selectors. With no selectors this always accepts.
pub fn all_of<C: ?Sized + 'static>(selectors: Vec<Selector<C>>) -> Selector<C> {
    Arc::new(move |context| selectors.iter().all(|selector| selector(context)))
}
