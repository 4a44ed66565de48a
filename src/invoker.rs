//! Invoker synthesis: turning a listener array into a single listener.
//!
//! An event never iterates its listeners itself. Instead it keeps one
//! *invoker*, a value of the listener type, built by an
//! [`InvokerFactory`] from a snapshot of the registered listeners, and
//! dispatch is a single call through that value. The factory decides the
//! iteration and short-circuit policy:
//!
//! - [`SequenceFactory`] calls every listener and returns nothing;
//! - [`FilterFactory`] returns a `bool` and stops at the first decisive
//!   answer;
//! - [`TriStateFactory`] returns a [`TriState`] and stops at the first
//!   listener that does not answer [`TriState::Default`].
//!
//! For the canonical [`Callback`] listener shapes the factory can also be
//! inferred from the return type alone, through [`DefaultInvoker`].

use crate::handler::{Callback, Listener};
use crate::tri_state::TriState;
use std::sync::Arc;

/// Builds the invoker of an event from a snapshot of its listeners.
///
/// The factory receives an owned copy of the listener array; the event's
/// own storage cannot be observed or mutated through it. Implementations
/// must invoke the listeners in index order and must be pure: the same
/// input array always yields an equivalent invoker.
///
/// Any `Fn(Vec<T>) -> T` closure is an invoker factory.
pub trait InvokerFactory<T: Listener>: Send + Sync + 'static {
    /// Builds a single listener value that dispatches to every listener in
    /// `listeners`, in order.
    fn build_invoker(&self, listeners: Vec<T>) -> T;
}

impl<T, F> InvokerFactory<T> for F
where
    T: Listener,
    F: Fn(Vec<T>) -> T + Send + Sync + 'static,
{
    fn build_invoker(&self, listeners: Vec<T>) -> T {
        self(listeners)
    }
}

/// A listener type whose invoker strategy is determined by its dispatch
/// result type.
///
/// Implemented for the canonical [`Callback`] shapes:
///
/// - `Callback<A, ()>`: sequence, every listener runs;
/// - `Callback<A, bool>`: filter, first `true` wins, default `false`;
/// - `Callback<A, TriState>`: tri-state, first non-default answer wins.
///
/// Listener types with any other result shape need an explicit factory.
pub trait DefaultInvoker: Listener {
    /// Builds the default invoker for this listener type.
    fn synthesize(listeners: Vec<Self>) -> Self;
}

impl<A: ?Sized + 'static> DefaultInvoker for Callback<A, ()> {
    fn synthesize(listeners: Vec<Self>) -> Self {
        Arc::new(move |argument| {
            for listener in &listeners {
                listener(argument);
            }
        })
    }
}

impl<A: ?Sized + 'static> DefaultInvoker for Callback<A, bool> {
    fn synthesize(listeners: Vec<Self>) -> Self {
        Arc::new(move |argument| listeners.iter().any(|listener| listener(argument)))
    }
}

impl<A: ?Sized + 'static> DefaultInvoker for Callback<A, TriState> {
    fn synthesize(listeners: Vec<Self>) -> Self {
        Arc::new(move |argument| {
            for listener in &listeners {
                let answer = listener(argument);
                if !answer.is_default() {
                    return answer;
                }
            }

            TriState::Default
        })
    }
}

/// Factory for invokers that call every listener in order and return
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceFactory;

impl<A: ?Sized + 'static> InvokerFactory<Callback<A, ()>> for SequenceFactory {
    fn build_invoker(&self, listeners: Vec<Callback<A, ()>>) -> Callback<A, ()> {
        DefaultInvoker::synthesize(listeners)
    }
}

/// Factory for boolean filter invokers.
///
/// The regular variant stops at the first listener returning `true` and
/// returns `true`; with no decisive listener it returns `false`. The
/// [inverted](FilterFactory::inverted) variant stops at the first `false`
/// and defaults to `true`.
///
/// # Examples
///
/// ```rust
/// use phasic::handler::{callback, Callback};
/// use phasic::invoker::{FilterFactory, InvokerFactory};
///
/// let listeners: Vec<Callback<str, bool>> = vec![
///     callback(|text: &str| text.is_empty()),
///     callback(|text: &str| text.contains('e')),
/// ];
///
/// let filter = FilterFactory::new().build_invoker(listeners);
/// assert!(filter(""));
/// assert!(filter("hello"));
/// assert!(!filter("話"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterFactory {
    inverted: bool,
}

impl FilterFactory {
    /// A filter factory that stops on the first `true`.
    pub const fn new() -> Self {
        Self { inverted: false }
    }

    /// A filter factory that stops on the first `false`.
    pub const fn inverted() -> Self {
        Self { inverted: true }
    }
}

impl<A: ?Sized + 'static> InvokerFactory<Callback<A, bool>> for FilterFactory {
    fn build_invoker(&self, listeners: Vec<Callback<A, bool>>) -> Callback<A, bool> {
        if self.inverted {
            Arc::new(move |argument| listeners.iter().all(|listener| listener(argument)))
        } else {
            DefaultInvoker::synthesize(listeners)
        }
    }
}

/// Factory for tri-state filter invokers: the first listener answering
/// anything other than [`TriState::Default`] ends the dispatch with that
/// answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriStateFactory;

impl<A: ?Sized + 'static> InvokerFactory<Callback<A, TriState>> for TriStateFactory {
    fn build_invoker(&self, listeners: Vec<Callback<A, TriState>>) -> Callback<A, TriState> {
        DefaultInvoker::synthesize(listeners)
    }
}
