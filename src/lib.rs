//! # Phasic - Typed, Phased, Filterable Event Dispatch
//!
//! Phasic is a synchronous event dispatch library. Producers define named
//! dispatch points (events), subscribers register listeners (optionally
//! into a named execution *phase*, optionally guarded by a predicate over a
//! *context* value) and dispatch runs every applicable listener in a
//! deterministic order through a single call on a synthesized invoker.
//!
//! ## Features
//!
//! - **Typed listeners**: every event carries its own listener type; the
//!   invoker has exactly that type, so dispatch is one ordinary call.
//! - **Phases**: listeners group into named phases ordered by explicit
//!   "A runs before B" constraints, resolved into a canonical,
//!   input-order-independent schedule. Contradictions degrade to grouped
//!   ordering with a warning instead of failing.
//! - **Short-circuit strategies**: ready-made invokers for plain sequences,
//!   boolean filters and [`TriState`] voting, inferred from the listener's
//!   result type.
//! - **Context filtering**: listeners may declare the contexts they care
//!   about; materializing an event for one context yields the matching
//!   subset, kept up to date with later registrations and released once
//!   unused.
//! - **Lock-free dispatch**: registration locks the event, dispatch never
//!   does: it reads an atomically published invoker snapshot.
//!
//! ## Quick Start
//!
//! ```rust
//! use phasic::{Callback, EventManager};
//! use std::sync::Arc;
//!
//! // Managers hand out events sharing a default phase.
//! let events = EventManager::of("default");
//! let on_message = events.create::<Callback<str>>();
//!
//! on_message.register(Arc::new(|text: &str| {
//!     println!("received: {text}");
//! }));
//!
//! // Dispatch is one call through the current invoker.
//! (on_message.invoker())("hello world");
//! ```
//!
//! ## Phases
//!
//! ```rust
//! use phasic::{Callback, EventManager};
//! use std::sync::Arc;
//!
//! let events = EventManager::of("default");
//! let event = events
//!     .create_with_phases::<Callback<str>>(&[
//!         "early".to_owned(),
//!         "default".to_owned(),
//!         "late".to_owned(),
//!     ])
//!     .unwrap();
//!
//! event.register_in("late".to_owned(), Arc::new(|_: &str| println!("3")));
//! event.register(Arc::new(|_: &str| println!("2")));
//! event.register_in("early".to_owned(), Arc::new(|_: &str| println!("1")));
//!
//! // Prints 1, 2, 3 regardless of registration order.
//! (event.invoker())("go");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod filtered;
pub mod handler;
pub mod invoker;
pub mod listen;
pub mod manager;
pub mod testing;
pub mod toposort;
pub mod tri_state;

pub use error::{EventError, EventResult};
pub use event::{Event, InvokableEvent, ListenableEvent, PhaseId};
pub use filtered::{Context, ContextualizedEvent, FilteredEvent};
pub use handler::{Callback, Listener, Selector};
pub use invoker::{
    DefaultInvoker, FilterFactory, InvokerFactory, SequenceFactory, TriStateFactory,
};
pub use listen::{EventGroup, Listens};
pub use manager::{AnyEvent, EventCreation, EventManager};
pub use tri_state::TriState;

/// Convenience imports for the common surface of the crate.
pub mod prelude {
    pub use crate::error::{EventError, EventResult};
    pub use crate::event::{Event, InvokableEvent, ListenableEvent, PhaseId};
    pub use crate::filtered::{Context, ContextualizedEvent, FilteredEvent};
    pub use crate::handler::{callback, selector, Callback, Listener, Selector};
    pub use crate::invoker::{
        DefaultInvoker, FilterFactory, InvokerFactory, SequenceFactory, TriStateFactory,
    };
    pub use crate::listen::Listens;
    pub use crate::manager::{AnyEvent, EventManager};
    pub use crate::tri_state::TriState;
}

/// Version of the phasic library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod test_phases;

#[cfg(test)]
mod test_thread_safe;
