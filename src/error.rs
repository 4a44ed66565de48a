//! Error types for event construction and registration.

use thiserror::Error;

/// Errors raised by event and event-manager operations.
///
/// Every variant is an argument-validation failure raised before any state
/// is mutated: an operation either succeeds completely or leaves the event
/// exactly as it was. Ordering cycles are deliberately *not* errors; the
/// phase sorter degrades to grouped emission and warns instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A phase was ordered relative to itself.
    #[error("cannot order phase {0} relative to itself")]
    SelfOrderedPhase(String),

    /// A default-phase list contains the same phase twice.
    #[error("duplicate phase {0} in the default phase list")]
    DuplicatePhase(String),

    /// A default-phase list does not contain the manager's default phase.
    #[error("the default phase list must contain the manager's default phase identifier")]
    MissingDefaultPhase,

    /// `listen_all` was called without any event.
    #[error("tried to register a listener for an empty event list")]
    NoEventsGiven,
}

/// Convenience alias for results of event operations.
pub type EventResult<T> = Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_offending_phase() {
        let error = EventError::SelfOrderedPhase("\"late\"".to_owned());
        assert_eq!(
            error.to_string(),
            "cannot order phase \"late\" relative to itself"
        );

        let error = EventError::DuplicatePhase("\"early\"".to_owned());
        assert_eq!(
            error.to_string(),
            "duplicate phase \"early\" in the default phase list"
        );
    }
}
