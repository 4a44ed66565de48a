//! A three-valued logical type.

/// A value that is either `true`, `false`, or unset.
///
/// `TriState` is the return convention of the tri-state dispatch strategy:
/// listeners return [`TriState::Default`] to pass the decision along, and
/// any other value ends the dispatch early. See
/// [`TriStateFactory`](crate::invoker::TriStateFactory).
///
/// # Examples
///
/// ```rust
/// use phasic::TriState;
///
/// assert_eq!(TriState::from(true), TriState::True);
/// assert_eq!(TriState::Default.to_bool(), None);
/// assert!(TriState::Default.to_bool_or(true));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TriState {
    /// A value of `true`.
    True,
    /// A value of `false`.
    False,
    /// The absence of a value.
    #[default]
    Default,
}

impl TriState {
    /// Returns `true` if this is [`TriState::Default`].
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    /// Converts to a boolean, mapping [`TriState::Default`] to `None`.
    pub const fn to_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Default => None,
        }
    }

    /// Converts to a boolean, mapping [`TriState::Default`] to `fallback`.
    pub const fn to_bool_or(self, fallback: bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Default => fallback,
        }
    }

    /// Converts to a boolean, lazily computing the fallback for
    /// [`TriState::Default`].
    pub fn to_bool_or_else(self, fallback: impl FnOnce() -> bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Default => fallback(),
        }
    }

    /// The "and" of two tri-states.
    ///
    /// `True` yields the other operand, `False` wins outright, and
    /// `Default` absorbs a `True` on the other side.
    ///
    /// | A | B | A and B |
    /// |---|---|---------|
    /// | `True` | b | b |
    /// | `False` | _ | `False` |
    /// | `Default` | `True` | `Default` |
    /// | `Default` | b | b |
    pub const fn and(self, other: Self) -> Self {
        match self {
            Self::True => other,
            Self::False => Self::False,
            Self::Default => match other {
                Self::True => Self::Default,
                _ => other,
            },
        }
    }

    /// The "and" of two tri-states, lazily evaluating the right-hand side.
    pub fn and_then(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::False => Self::False,
            _ => self.and(other()),
        }
    }

    /// The "or" of two tri-states.
    ///
    /// `True` wins outright, `False` yields the other operand, and
    /// `Default` absorbs a `False` on the other side.
    ///
    /// | A | B | A or B |
    /// |---|---|--------|
    /// | `True` | _ | `True` |
    /// | `False` | b | b |
    /// | `Default` | `False` | `Default` |
    /// | `Default` | b | b |
    pub const fn or(self, other: Self) -> Self {
        match self {
            Self::True => Self::True,
            Self::False => other,
            Self::Default => match other {
                Self::False => Self::Default,
                _ => other,
            },
        }
    }

    /// The "or" of two tri-states, lazily evaluating the right-hand side.
    pub fn or_else(self, other: impl FnOnce() -> Self) -> Self {
        match self {
            Self::True => Self::True,
            _ => self.or(other()),
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(value) => Self::from(value),
            None => Self::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TriState::{Default, False, True};
    use super::*;

    #[test]
    fn and_truth_table() {
        assert_eq!(False.and(False), False);
        assert_eq!(True.and(False), False);
        assert_eq!(False.and(True), False);
        assert_eq!(True.and(True), True);
        assert_eq!(Default.and(Default), Default);
        assert_eq!(False.and(Default), False);
        assert_eq!(True.and(Default), Default);
        assert_eq!(Default.and(False), False);
        assert_eq!(Default.and(True), Default);
    }

    #[test]
    fn or_truth_table() {
        assert_eq!(False.or(False), False);
        assert_eq!(True.or(False), True);
        assert_eq!(False.or(True), True);
        assert_eq!(True.or(True), True);
        assert_eq!(Default.or(Default), Default);
        assert_eq!(False.or(Default), Default);
        assert_eq!(True.or(Default), True);
        assert_eq!(Default.or(False), Default);
        assert_eq!(Default.or(True), True);
    }

    #[test]
    fn lazy_variants_short_circuit() {
        assert_eq!(
            False.and_then(|| panic!("must not evaluate the right-hand side")),
            False
        );
        assert_eq!(
            True.or_else(|| panic!("must not evaluate the right-hand side")),
            True
        );
        assert_eq!(Default.and_then(|| True), Default);
        assert_eq!(Default.or_else(|| False), Default);
    }

    #[test]
    fn conversions() {
        assert_eq!(TriState::from(true), True);
        assert_eq!(TriState::from(false), False);
        assert_eq!(TriState::from(Some(true)), True);
        assert_eq!(TriState::from(None), Default);

        assert_eq!(True.to_bool(), Some(true));
        assert_eq!(False.to_bool(), Some(false));
        assert_eq!(Default.to_bool(), None);

        assert!(Default.to_bool_or(true));
        assert!(!Default.to_bool_or(false));
        assert!(True.to_bool_or(false));
        assert!(Default.to_bool_or_else(|| true));
    }

    #[test]
    fn default_value_is_the_unset_state() {
        assert_eq!(TriState::default(), Default);
        assert!(Default.is_default());
        assert!(!True.is_default());
    }
}
