//! Utilities for testing listener execution order.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Asserts that listeners run, and run in the expected order.
///
/// Listeners call [`assert_order`](ExecutionTester::assert_order) with
/// their expected position; the test then checks the total with
/// [`assert_called`](ExecutionTester::assert_called). Share the tester
/// with listeners through an `Arc`.
///
/// # Examples
///
/// ```rust
/// use phasic::testing::ExecutionTester;
/// use std::sync::Arc;
///
/// let tester = Arc::new(ExecutionTester::new());
///
/// let t = tester.clone();
/// let first = move || t.assert_order(0);
/// let t = tester.clone();
/// let second = move || t.assert_order(1);
///
/// first();
/// second();
/// tester.assert_called(2);
/// ```
#[derive(Debug)]
pub struct ExecutionTester {
    calls: AtomicUsize,
    strict: AtomicBool,
}

impl Default for ExecutionTester {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionTester {
    /// Creates a tester expecting strictly ordered calls.
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            strict: AtomicBool::new(true),
        }
    }

    /// Resets the call count.
    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    /// Toggles order checking. When disabled,
    /// [`assert_order`](ExecutionTester::assert_order) only counts calls,
    /// for scenarios where several equivalent orders are acceptable.
    pub fn use_strict_order(&self, strict: bool) {
        self.strict.store(strict, Ordering::SeqCst);
    }

    /// Records one call, asserting it is the `order`-th (zero-based) when
    /// strict ordering is on.
    pub fn assert_order(&self, order: usize) {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.strict.load(Ordering::SeqCst) {
            assert_eq!(order, calls, "expected listener #{order} to be called");
        }
    }

    /// Records nothing; registered on listeners that are expected to stay
    /// silent.
    pub fn skip(&self) {}

    /// Asserts the total number of calls since the last reset.
    pub fn assert_called(&self, called: usize) {
        assert_eq!(
            called,
            self.calls.load(Ordering::SeqCst),
            "expected a specific amount of listener calls"
        );
    }
}

/// Runs `action` once for every permutation of `items`.
///
/// The number of invocations is the factorial of `items.len()`; keep the
/// input small.
pub fn for_all_permutations<T: Clone>(items: &[T], mut action: impl FnMut(&[T])) {
    let mut selected = Vec::with_capacity(items.len());
    permute(&mut selected, items, &mut action);
}

fn permute<T: Clone>(selected: &mut Vec<T>, remaining: &[T], action: &mut impl FnMut(&[T])) {
    if remaining.is_empty() {
        action(selected);
        return;
    }

    for index in 0..remaining.len() {
        selected.push(remaining[index].clone());
        let mut rest = remaining.to_vec();
        rest.remove(index);
        permute(selected, &rest, action);
        selected.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_permutation_is_visited_once() {
        let mut seen = Vec::new();
        for_all_permutations(&[1, 2, 3], |permutation| seen.push(permutation.to_vec()));

        assert_eq!(seen.len(), 6);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
        assert!(seen.contains(&vec![3, 1, 2]));
    }

    #[test]
    fn the_empty_permutation_runs_the_action_once() {
        let mut runs = 0;
        for_all_permutations(&[] as &[u8], |permutation| {
            assert!(permutation.is_empty());
            runs += 1;
        });
        assert_eq!(runs, 1);
    }

    #[test]
    fn lenient_mode_only_counts() {
        let tester = ExecutionTester::new();
        tester.use_strict_order(false);
        tester.assert_order(5);
        tester.assert_order(0);
        tester.skip();
        tester.assert_called(2);
    }
}
