//! Reducer and override hook
//!
//! The reducer is a pure function from the current state and an action to the
//! next state. The override slot holds an optional post-processing step applied
//! to every reduced state; it can be swapped at runtime without rebuilding the
//! store.

use std::sync::{Arc, RwLock};

/// Pure function computing the next state from the current state and an action.
///
/// Must not mutate its input or perform side effects; those belong in
/// middleware. Implemented for any matching closure.
pub trait Reducer<S, A>: Send + Sync + 'static {
    fn reduce(&self, state: &S, action: &A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S + Send + Sync + 'static,
{
    fn reduce(&self, state: &S, action: &A) -> S {
        self(state, action)
    }
}

type OverrideFn<S, A> = Arc<dyn Fn(S, &A) -> S + Send + Sync>;

/// Mutable slot holding the post-reduction override hook.
///
/// Empty means identity. The hook is read once per reduction, so setting it
/// affects every reduction that starts afterwards and none before.
pub struct OverrideSlot<S, A> {
    hook: RwLock<Option<OverrideFn<S, A>>>,
}

impl<S, A> OverrideSlot<S, A> {
    pub fn new() -> Self {
        Self {
            hook: RwLock::new(None),
        }
    }

    pub fn set<F>(&self, hook: F)
    where
        F: Fn(S, &A) -> S + Send + Sync + 'static,
    {
        *self.hook.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(hook));
    }

    /// Reset to identity.
    pub fn clear(&self) {
        *self.hook.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_set(&self) -> bool {
        self.hook
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Current hook, if any. The lock is released before the hook runs.
    pub(crate) fn current(&self) -> Option<OverrideFn<S, A>> {
        self.hook.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn apply(&self, reduced: S, action: &A) -> S {
        match self.current() {
            Some(hook) => hook(reduced, action),
            None => reduced,
        }
    }
}

impl<S, A> Default for OverrideSlot<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(state: &i32, action: &i32) -> i32 {
        state + action
    }

    #[test]
    fn test_fn_is_reducer() {
        assert_eq!(add.reduce(&2, &3), 5);

        let push = |state: &Vec<u8>, action: &u8| {
            let mut next = state.clone();
            next.push(*action);
            next
        };
        assert_eq!(push.reduce(&vec![1, 2], &3), vec![1, 2, 3]);
    }

    #[test]
    fn test_override_defaults_to_identity() {
        let slot: OverrideSlot<i32, i32> = OverrideSlot::new();
        assert!(!slot.is_set());
        assert_eq!(slot.apply(41, &0), 41);
    }

    #[test]
    fn test_override_set_and_clear() {
        let slot: OverrideSlot<i32, i32> = OverrideSlot::new();
        slot.set(|state, action| state * action);
        assert!(slot.is_set());
        assert_eq!(slot.apply(6, &7), 42);

        slot.clear();
        assert_eq!(slot.apply(6, &7), 6);
    }
}
