//! Middleware system
//!
//! Middleware observes every reduction. It is called around the reducer, never
//! instead of it, and cannot change the action or the resulting state.
//!
//! ## Design
//!
//! ```text
//! Action → before_reduce (all middleware) → Reducer → Override → after_reduce (all middleware)
//! ```
//!
//! Middleware runs in registration order. The registry can change at any
//! time; every reduction works on a copy of the list taken when it starts, so
//! a middleware added or removed while an action is being reduced takes
//! effect from the next action on.
//!
//! ## Example
//!
//! ```rust,ignore
//! struct AuditMiddleware;
//!
//! impl Middleware<AppState, AppAction> for AuditMiddleware {
//!     fn after_reduce(&self, action: &AppAction, next_state: &AppState) -> anyhow::Result<()> {
//!         log::info!("{:?} -> {:?}", action, next_state);
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::{Arc, RwLock};

// Module declarations
mod logging;

// Re-exports
pub use logging::LoggingMiddleware;

/// Observer invoked before and after every reduction.
///
/// Both hooks default to no-ops. Returning an error from either hook is fatal
/// for the store.
pub trait Middleware<S, A>: Send + Sync {
    /// Called with the current state before the reducer runs.
    fn before_reduce(&self, _state: &S, _action: &A) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with the state produced by the reducer and override hook.
    fn after_reduce(&self, _action: &A, _next_state: &S) -> anyhow::Result<()> {
        Ok(())
    }

    /// Name used in log lines and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A registered middleware, shared with every reduction that uses it.
pub type Entry<S, A> = Arc<dyn Middleware<S, A>>;

/// Ordered, runtime-mutable list of middleware.
///
/// Cloning gives another handle to the same list. Duplicates are allowed;
/// entries are compared by identity (the same `Arc` allocation).
pub struct MiddlewareRegistry<S, A> {
    entries: Arc<RwLock<Vec<Entry<S, A>>>>,
}

impl<S, A> MiddlewareRegistry<S, A>
where
    S: 'static,
    A: 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Append a middleware; it runs after everything already registered.
    pub fn add<M>(&self, middleware: Arc<M>)
    where
        M: Middleware<S, A> + 'static,
    {
        self.add_entry(middleware);
    }

    pub(crate) fn add_entry(&self, entry: Entry<S, A>) {
        log::debug!("Adding middleware: {}", entry.name());
        self.write().push(entry);
    }

    /// Remove the first entry that is the same allocation as `middleware`.
    ///
    /// Returns `false` when it was never registered or is already gone.
    pub fn remove<M>(&self, middleware: &Arc<M>) -> bool
    where
        M: Middleware<S, A> + 'static,
    {
        let target = Arc::as_ptr(middleware) as *const ();
        let mut entries = self.write();
        match entries
            .iter()
            .position(|entry| Arc::as_ptr(entry) as *const () == target)
        {
            Some(index) => {
                let removed = entries.remove(index);
                log::debug!("Removed middleware: {}", removed.name());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of the current list, in registration order.
    pub fn snapshot(&self) -> Vec<Entry<S, A>> {
        self.read().clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Entry<S, A>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Entry<S, A>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S: 'static, A: 'static> Default for MiddlewareRegistry<S, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A> Clone for MiddlewareRegistry<S, A> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    struct TestMiddleware {
        label: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware<u32, u32> for TestMiddleware {
        fn before_reduce(&self, state: &u32, action: &u32) -> anyhow::Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:before:{}:{}", self.label, state, action));
            Ok(())
        }

        fn name(&self) -> &str {
            self.label
        }
    }

    struct Silent;

    impl Middleware<u32, u32> for Silent {}

    fn middleware(label: &'static str, calls: &Arc<Mutex<Vec<String>>>) -> Arc<TestMiddleware> {
        Arc::new(TestMiddleware {
            label,
            calls: Arc::clone(calls),
        })
    }

    #[test]
    fn test_default_hooks_are_noops() {
        let silent = Silent;
        assert!(silent.before_reduce(&1, &2).is_ok());
        assert!(silent.after_reduce(&2, &3).is_ok());
        assert!(silent.name().ends_with("Silent"));
    }

    #[test]
    fn test_registration_order_is_kept() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry: MiddlewareRegistry<u32, u32> = MiddlewareRegistry::new();
        registry.add(middleware("first", &calls));
        registry.add(middleware("second", &calls));

        for entry in registry.snapshot() {
            entry.before_reduce(&0, &1).unwrap();
        }

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["first:before:0:1".to_string(), "second:before:0:1".to_string()]
        );
    }

    #[test]
    fn test_remove_unknown_returns_false() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry: MiddlewareRegistry<u32, u32> = MiddlewareRegistry::new();
        registry.add(middleware("kept", &calls));

        let stranger = middleware("kept", &calls);
        assert!(!registry.remove(&stranger));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_takes_first_duplicate_only() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry: MiddlewareRegistry<u32, u32> = MiddlewareRegistry::new();
        let twice = middleware("twice", &calls);
        let other = middleware("other", &calls);
        registry.add(Arc::clone(&twice));
        registry.add(Arc::clone(&other));
        registry.add(Arc::clone(&twice));

        assert!(registry.remove(&twice));
        let names: Vec<String> = registry
            .snapshot()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["other".to_string(), "twice".to_string()]);

        assert!(registry.remove(&twice));
        assert!(!registry.remove(&twice));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_changes() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry: MiddlewareRegistry<u32, u32> = MiddlewareRegistry::new();
        let first = middleware("first", &calls);
        registry.add(Arc::clone(&first));

        let taken = registry.snapshot();
        registry.remove(&first);
        registry.add(middleware("late", &calls));

        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].name(), "first");
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_clones_share_the_list() {
        let registry: MiddlewareRegistry<u32, u32> = MiddlewareRegistry::new();
        let handle = registry.clone();
        handle.add(Arc::new(Silent));
        assert_eq!(registry.len(), 1);
    }
}
