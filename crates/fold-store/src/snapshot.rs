//! Snapshot - the state after processing one action

use crate::action::Cause;
use std::sync::Arc;

/// The pair `(state, action)` describing the store after one reduction.
///
/// Snapshots of one store form a gapless sequence: `sequence` is 0 for the
/// seed and grows by one per processed action. The state is shared, so
/// cloning a snapshot for every subscriber does not clone the state.
#[derive(Debug)]
pub struct Snapshot<S, A> {
    state: Arc<S>,
    cause: Cause<A>,
    sequence: u64,
}

impl<S, A> Snapshot<S, A> {
    /// The seed snapshot `(initial_state, NoAction)`.
    pub fn initial(state: S) -> Self {
        Self {
            state: Arc::new(state),
            cause: Cause::NoAction,
            sequence: 0,
        }
    }

    pub(crate) fn next(state: Arc<S>, action: A, sequence: u64) -> Self {
        Self {
            state,
            cause: Cause::Dispatched(action),
            sequence,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Shared handle to the state, for keeping it beyond the snapshot.
    pub fn shared_state(&self) -> Arc<S> {
        Arc::clone(&self.state)
    }

    pub fn cause(&self) -> &Cause<A> {
        &self.cause
    }

    /// The action that produced this snapshot, `None` for the seed.
    pub fn action(&self) -> Option<&A> {
        self.cause.action()
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<S, A: Clone> Clone for Snapshot<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            cause: self.cause.clone(),
            sequence: self.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot() {
        let snapshot: Snapshot<u32, &str> = Snapshot::initial(7);
        assert_eq!(*snapshot.state(), 7);
        assert_eq!(snapshot.action(), None);
        assert_eq!(snapshot.sequence(), 0);
    }

    #[test]
    fn test_clone_shares_state() {
        let snapshot = Snapshot::next(Arc::new(vec![1, 2, 3]), "push", 4);
        let copy = snapshot.clone();
        assert!(Arc::ptr_eq(&snapshot.shared_state(), &copy.shared_state()));
        assert_eq!(copy.action(), Some(&"push"));
        assert_eq!(copy.sequence(), 4);
    }
}
