//! Action and State capabilities
//!
//! Application code supplies its own action and state types. Anything that is
//! cloneable, printable and thread-safe qualifies as an [`Action`]; a [`State`]
//! additionally needs structural equality so the distinct view can drop
//! repeated states.

use std::fmt::Debug;

/// A unit of intent dispatched into the store.
pub trait Action: Clone + Debug + Send + Sync + 'static {}

impl<T> Action for T where T: Clone + Debug + Send + Sync + 'static {}

/// A complete, immutable application-state snapshot.
pub trait State: Clone + PartialEq + Debug + Send + Sync + 'static {}

impl<T> State for T where T: Clone + PartialEq + Debug + Send + Sync + 'static {}

/// What produced a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cause<A> {
    /// The seed snapshot emitted before any action was processed.
    NoAction,
    /// A dispatched action.
    Dispatched(A),
}

impl<A> Cause<A> {
    pub fn action(&self) -> Option<&A> {
        match self {
            Cause::NoAction => None,
            Cause::Dispatched(action) => Some(action),
        }
    }

    pub fn is_initial(&self) -> bool {
        matches!(self, Cause::NoAction)
    }
}

impl<A> From<A> for Cause<A> {
    fn from(action: A) -> Self {
        Cause::Dispatched(action)
    }
}
