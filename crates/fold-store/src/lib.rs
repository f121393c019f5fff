//! # fold-store
//!
//! A unidirectional state store. Actions from any number of producers are
//! funnelled into one ordered channel, folded one at a time into an immutable
//! state snapshot by a pure reducer, and republished to any number of
//! subscribers with the latest snapshot replayed on subscribe.
//!
//! ## Data flow
//!
//! ```text
//! dispatch ──► ActionBus ──► ReductionPipeline ──► StateCache ──► subscribers
//!                               │       ▲
//!                               ▼       │
//!                         MiddlewareRegistry
//! ```
//!
//! For every action the pipeline runs, in order and without interleaving:
//!
//! 1. `before_reduce` on every registered middleware
//! 2. the reducer
//! 3. the override hook (identity unless set)
//! 4. `after_reduce` on every registered middleware
//!
//! The resulting [`Snapshot`] is published on two views:
//! [`Store::indistinct_states`] (every snapshot) and [`Store::states`]
//! (consecutive duplicate states suppressed).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fold_store::Store;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter { count: i64 }
//!
//! #[derive(Clone, Debug)]
//! enum CounterAction { Increment, NoOp }
//!
//! let store = Store::new(Counter { count: 0 }, |state: &Counter, action: &CounterAction| {
//!     match action {
//!         CounterAction::Increment => Counter { count: state.count + 1 },
//!         CounterAction::NoOp => state.clone(),
//!     }
//! })?;
//!
//! let mut states = store.states();
//! store.dispatch(CounterAction::Increment)?;
//!
//! while let Some(Ok(snapshot)) = states.recv().await {
//!     println!("{:?} after {:?}", snapshot.state(), snapshot.action());
//! }
//! ```
//!
//! ## Failure model
//!
//! A failing middleware hook or a panicking reducer halts the store: both views
//! receive the error as their final item, and further dispatches are refused.
//! A closed action channel is reopened once per publish; if that retry fails
//! too, the error is returned to the caller.

pub mod action;
pub mod bus;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod reducer;
pub mod snapshot;
pub mod store;

// Re-export commonly used types
pub use action::{Action, Cause, State};
pub use bus::{ActionBus, Delivery};
pub use cache::{Emission, StateCache, Subscription, View};
pub use config::StoreConfig;
pub use dispatcher::DispatchHandle;
pub use error::{Stage, StoreError};
pub use middleware::{LoggingMiddleware, Middleware, MiddlewareRegistry};
pub use reducer::{OverrideSlot, Reducer};
pub use snapshot::Snapshot;
pub use store::{Store, StoreBuilder};
