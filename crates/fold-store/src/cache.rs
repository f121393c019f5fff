//! StateCache - last-value cache and fan-out to subscribers
//!
//! The cache holds the most recent snapshot and two subscriber lists, one per
//! [`View`]. A new subscriber gets the cached snapshot before anything else,
//! then every later snapshot of its view in order.
//!
//! The distinct filter runs once, here, not per subscriber: the cache
//! remembers the state last emitted on the distinct view and forwards a
//! snapshot to distinct subscribers only when its state differs from it.
//!
//! When the store halts, every subscriber receives the error as its last item
//! and its stream ends. Subscribers arriving later get the cached snapshot
//! followed by the same error.

use crate::action::{Action, State};
use crate::error::StoreError;
use crate::snapshot::Snapshot;
use futures::Stream;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Which sequence a subscriber observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Only snapshots whose state differs from the previously emitted one.
    Distinct,
    /// Every snapshot, including those that left the state unchanged.
    Indistinct,
}

/// One item of a subscription: a snapshot, or the error that halted the store.
pub type Emission<S, A> = Result<Snapshot<S, A>, StoreError>;

struct Inner<S, A> {
    latest: Snapshot<S, A>,
    last_distinct: Arc<S>,
    halted: Option<StoreError>,
    distinct: Vec<mpsc::UnboundedSender<Emission<S, A>>>,
    indistinct: Vec<mpsc::UnboundedSender<Emission<S, A>>>,
}

impl<S, A> Inner<S, A> {
    fn subscribers(&self, view: View) -> &Vec<mpsc::UnboundedSender<Emission<S, A>>> {
        match view {
            View::Distinct => &self.distinct,
            View::Indistinct => &self.indistinct,
        }
    }
}

pub struct StateCache<S, A> {
    inner: Mutex<Inner<S, A>>,
}

impl<S: State, A: Action> StateCache<S, A> {
    /// Create a cache seeded with `initial`.
    pub fn new(initial: Snapshot<S, A>) -> Self {
        let last_distinct = initial.shared_state();
        Self {
            inner: Mutex::new(Inner {
                latest: initial,
                last_distinct,
                halted: None,
                distinct: Vec::new(),
                indistinct: Vec::new(),
            }),
        }
    }

    /// Register a subscriber; the cached snapshot is queued before returning.
    pub fn subscribe(&self, view: View) -> Subscription<S, A> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.lock();

        // Receiver is alive, these sends cannot fail
        let _ = tx.send(Ok(inner.latest.clone()));

        match inner.halted.clone() {
            Some(reason) => {
                let _ = tx.send(Err(reason));
            }
            None => match view {
                View::Distinct => inner.distinct.push(tx),
                View::Indistinct => inner.indistinct.push(tx),
            },
        }

        log::trace!(
            "Subscriber added to {:?} view ({} total)",
            view,
            inner.subscribers(view).len()
        );
        Subscription { rx, view }
    }

    /// Store `snapshot` as the latest and fan it out.
    ///
    /// Returns whether the snapshot was also emitted on the distinct view.
    pub fn publish(&self, snapshot: Snapshot<S, A>) -> bool {
        let mut inner = self.lock();
        if inner.halted.is_some() {
            log::warn!(
                "Dropping snapshot #{} published after halt",
                snapshot.sequence()
            );
            return false;
        }

        let changed = !Arc::ptr_eq(&inner.last_distinct, &snapshot.shared_state())
            && *inner.last_distinct != *snapshot.state();
        if changed {
            inner.last_distinct = snapshot.shared_state();
            inner
                .distinct
                .retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());
        }

        inner
            .indistinct
            .retain(|tx| tx.send(Ok(snapshot.clone())).is_ok());

        inner.latest = snapshot;
        changed
    }

    /// Record a terminal error and end every subscription with it.
    ///
    /// Only the first call has an effect.
    pub fn halt(&self, reason: StoreError) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.halted.is_some() {
            return;
        }

        let subscribers = inner.distinct.len() + inner.indistinct.len();
        log::error!(
            "Store halted after snapshot #{}: {} ({} subscribers notified)",
            inner.latest.sequence(),
            reason,
            subscribers
        );

        for tx in inner.distinct.drain(..).chain(inner.indistinct.drain(..)) {
            let _ = tx.send(Err(reason.clone()));
        }
        inner.halted = Some(reason);
    }

    pub fn latest(&self) -> Snapshot<S, A> {
        self.lock().latest.clone()
    }

    pub fn halt_reason(&self) -> Option<StoreError> {
        self.lock().halted.clone()
    }

    pub fn is_halted(&self) -> bool {
        self.lock().halted.is_some()
    }

    /// Number of subscribers on `view` that have not been dropped.
    pub fn subscriber_count(&self, view: View) -> usize {
        self.lock()
            .subscribers(view)
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<S, A>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One observer's stream of snapshots.
///
/// Yields `Ok(snapshot)` items in processing order, starting with the cached
/// snapshot at the time of subscribing. If the store halts, the last item is
/// `Err(reason)` and the stream ends. Dropping the subscription cancels it
/// without affecting the store.
pub struct Subscription<S, A> {
    rx: mpsc::UnboundedReceiver<Emission<S, A>>,
    view: View,
}

impl<S, A> Subscription<S, A> {
    /// Wait for the next item; `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<Emission<S, A>> {
        self.rx.recv().await
    }

    /// Next item if one is already queued.
    pub fn try_recv(&mut self) -> Option<Emission<S, A>> {
        self.rx.try_recv().ok()
    }

    /// Every item queued right now.
    pub fn drain(&mut self) -> Vec<Emission<S, A>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Stop receiving. Equivalent to dropping the subscription.
    pub fn cancel(mut self) {
        self.rx.close();
    }
}

impl<S, A> Stream for Subscription<S, A> {
    type Item = Emission<S, A>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
