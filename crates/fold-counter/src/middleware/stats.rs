//! StatsMiddleware - counts reductions and state changes

use crate::actions::CounterAction;
use crate::state::CounterState;
use fold_store::Middleware;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Tracks how many actions were reduced and how many of them changed the count
#[derive(Default)]
pub struct StatsMiddleware {
    reductions: AtomicU64,
    changes: AtomicU64,
    /// Count seen by `before_reduce`, compared in `after_reduce`
    pending: Mutex<Option<i64>>,
}

impl StatsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reductions(&self) -> u64 {
        self.reductions.load(Ordering::SeqCst)
    }

    pub fn changes(&self) -> u64 {
        self.changes.load(Ordering::SeqCst)
    }
}

impl Middleware<CounterState, CounterAction> for StatsMiddleware {
    fn before_reduce(&self, state: &CounterState, _action: &CounterAction) -> anyhow::Result<()> {
        *self.pending.lock().unwrap_or_else(|e| e.into_inner()) = Some(state.count);
        Ok(())
    }

    fn after_reduce(&self, action: &CounterAction, next_state: &CounterState) -> anyhow::Result<()> {
        let before = self
            .pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        self.reductions.fetch_add(1, Ordering::SeqCst);
        if before != Some(next_state.count) {
            self.changes.fetch_add(1, Ordering::SeqCst);
            log::debug!("{:?} moved count to {}", action, next_state.count);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "stats"
    }
}
