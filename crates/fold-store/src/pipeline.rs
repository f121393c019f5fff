//! ReductionPipeline - folds actions into snapshots, one at a time
//!
//! For each action taken off the bus:
//!
//! 1. `before_reduce(current_state, action)` on every middleware
//! 2. `reduced = reducer(current_state, action)`
//! 3. `next = override_hook(reduced, action)`
//! 4. `(next, action)` becomes the current snapshot
//! 5. `after_reduce(action, next)` on every middleware
//!
//! The snapshot is published to the cache after step 5. The current state is
//! locked for the whole step, so two steps never overlap even if a second
//! worker is attached after a bus recovery.
//!
//! Application code (hooks, reducer, override) runs under `catch_unwind`. A
//! panic or a hook error halts the store: the error is handed to the cache as
//! the terminal item and the worker stops consuming.

use crate::action::{Action, State};
use crate::cache::StateCache;
use crate::error::{Stage, StoreError};
use crate::middleware::MiddlewareRegistry;
use crate::reducer::{OverrideSlot, Reducer};
use crate::snapshot::Snapshot;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

struct Current<S> {
    state: Arc<S>,
    sequence: u64,
}

pub struct ReductionPipeline<S, A> {
    label: String,
    reducer: Box<dyn Reducer<S, A>>,
    middleware: MiddlewareRegistry<S, A>,
    override_slot: OverrideSlot<S, A>,
    current: Mutex<Current<S>>,
    cache: StateCache<S, A>,
}

impl<S: State, A: Action> ReductionPipeline<S, A> {
    pub fn new(
        label: impl Into<String>,
        initial: S,
        reducer: Box<dyn Reducer<S, A>>,
        middleware: MiddlewareRegistry<S, A>,
    ) -> Self {
        let seed = Snapshot::initial(initial);
        Self {
            label: label.into(),
            reducer,
            middleware,
            override_slot: OverrideSlot::new(),
            current: Mutex::new(Current {
                state: seed.shared_state(),
                sequence: 0,
            }),
            cache: StateCache::new(seed),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn middleware(&self) -> &MiddlewareRegistry<S, A> {
        &self.middleware
    }

    pub fn override_slot(&self) -> &OverrideSlot<S, A> {
        &self.override_slot
    }

    pub fn cache(&self) -> &StateCache<S, A> {
        &self.cache
    }

    /// Run one action through the pipeline and return the resulting snapshot.
    ///
    /// Does not publish; see [`ReductionPipeline::process`].
    pub fn step(&self, action: A) -> Result<Snapshot<S, A>, StoreError> {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let middleware = self.middleware.snapshot();

        log::trace!(
            "[{}] Reducing #{}: {:?}",
            self.label,
            current.sequence + 1,
            action
        );

        for m in &middleware {
            run_hook(Stage::BeforeReduce, m.name(), || {
                m.before_reduce(&current.state, &action)
            })?;
        }

        let reduced = guarded(Stage::Reduce, || {
            self.reducer.reduce(&current.state, &action)
        })?;

        let next = match self.override_slot.current() {
            Some(hook) => guarded(Stage::Override, || hook(reduced, &action))?,
            None => reduced,
        };

        let next = Arc::new(next);
        current.state = Arc::clone(&next);
        current.sequence += 1;
        let sequence = current.sequence;

        for m in &middleware {
            run_hook(Stage::AfterReduce, m.name(), || m.after_reduce(&action, &next))?;
        }

        Ok(Snapshot::next(next, action, sequence))
    }

    /// Reduce one action and publish the result, or halt on failure.
    ///
    /// Returns `false` once the store is halted.
    pub fn process(&self, action: A) -> bool {
        if self.cache.is_halted() {
            return false;
        }

        match self.step(action) {
            Ok(snapshot) => {
                self.cache.publish(snapshot);
                true
            }
            Err(e) => {
                self.cache.halt(e);
                false
            }
        }
    }

    /// Worker loop: consume `rx` until it closes or the store halts.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::UnboundedReceiver<A>) {
        log::debug!("[{}] Reduction worker started", self.label);

        while let Some(action) = rx.recv().await {
            if !self.process(action) {
                rx.close();
                break;
            }
        }

        log::debug!("[{}] Reduction worker stopped", self.label);
    }
}

/// Run `f`, turning a panic into [`StoreError::Panicked`].
fn guarded<T>(stage: Stage, f: impl FnOnce() -> T) -> Result<T, StoreError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| StoreError::Panicked {
        stage,
        message: panic_message(payload.as_ref()),
    })
}

fn run_hook(
    stage: Stage,
    middleware: &str,
    hook: impl FnOnce() -> anyhow::Result<()>,
) -> Result<(), StoreError> {
    guarded(stage, hook)?.map_err(|e| StoreError::Middleware {
        stage,
        middleware: middleware.to_string(),
        message: format!("{e:#}"),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::View;
    use crate::middleware::Middleware;
    use anyhow::bail;
    use pretty_assertions::assert_eq;

    #[derive(Clone, Debug, PartialEq)]
    enum Op {
        Add(i32),
        Fail,
    }

    fn reducer(state: &i32, op: &Op) -> i32 {
        match op {
            Op::Add(n) => state + n,
            Op::Fail => panic!("cannot reduce {state}"),
        }
    }

    fn pipeline() -> ReductionPipeline<i32, Op> {
        ReductionPipeline::new("test", 0, Box::new(reducer), MiddlewareRegistry::new())
    }

    struct Trace {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Middleware<i32, Op> for Trace {
        fn before_reduce(&self, state: &i32, action: &Op) -> anyhow::Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("before {state} {action:?}"));
            Ok(())
        }

        fn after_reduce(&self, action: &Op, next_state: &i32) -> anyhow::Result<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("after {action:?} {next_state}"));
            Ok(())
        }
    }

    struct Refuse;

    impl Middleware<i32, Op> for Refuse {
        fn after_reduce(&self, _action: &Op, next_state: &i32) -> anyhow::Result<()> {
            if *next_state > 10 {
                bail!("{next_state} is too large");
            }
            Ok(())
        }

        fn name(&self) -> &str {
            "refuse"
        }
    }

    #[test]
    fn test_step_sequences_snapshots() {
        let pipeline = pipeline();

        let first = pipeline.step(Op::Add(2)).unwrap();
        let second = pipeline.step(Op::Add(3)).unwrap();

        assert_eq!((*first.state(), first.sequence()), (2, 1));
        assert_eq!((*second.state(), second.sequence()), (5, 2));
        assert_eq!(second.action(), Some(&Op::Add(3)));
    }

    #[test]
    fn test_hooks_wrap_reducer_and_override() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = pipeline();
        pipeline.middleware().add(Arc::new(Trace { log: log.clone() }));
        pipeline.override_slot().set(|state, _| state * 10);

        let snapshot = pipeline.step(Op::Add(1)).unwrap();

        assert_eq!(*snapshot.state(), 10);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before 0 Add(1)".to_string(), "after Add(1) 10".to_string()]
        );
    }

    #[test]
    fn test_reducer_panic_becomes_error() {
        let pipeline = pipeline();
        let err = pipeline.step(Op::Fail).unwrap_err();
        assert_eq!(
            err,
            StoreError::Panicked {
                stage: Stage::Reduce,
                message: "cannot reduce 0".to_string(),
            }
        );
    }

    #[test]
    fn test_override_panic_names_stage() {
        let pipeline = pipeline();
        pipeline.override_slot().set(|_, _| panic!("override broke"));

        let err = pipeline.step(Op::Add(1)).unwrap_err();
        assert_eq!(
            err,
            StoreError::Panicked {
                stage: Stage::Override,
                message: "override broke".to_string(),
            }
        );
    }

    #[test]
    fn test_middleware_error_halts_without_publishing() {
        let pipeline = pipeline();
        pipeline.middleware().add(Arc::new(Refuse));
        let mut all = pipeline.cache().subscribe(View::Indistinct);

        assert!(pipeline.process(Op::Add(4)));
        assert!(!pipeline.process(Op::Add(20)));
        assert!(!pipeline.process(Op::Add(1)));

        let items = all.drain();
        assert_eq!(items.len(), 3);
        assert_eq!(*items[1].as_ref().unwrap().state(), 4);
        assert_eq!(
            items[2].clone().unwrap_err(),
            StoreError::Middleware {
                stage: Stage::AfterReduce,
                middleware: "refuse".to_string(),
                message: "24 is too large".to_string(),
            }
        );
        assert_eq!(*pipeline.cache().latest().state(), 4);
    }

    #[tokio::test]
    async fn test_worker_stops_on_halt() {
        let pipeline = Arc::new(pipeline());
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Arc::clone(&pipeline).run(rx));

        tx.send(Op::Add(1)).unwrap();
        tx.send(Op::Fail).unwrap();
        worker.await.unwrap();

        assert!(tx.is_closed());
        assert!(pipeline.cache().is_halted());
        assert_eq!(*pipeline.cache().latest().state(), 1);
    }
}
