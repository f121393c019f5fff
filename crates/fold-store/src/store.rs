use crate::action::{Action, State};
use crate::bus::{ActionBus, Connector, Delivery};
use crate::cache::{Subscription, View};
use crate::config::StoreConfig;
use crate::dispatcher::DispatchHandle;
use crate::error::StoreError;
use crate::middleware::{Entry, LoggingMiddleware, Middleware, MiddlewareRegistry};
use crate::pipeline::ReductionPipeline;
use crate::reducer::Reducer;
use crate::snapshot::Snapshot;
use futures::Stream;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Redux-style Store that serializes actions and republishes state
///
/// The Store follows the unidirectional pattern:
/// - Actions from any thread are queued on one ordered channel
/// - A single worker folds them into state with a pure reducer
/// - Middleware observes every reduction before and after the reducer
/// - Subscribers receive the latest snapshot on subscribe, then every update
///
/// Cloning a store gives another handle to the same instance. The worker runs
/// on the tokio runtime the store was built on and stops once every handle
/// (and every forwarding task) is gone.
///
/// # Example
/// ```rust,ignore
/// let store = Store::builder(AppState::default(), reduce)
///     .config(StoreConfig::named("app"))
///     .middleware(Arc::new(AuditMiddleware))
///     .build()?;
///
/// let mut states = store.states();
/// store.dispatch(AppAction::Refresh)?;
/// ```
pub struct Store<S, A> {
    pipeline: Arc<ReductionPipeline<S, A>>,
    bus: Arc<ActionBus<A>>,
    runtime: Handle,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<S: State, A: Action> Store<S, A> {
    /// Create a store on the current tokio runtime with default config.
    pub fn new<R>(initial_state: S, reducer: R) -> Result<Self, StoreError>
    where
        R: Reducer<S, A>,
    {
        Self::builder(initial_state, reducer).build()
    }

    pub fn builder<R>(initial_state: S, reducer: R) -> StoreBuilder<S, A>
    where
        R: Reducer<S, A>,
    {
        StoreBuilder::new(initial_state, reducer)
    }

    /// Queue one action for reduction.
    ///
    /// Never blocks. Fails only if the store has halted, or if the action
    /// channel was closed and reopening it failed too.
    pub fn dispatch(&self, action: A) -> Result<Delivery, StoreError> {
        if let Some(reason) = self.pipeline.cache().halt_reason() {
            return Err(StoreError::halted(reason));
        }
        self.bus.publish(action)
    }

    /// Forward every action of `actions` into the store.
    pub fn dispatch_stream<St>(&self, actions: St) -> DispatchHandle
    where
        St: Stream<Item = A> + Send + 'static,
    {
        DispatchHandle::spawn(&self.runtime, Arc::clone(&self.bus), actions)
    }

    /// Forward every action of an iterator into the store.
    pub fn dispatch_iter<I>(&self, actions: I) -> DispatchHandle
    where
        I: IntoIterator<Item = A>,
        I::IntoIter: Send + 'static,
    {
        self.dispatch_stream(futures::stream::iter(actions))
    }

    /// Add middleware to the store
    ///
    /// Middleware is called in the order it was added, starting with the
    /// next action to be reduced.
    pub fn add_middleware<M>(&self, middleware: Arc<M>)
    where
        M: Middleware<S, A> + 'static,
    {
        self.pipeline.middleware().add(middleware);
    }

    /// Remove the first registration of `middleware`.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_middleware<M>(&self, middleware: &Arc<M>) -> bool
    where
        M: Middleware<S, A> + 'static,
    {
        self.pipeline.middleware().remove(middleware)
    }

    /// Handle to the middleware list, usable from inside middleware.
    pub fn middleware(&self) -> MiddlewareRegistry<S, A> {
        self.pipeline.middleware().clone()
    }

    /// Snapshots whose state differs from the previously emitted one.
    pub fn states(&self) -> Subscription<S, A> {
        self.subscribe(View::Distinct)
    }

    /// Every snapshot, in processing order.
    pub fn indistinct_states(&self) -> Subscription<S, A> {
        self.subscribe(View::Indistinct)
    }

    pub fn subscribe(&self, view: View) -> Subscription<S, A> {
        self.pipeline.cache().subscribe(view)
    }

    /// Post-process every reduced state from the next reduction on.
    pub fn set_override_hook<F>(&self, hook: F)
    where
        F: Fn(S, &A) -> S + Send + Sync + 'static,
    {
        log::debug!("[{}] Override hook set", self.name());
        self.pipeline.override_slot().set(hook);
    }

    /// Restore the identity override.
    pub fn clear_override_hook(&self) {
        log::debug!("[{}] Override hook cleared", self.name());
        self.pipeline.override_slot().clear();
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot<S, A> {
        self.pipeline.cache().latest()
    }

    /// State of the most recently published snapshot.
    pub fn state(&self) -> Arc<S> {
        self.snapshot().shared_state()
    }

    /// The error that stopped the store, if it stopped.
    pub fn halt_reason(&self) -> Option<StoreError> {
        self.pipeline.cache().halt_reason()
    }

    pub fn is_halted(&self) -> bool {
        self.pipeline.cache().is_halted()
    }

    /// Whether a reduction worker is currently attached to the action channel.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn name(&self) -> &str {
        self.pipeline.label()
    }
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            bus: Arc::clone(&self.bus),
            runtime: self.runtime.clone(),
            worker: Arc::clone(&self.worker),
        }
    }
}

/// Builder for [`Store`] with config, runtime and initial middleware.
pub struct StoreBuilder<S, A> {
    initial_state: S,
    reducer: Box<dyn Reducer<S, A>>,
    config: StoreConfig,
    runtime: Option<Handle>,
    middleware: Vec<Entry<S, A>>,
}

impl<S: State, A: Action> StoreBuilder<S, A> {
    pub fn new<R>(initial_state: S, reducer: R) -> Self
    where
        R: Reducer<S, A>,
    {
        Self {
            initial_state,
            reducer: Box::new(reducer),
            config: StoreConfig::default(),
            runtime: None,
            middleware: Vec::new(),
        }
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the worker on `runtime` instead of the current runtime.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Register middleware before the first action is reduced.
    pub fn middleware<M>(mut self, middleware: Arc<M>) -> Self
    where
        M: Middleware<S, A> + 'static,
    {
        self.middleware.push(middleware);
        self
    }

    pub fn build(self) -> Result<Store<S, A>, StoreError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| StoreError::NoRuntime)?,
        };

        let registry: MiddlewareRegistry<S, A> = MiddlewareRegistry::new();
        if self.config.log_actions {
            registry.add(Arc::new(LoggingMiddleware::new(self.config.name.clone())));
        }
        for entry in self.middleware {
            registry.add_entry(entry);
        }

        let pipeline = Arc::new(ReductionPipeline::new(
            self.config.name.clone(),
            self.initial_state,
            self.reducer,
            registry,
        ));
        let worker = Arc::new(Mutex::new(None));

        let connector: Connector<A> = {
            let pipeline = Arc::clone(&pipeline);
            let runtime = runtime.clone();
            let worker = Arc::clone(&worker);
            Box::new(move |rx: mpsc::UnboundedReceiver<A>| {
                if let Some(reason) = pipeline.cache().halt_reason() {
                    return Err(StoreError::halted(reason));
                }
                let task = runtime.spawn(Arc::clone(&pipeline).run(rx));
                *worker.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
                Ok(())
            })
        };
        let bus = ActionBus::connect(connector)?.with_recovery(self.config.recover_bus);

        log::debug!(
            "[{}] Store created with {} middleware",
            self.config.name,
            pipeline.middleware().len()
        );

        Ok(Store {
            pipeline,
            bus: Arc::new(bus),
            runtime,
            worker,
        })
    }
}
