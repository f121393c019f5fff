//! Dispatching action sequences
//!
//! An action sequence is any [`Stream`] of actions. Its items are forwarded to
//! the bus by a dedicated task, in the order the stream yields them,
//! interleaved with whatever other producers dispatch meanwhile.

use crate::bus::ActionBus;
use crate::error::StoreError;
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Handle to a forwarding task started by `Store::dispatch_stream`.
///
/// Cancelling stops forwarding from this sequence only; actions already
/// forwarded are still reduced and other producers are unaffected. Dropping
/// the handle detaches the task, it keeps forwarding.
#[derive(Debug)]
pub struct DispatchHandle {
    task: JoinHandle<Result<u64, StoreError>>,
}

impl DispatchHandle {
    pub(crate) fn spawn<A, St>(runtime: &Handle, bus: Arc<ActionBus<A>>, actions: St) -> Self
    where
        A: Send + 'static,
        St: Stream<Item = A> + Send + 'static,
    {
        let task = runtime.spawn(async move {
            let mut actions = Box::pin(actions);
            let mut forwarded = 0u64;

            while let Some(action) = actions.next().await {
                if let Err(e) = bus.publish(action) {
                    log::error!(
                        "Stopped forwarding action sequence after {} actions: {}",
                        forwarded,
                        e
                    );
                    return Err(e);
                }
                forwarded += 1;
            }

            log::debug!("Action sequence finished after {} actions", forwarded);
            Ok(forwarded)
        });

        Self { task }
    }

    /// Stop forwarding further actions from this sequence.
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for forwarding to end.
    ///
    /// Returns the number of forwarded actions when the sequence completed,
    /// [`StoreError::Cancelled`] when it was cancelled, or the bus error that
    /// stopped it.
    pub async fn join(self) -> Result<u64, StoreError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(StoreError::Cancelled),
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
}
