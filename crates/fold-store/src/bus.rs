//! ActionBus - funnels every producer into one ordered action channel
//!
//! Producers call [`ActionBus::publish`] from any thread. The bus keeps the
//! sending half of an unbounded tokio channel; the receiving half belongs to
//! the single consumer that reduces actions.
//!
//! When the consumer is gone the channel is closed and a send fails. The bus
//! then opens a fresh channel, hands its receiver to the connector (which
//! attaches a new consumer) and retries that one action exactly once. Other
//! actions that were still queued on the dead channel are lost.

use crate::error::StoreError;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// How an action reached the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sent on the existing channel.
    Enqueued,
    /// The channel had closed; sent on a freshly opened one.
    Recovered,
}

/// Attaches a consumer to a freshly opened channel.
pub type Connector<A> =
    Box<dyn Fn(mpsc::UnboundedReceiver<A>) -> Result<(), StoreError> + Send + Sync>;

pub struct ActionBus<A> {
    sender: Mutex<mpsc::UnboundedSender<A>>,
    connector: Connector<A>,
    recover: bool,
}

impl<A: Send + 'static> ActionBus<A> {
    /// Create a bus around an already connected sender.
    pub fn new(sender: mpsc::UnboundedSender<A>, connector: Connector<A>) -> Self {
        Self {
            sender: Mutex::new(sender),
            connector,
            recover: true,
        }
    }

    /// Open a channel, connect its receiver and return the bus feeding it.
    pub fn connect(connector: Connector<A>) -> Result<Self, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        connector(rx)?;
        Ok(Self::new(tx, connector))
    }

    /// Enable or disable reopening a closed channel.
    pub fn with_recovery(mut self, recover: bool) -> Self {
        self.recover = recover;
        self
    }

    /// Enqueue one action.
    ///
    /// Safe to call concurrently; the order of successful publishes is the
    /// order in which the consumer sees the actions.
    pub fn publish(&self, action: A) -> Result<Delivery, StoreError> {
        let mut sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());

        let action = match sender.send(action) {
            Ok(()) => return Ok(Delivery::Enqueued),
            Err(mpsc::error::SendError(action)) => action,
        };

        if !self.recover {
            log::error!("Action channel closed and recovery is disabled");
            return Err(StoreError::BusClosed);
        }

        log::warn!("Action channel closed, reopening and retrying once");
        let (tx, rx) = mpsc::unbounded_channel();
        if let Err(e) = (self.connector)(rx) {
            log::error!("Failed to reconnect action channel: {}", e);
            return Err(e);
        }
        *sender = tx;

        match sender.send(action) {
            Ok(()) => {
                log::debug!("Action delivered on reopened channel");
                Ok(Delivery::Recovered)
            }
            Err(_) => {
                log::error!("Reopened action channel closed before retry");
                Err(StoreError::BusClosed)
            }
        }
    }

    /// Whether the current channel still has a consumer.
    pub fn is_open(&self) -> bool {
        !self
            .sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_closed()
    }
}
