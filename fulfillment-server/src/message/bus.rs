//! Broadcast-channel notification bus
//!
//! ```text
//! OrderStore ─┐
//! Router     ─┤
//! Kitchen    ─┼─ publish() ──▶ broadcast::Sender<BusEvent> ──▶ subscribers
//! Billing    ─┘                                              (kitchen boards,
//!                                                             serving boards,
//!                                                             billing screens)
//! ```
//!
//! Publishing never fails from the caller's point of view: a send error
//! (no receivers) or a lagged receiver is logged and dropped.

use shared::message::{BusEvent, TopicFilter};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Bus configuration
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Capacity of the broadcast channel
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Notification bus for state-change events
#[derive(Debug, Clone)]
pub struct NotificationBus {
    tx: broadcast::Sender<BusEvent>,
    shutdown_token: CancellationToken,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::from_config(BusConfig::default())
    }

    pub fn from_config(config: BusConfig) -> Self {
        let (tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            tx,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Publish an event to all subscribers (fire-and-forget)
    ///
    /// The underlying state change has already committed when this is
    /// called; delivery failure must never surface as an error.
    pub fn publish(&self, event: BusEvent) {
        let topic = event.topic;
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(topic = %topic, receivers, "Event published");
            }
            Err(_) => {
                // No receivers connected; boards will re-read on connect
                tracing::debug!(topic = %topic, "Event dropped, no subscribers");
            }
        }
    }

    /// Subscribe to every event
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }

    /// Subscribe with a topic filter (per-station boards, billing screens)
    pub fn subscribe_topic(&self, filter: TopicFilter) -> TopicSubscription {
        TopicSubscription {
            rx: self.tx.subscribe(),
            filter,
        }
    }

    /// Token for consumers to observe shutdown
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// Cancel all consumer loops
    pub fn shutdown(&self) {
        tracing::info!("Shutting down notification bus");
        self.shutdown_token.cancel();
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Filtered subscription handle
///
/// A lagged receiver means events were missed; per the bus contract the
/// consumer falls back to a full re-read, so `recv` surfaces the lag by
/// skipping ahead and logging.
pub struct TopicSubscription {
    rx: broadcast::Receiver<BusEvent>,
    filter: TopicFilter,
}

impl TopicSubscription {
    /// Receive the next event matching the filter
    ///
    /// Returns `None` when the bus is closed.
    pub async fn recv(&mut self) -> Option<BusEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event.topic) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Subscriber lagged, re-read state to resync");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking drain of currently buffered matching events
    pub fn try_drain(&mut self) -> Vec<BusEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event.topic) {
                        events.push(event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Subscriber lagged, re-read state to resync");
                }
                Err(_) => break,
            }
        }
        events
    }
}
