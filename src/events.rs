//! Change and notification events.
//!
//! Views never share a catalog reference. They subscribe to an [`EventBus`]
//! and every subscriber receives its own clone of each event.

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::catalog::Catalog;

pub const DEFAULT_NOTIFICATION_MS: u64 = 5000;
pub const DEFAULT_BUS_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub duration_ms: u64,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            duration_ms: DEFAULT_NOTIFICATION_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LibraryEvent {
    /// "library data updated": the catalog every view should now show.
    DataUpdated { catalog: Catalog, timestamp_ms: i64 },
    ShowNotification(Notification),
}

/// Process-wide publish/subscribe channel for [`LibraryEvent`]s.
///
/// Publishing never blocks and never fails: an event sent while nobody is
/// subscribed is dropped.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LibraryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receives every event published after this call.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn publish(&self, event: LibraryEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event published with no subscribers");
        }
    }

    pub fn data_updated(&self, catalog: Catalog, timestamp_ms: i64) {
        self.publish(LibraryEvent::DataUpdated { catalog, timestamp_ms });
    }

    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.publish(LibraryEvent::ShowNotification(Notification::new(message, severity)));
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<LibraryEvent>,
}

impl Subscription {
    /// Next pending event, without waiting. Events lost to lag are skipped.
    pub fn try_next(&mut self) -> Option<LibraryEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!("Subscriber lagged, {skipped} event(s) dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<LibraryEvent> {
        std::iter::from_fn(|| self.try_next()).collect()
    }
}
