//! Append-only, replayable notification log.
//!
//! Consumers that must not miss an event (the verifier orchestrator)
//! subscribe through [`EventLog::subscribe`], which atomically returns the
//! full history plus a live receiver — replay the snapshot, then drain the
//! channel. A receiver that lags past the channel capacity resubscribes and
//! replays; duplicate delivery at the boundary is expected and consumers
//! deduplicate by deal id.

use std::sync::{Mutex, PoisonError};

use openescrow_types::DealEvent;
use openescrow_types::constants::EVENT_CHANNEL_CAPACITY;
use tokio::sync::broadcast;

/// Durable deal-event log with a live broadcast channel.
#[derive(Debug)]
pub struct EventLog {
    history: Mutex<Vec<DealEvent>>,
    tx: broadcast::Sender<DealEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            history: Mutex::new(Vec::new()),
            tx,
        }
    }

    /// Append an event to the history and fan it out to live subscribers.
    pub fn append(&self, event: DealEvent) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push(event.clone());
        // No live subscribers is fine; the history is the source of truth.
        let _ = self.tx.send(event);
    }

    /// Atomic snapshot + live receiver, with no gap between them.
    #[must_use]
    pub fn subscribe(&self) -> (Vec<DealEvent>, broadcast::Receiver<DealEvent>) {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        let rx = self.tx.subscribe();
        (history.clone(), rx)
    }

    /// Full history so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DealEvent> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
