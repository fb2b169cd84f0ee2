//! Change notification types.

use crate::types::SubscriptionId;
use serde::{Deserialize, Serialize};

/// Configuration for a listener.
#[derive(Clone, Debug)]
pub struct ListenerConfig {
    /// Max buffered events before the listener is dropped.
    /// Default: 1000
    pub buffer_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { buffer_size: 1000 }
    }
}

/// What a mutating operation did to the collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Added {
        id: SubscriptionId,
    },
    /// `matched` is false when no record had the id; the write still happened.
    Updated {
        id: SubscriptionId,
        matched: bool,
    },
    Deleted {
        id: SubscriptionId,
        matched: bool,
    },
    Reordered {
        count: usize,
    },
    /// `is_active` is the new flag, or None when no record matched.
    ActiveToggled {
        id: SubscriptionId,
        is_active: Option<bool>,
    },
    Replaced {
        count: usize,
    },
    Appended {
        count: usize,
    },
}

/// Events emitted to listeners.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// The persisted collection changed. Listeners should re-read `list()`.
    Changed {
        /// Monotonic per-store write counter, starting at 1.
        revision: u64,
        change: Change,
        /// Collection length after the write.
        len: usize,
    },

    /// Listener was dropped.
    Dropped { reason: DropReason },
}

/// Why a listener was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Explicitly unsubscribed.
    Unsubscribed,
}

/// Unique identifier for a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Handle to receive change events.
pub struct ListenerHandle {
    pub id: ListenerId,
    pub receiver: crossbeam_channel::Receiver<StoreEvent>,
}

impl ListenerHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StoreEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StoreEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StoreEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<StoreEvent> {
        self.receiver.try_iter().collect()
    }
}
