//! Change notifier for broadcasting store events.

use crossbeam_channel::{bounded, Sender};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::types::{
    Change, DropReason, ListenerConfig, ListenerHandle, ListenerId, StoreEvent,
};

/// Internal listener state.
struct Listener {
    sender: Sender<StoreEvent>,
}

impl Listener {
    /// Try to send an event. Returns false if the buffer is full or the
    /// receiver is gone (listener will be dropped).
    fn try_send(&self, event: StoreEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(crossbeam_channel::TrySendError::Full(_)) => false,
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Manages listeners and broadcasts change events.
pub struct ChangeNotifier {
    /// Active listeners by ID.
    listeners: RwLock<HashMap<ListenerId, Listener>>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
    /// Last revision handed out.
    revision: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            revision: AtomicU64::new(0),
        }
    }

    /// Register a listener. It only sees changes made after this call.
    pub fn subscribe(&self, config: ListenerConfig) -> ListenerHandle {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));

        self.listeners.write().insert(id, Listener { sender });

        ListenerHandle { id, receiver }
    }

    /// Unsubscribe and clean up.
    pub fn unsubscribe(&self, id: ListenerId) {
        let mut listeners = self.listeners.write();
        if let Some(listener) = listeners.remove(&id) {
            let _ = listener.sender.try_send(StoreEvent::Dropped {
                reason: DropReason::Unsubscribed,
            });
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Last revision emitted (0 before the first write).
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Emit a `Changed` event for a completed write and return its revision.
    pub fn notify(&self, change: Change, len: usize) -> u64 {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        self.broadcast(StoreEvent::Changed {
            revision,
            change,
            len,
        });
        revision
    }

    /// Drops listeners that fail to receive.
    fn broadcast(&self, event: StoreEvent) {
        let mut to_remove = Vec::new();

        {
            let listeners = self.listeners.read();
            for (id, listener) in listeners.iter() {
                if !listener.try_send(event.clone()) {
                    to_remove.push(*id);
                }
            }
        }

        if !to_remove.is_empty() {
            let mut listeners = self.listeners.write();
            for id in to_remove {
                if let Some(listener) = listeners.remove(&id) {
                    debug!(listener = id.0, "dropping slow listener");
                    // Buffer is probably full; this is best effort.
                    let _ = listener.sender.try_send(StoreEvent::Dropped {
                        reason: DropReason::BufferOverflow,
                    });
                }
            }
        }
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}
