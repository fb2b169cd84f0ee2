//! Change notifications for the subscription store.
//!
//! Every successful write emits exactly one [`StoreEvent::Changed`]. Events
//! carry what happened but not the data; listeners pull a fresh snapshot
//! with `SubscriptionStore::list` when they receive one.
//!
//! Listeners have bounded buffers. A listener that falls behind is dropped
//! rather than blocking the writer.
//!
//! # Example
//!
//! ```ignore
//! let handle = store.subscribe(ListenerConfig::default());
//!
//! store.add(input)?;
//!
//! match handle.recv()? {
//!     StoreEvent::Changed { .. } => render(&store.list()?),
//!     StoreEvent::Dropped { .. } => {}
//! }
//! ```

mod manager;
mod types;

pub use manager::ChangeNotifier;
pub use types::{Change, DropReason, ListenerConfig, ListenerHandle, ListenerId, StoreEvent};
