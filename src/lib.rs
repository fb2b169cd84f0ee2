//! # Subplanner
//!
//! A local store for recurring paid subscriptions, with CSV backup/restore
//! and monthly/yearly cost totals.
//!
//! ## Core Concepts
//!
//! - **Store**: the canonical collection, persisted as one JSON blob under a
//!   single key and re-read on every operation
//! - **Backends**: whole-blob key-value persistence (in-memory or on disk)
//! - **Events**: one change notification per successful write
//! - **Codec**: CSV interchange that skips bad rows and reports them by line
//! - **Templates**: read-only presets for quick-add, with source fallback
//!
//! ## Example
//!
//! ```ignore
//! use subplanner::{BillingCycle, BillingDate, ImportMode, NewSubscription, StoreConfig};
//!
//! let store = StoreConfig::default().open_file_store()?;
//! let events = store.subscribe_default();
//!
//! let netflix = store.add(NewSubscription::new(
//!     "Netflix",
//!     1490.0,
//!     BillingCycle::Monthly,
//!     BillingDate::parse("2024-01-01")?,
//! ))?;
//! store.toggle_active(&netflix.id)?;
//!
//! let backup = store.export_csv()?;
//! let report = store.import_csv(&backup, ImportMode::Replace)?;
//! println!("{} imported, {} errors", report.imported, report.errors.len());
//! ```

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod store;
pub mod summary;
pub mod templates;
pub mod transfer;
pub mod types;

// Re-exports
pub use backend::{FileBackend, MemoryBackend, PersistenceBackend};
pub use codec::{decode, encode, DecodeError, DecodeOutcome, RowErrorKind};
pub use config::{StoreConfig, LEGACY_STORAGE_KEY, STORAGE_KEY};
pub use error::{Result, StoreError};
pub use events::{Change, DropReason, ListenerConfig, ListenerHandle, ListenerId, StoreEvent};
pub use store::SubscriptionStore;
pub use summary::Totals;
pub use templates::{Template, TemplateCatalog};
pub use transfer::{export_filename, export_filename_today, ImportMode, ImportReport};
pub use types::*;
