//! Key-value blob persistence.
//!
//! The store keeps its whole collection under a single key. Backends only
//! need whole-blob `get` and `set`; there is no partial update and no
//! coordination between processes (last writer wins).

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::Result;

/// Whole-blob key-value persistence used by the store.
pub trait PersistenceBackend: Send + Sync {
    /// Read the blob under `key`, or None if nothing was ever written.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the blob under `key`.
    fn set(&self, key: &str, blob: &[u8]) -> Result<()>;
}

impl<B: PersistenceBackend + ?Sized> PersistenceBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, blob: &[u8]) -> Result<()> {
        (**self).set(key, blob)
    }
}
