//! In-memory backend.

use super::PersistenceBackend;
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-local backend. Clones share the same map, so a clone handed to
/// another component sees (and can make) the same writes.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys written.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, blob: &[u8]) -> Result<()> {
        self.entries.write().insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let backend = MemoryBackend::new();
        assert!(backend.get("nothing").unwrap().is_none());
        assert!(backend.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let backend = MemoryBackend::new();
        backend.set("k", b"one").unwrap();
        backend.set("k", b"two").unwrap();
        assert_eq!(backend.get("k").unwrap().unwrap(), b"two");
        assert_eq!(backend.len(), 1);
    }

    #[test]
    fn test_clones_share_entries() {
        let backend = MemoryBackend::new();
        let other = backend.clone();
        other.set("k", b"shared").unwrap();
        assert_eq!(backend.get("k").unwrap().unwrap(), b"shared");
    }
}
