//! File-per-key backend.

use super::PersistenceBackend;
use crate::error::{Result, StoreError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Magic bytes for blob files.
const BLOB_MAGIC: &[u8; 4] = b"SPB\0";

/// Current blob format version.
const BLOB_VERSION: u8 = 1;

/// Header: magic + version + u64 payload length.
const HEADER_LEN: usize = 4 + 1 + 8;

/// Stores each key as `<dir>/<key>.bin`.
///
/// File layout:
/// ```text
/// [magic: 4][version: 1][len: u64 LE][payload: len][crc32: u32 LE]
/// ```
///
/// Writes go to a temp file that is renamed over the target, with an
/// advisory lock held around the swap, so readers never see a torn file.
/// Writers are not otherwise coordinated; the last one to rename wins.
pub struct FileBackend {
    /// Base directory.
    path: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) a backend rooted at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full path of the file holding `key`.
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.path.join(format!("{}.bin", key)))
    }

    fn lock_file(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.path.join("LOCK"))?;
        Ok(file)
    }
}

impl PersistenceBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blob_path = self.key_path(key)?;

        let lock = self.lock_file()?;
        lock.lock_shared()?;

        if !blob_path.exists() {
            return Ok(None);
        }

        let mut raw = Vec::new();
        File::open(&blob_path)?.read_to_end(&mut raw)?;
        drop(lock);

        let payload = decode_frame(&raw)?;
        debug!(key, bytes = payload.len(), "read blob");
        Ok(Some(payload))
    }

    fn set(&self, key: &str, blob: &[u8]) -> Result<()> {
        let blob_path = self.key_path(key)?;
        let tmp_path = self.path.join(format!("{}.tmp", key));

        let lock = self.lock_file()?;
        lock.lock_exclusive()?;

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&encode_frame(blob))?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &blob_path)?;
        drop(lock);

        debug!(key, bytes = blob.len(), "wrote blob");
        Ok(())
    }
}

/// Keys become file names, so keep them to a safe charset.
fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidFormat(format!("Invalid storage key: {:?}", key)))
    }
}

fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + 4);
    out.extend_from_slice(BLOB_MAGIC);
    out.push(BLOB_VERSION);
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out
}

fn decode_frame(raw: &[u8]) -> Result<Vec<u8>> {
    if raw.len() < HEADER_LEN + 4 {
        return Err(StoreError::Corruption(format!(
            "Blob file too short ({} bytes)",
            raw.len()
        )));
    }

    if &raw[0..4] != BLOB_MAGIC {
        return Err(StoreError::InvalidFormat("Invalid blob magic".into()));
    }

    if raw[4] != BLOB_VERSION {
        return Err(StoreError::InvalidFormat(format!(
            "Unsupported blob version: {}",
            raw[4]
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&raw[5..HEADER_LEN]);
    let declared = u64::from_le_bytes(len_bytes);
    // The short-file check above keeps this from underflowing.
    let held = raw.len() - HEADER_LEN - 4;

    let len = match usize::try_from(declared) {
        Ok(len) if len == held => len,
        _ => {
            return Err(StoreError::Corruption(format!(
                "Blob length mismatch: header says {}, file holds {}",
                declared, held
            )))
        }
    };

    let payload = &raw[HEADER_LEN..HEADER_LEN + len];

    let mut checksum_bytes = [0u8; 4];
    checksum_bytes.copy_from_slice(&raw[HEADER_LEN + len..]);
    let stored_checksum = u32::from_le_bytes(checksum_bytes);
    let computed_checksum = crc32fast::hash(payload);

    if stored_checksum != computed_checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: stored_checksum,
            got: computed_checksum,
        });
    }

    Ok(payload.to_vec())
}
