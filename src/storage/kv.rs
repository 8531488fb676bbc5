use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Browsers allow roughly 5 MiB of local storage per origin.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable, origin-scoped string storage (the `localStorage` contract).
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Bytes used by all entries, counting keys and values.
fn used_bytes(entries: &BTreeMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

/// Quota check for replacing `key` with `value`.
fn check_quota(
    entries: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: usize,
) -> Result<(), StorageError> {
    let current = entries.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
    let needed = used_bytes(entries) - current + key.len() + value.len();
    if needed > quota {
        return Err(StorageError::QuotaExceeded { needed, quota });
    }
    Ok(())
}

// ============================================================================
// In-memory storage
// ============================================================================

#[derive(Debug, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota: usize) -> Self {
        MemoryStorage {
            entries: BTreeMap::new(),
            quota,
        }
    }

    pub fn used_bytes(&self) -> usize {
        used_bytes(&self.entries)
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        check_quota(&self.entries, key, &value, self.quota)?;
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// File-backed storage
// ============================================================================

/// Storage persisted as one JSON object of string values.
///
/// The whole file is rewritten on every `set`/`remove`.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    quota: usize,
}

impl FileStorage {
    /// Open (or lazily create) the storage file. A corrupt file is treated
    /// as empty and will be overwritten by the next write.
    pub fn open(path: impl AsRef<Path>, quota: usize) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ignoring corrupt storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!("Opened storage {} ({} keys)", path.display(), entries.len());
        Ok(FileStorage {
            path,
            entries,
            quota,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        check_quota(&self.entries, key, &value, self.quota)?;
        let previous = self.entries.insert(key.to_string(), value);

        if let Err(e) = self.flush() {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let Some(old) = self.entries.remove(key) else {
            return Ok(());
        };

        if let Err(e) = self.flush() {
            self.entries.insert(key.to_string(), old);
            return Err(e);
        }
        Ok(())
    }
}
