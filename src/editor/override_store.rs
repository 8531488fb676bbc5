use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::history::UNDO_HISTORY_KEY;
use crate::editor::addressor::ElementKey;
use crate::editor::error::EditorError;
use crate::storage::kv::{KeyValueStorage, StorageError};

pub const STYLE_STORAGE_KEY: &str = "visualEditorStyles";
pub const TEXT_STORAGE_KEY: &str = "visualEditorText";

/// camelCase style property → literal CSS value
pub type StyleMap = BTreeMap<String, String>;

/// The persisted editor state: sparse per-element style pairs and full text
/// replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub styles: BTreeMap<ElementKey, StyleMap>,
    #[serde(default)]
    pub texts: BTreeMap<ElementKey, String>,
}

impl Overrides {
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty() && self.texts.is_empty()
    }

    /// Every key with at least one override.
    pub fn keys(&self) -> Vec<&ElementKey> {
        let mut keys: Vec<&ElementKey> = self.styles.keys().chain(self.texts.keys()).collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// When the store writes through to storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistPolicy {
    /// Only the editor's save command persists.
    #[default]
    ExplicitSave,

    /// Every recorded change is persisted immediately.
    EveryChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Persisted,

    /// Storage was full; the undo history was dropped to make room.
    PersistedAfterTrim,
}

// ============================================================================
// Store
// ============================================================================

pub struct OverrideStore<S: KeyValueStorage> {
    storage: S,
    overrides: Overrides,
}

impl<S: KeyValueStorage> OverrideStore<S> {
    pub fn new(storage: S) -> Self {
        OverrideStore {
            storage,
            overrides: Overrides::default(),
        }
    }

    /// Merge persisted overrides into memory. Unsaved in-memory values win
    /// over stored ones for the same key and property. A malformed entry is
    /// skipped with a warning.
    pub fn load(&mut self) {
        if let Some(raw) = self.storage.get(STYLE_STORAGE_KEY) {
            match serde_json::from_str::<BTreeMap<ElementKey, StyleMap>>(&raw) {
                Ok(stored) => {
                    for (key, props) in stored {
                        let entry = self.overrides.styles.entry(key).or_default();
                        for (prop, value) in props {
                            entry.entry(prop).or_insert(value);
                        }
                    }
                }
                Err(e) => warn!("Ignoring malformed {}: {}", STYLE_STORAGE_KEY, e),
            }
        }

        if let Some(raw) = self.storage.get(TEXT_STORAGE_KEY) {
            match serde_json::from_str::<BTreeMap<ElementKey, String>>(&raw) {
                Ok(stored) => {
                    for (key, markup) in stored {
                        self.overrides.texts.entry(key).or_insert(markup);
                    }
                }
                Err(e) => warn!("Ignoring malformed {}: {}", TEXT_STORAGE_KEY, e),
            }
        }

        debug!(
            "Loaded overrides: {} styled, {} texted",
            self.overrides.styles.len(),
            self.overrides.texts.len()
        );
    }

    /// Write both maps to storage. On a quota error the undo history is
    /// dropped and the write retried once.
    pub fn save(&mut self) -> Result<SaveOutcome, EditorError> {
        let styles = serde_json::to_string(&self.overrides.styles)?;
        let texts = serde_json::to_string(&self.overrides.texts)?;

        match self.write(&styles, &texts) {
            Ok(()) => Ok(SaveOutcome::Persisted),
            Err(StorageError::QuotaExceeded { needed, quota }) => {
                warn!(
                    "Storage quota exceeded ({} of {} bytes), dropping {}",
                    needed, quota, UNDO_HISTORY_KEY
                );
                self.storage.remove(UNDO_HISTORY_KEY)?;
                self.write(&styles, &texts)?;
                info!("Overrides saved after trimming {}", UNDO_HISTORY_KEY);
                Ok(SaveOutcome::PersistedAfterTrim)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Both keys change together or neither does: a failed text write puts
    /// the previous styles value back.
    fn write(&mut self, styles: &str, texts: &str) -> Result<(), StorageError> {
        let previous = self.storage.get(STYLE_STORAGE_KEY);
        self.storage.set(STYLE_STORAGE_KEY, styles.to_string())?;

        if let Err(e) = self.storage.set(TEXT_STORAGE_KEY, texts.to_string()) {
            let restored = match previous {
                Some(old) => self.storage.set(STYLE_STORAGE_KEY, old),
                None => self.storage.remove(STYLE_STORAGE_KEY),
            };
            if let Err(restore) = restored {
                warn!("Could not restore {}: {}", STYLE_STORAGE_KEY, restore);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Clear both maps and both storage keys.
    pub fn reset(&mut self) -> Result<(), EditorError> {
        self.overrides = Overrides::default();
        self.storage.remove(STYLE_STORAGE_KEY)?;
        self.storage.remove(TEXT_STORAGE_KEY)?;
        info!("Overrides reset");
        Ok(())
    }

    pub fn record_style(&mut self, key: &ElementKey, property: &str, value: &str) {
        self.overrides
            .styles
            .entry(key.clone())
            .or_default()
            .insert(property.to_string(), value.to_string());
    }

    pub fn record_text(&mut self, key: &ElementKey, markup: &str) {
        self.overrides.texts.insert(key.clone(), markup.to_string());
    }

    pub fn text(&self, key: &ElementKey) -> Option<&str> {
        self.overrides.texts.get(key).map(String::as_str)
    }

    pub fn styles(&self, key: &ElementKey) -> Option<&StyleMap> {
        self.overrides.styles.get(key)
    }

    pub fn overrides(&self) -> &Overrides {
        &self.overrides
    }

    /// Drop the in-memory maps without touching storage.
    pub fn clear_memory(&mut self) {
        self.overrides = Overrides::default();
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
