use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::product::Product;
use crate::storage::kv::KeyValueStorage;

pub const UNDO_HISTORY_KEY: &str = "undoHistory";
pub const MAX_UNDO_ENTRIES: usize = 5;

/// A reversible admin action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UndoAction {
    #[serde(rename_all = "camelCase")]
    Create { trainer_id: String, new_data: Product },

    #[serde(rename_all = "camelCase")]
    Update {
        trainer_id: String,
        old_data: Product,
        new_data: Product,
    },

    #[serde(rename_all = "camelCase")]
    Delete { trainer_id: String, old_data: Product },
}

impl UndoAction {
    pub fn trainer_id(&self) -> &str {
        match self {
            UndoAction::Create { trainer_id, .. }
            | UndoAction::Update { trainer_id, .. }
            | UndoAction::Delete { trainer_id, .. } => trainer_id,
        }
    }

    /// Drop inline `data:` images so entries stay small.
    fn stripped(mut self) -> Self {
        match &mut self {
            UndoAction::Create { new_data, .. } => strip_inline_images(new_data),
            UndoAction::Update {
                old_data, new_data, ..
            } => {
                strip_inline_images(old_data);
                strip_inline_images(new_data);
            }
            UndoAction::Delete { old_data, .. } => strip_inline_images(old_data),
        }
        self
    }
}

fn strip_inline_images(product: &mut Product) {
    if product.image.starts_with("data:") {
        product.image.clear();
    }
    product.images.retain(|img| !img.starts_with("data:"));
}

/// The last few admin actions, newest last, mirrored to storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoHistory {
    entries: Vec<UndoAction>,
}

impl UndoHistory {
    /// Read the persisted history; a malformed value is discarded.
    pub fn load<S: KeyValueStorage>(storage: &mut S) -> Self {
        let Some(raw) = storage.get(UNDO_HISTORY_KEY) else {
            return Self::default();
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => UndoHistory { entries },
            Err(e) => {
                warn!("Discarding malformed {}: {}", UNDO_HISTORY_KEY, e);
                let _ = storage.remove(UNDO_HISTORY_KEY);
                Self::default()
            }
        }
    }

    /// Record an action, keeping only the newest entries. When storage is
    /// full the history shrinks to just this action; if even that does not
    /// fit, it stays in memory only.
    pub fn push<S: KeyValueStorage>(&mut self, storage: &mut S, action: UndoAction) {
        let action = action.stripped();
        self.entries.push(action.clone());
        if self.entries.len() > MAX_UNDO_ENTRIES {
            self.entries.remove(0);
        }

        if let Err(e) = self.persist(storage) {
            warn!("Could not save undo history: {}", e);
            let _ = storage.remove(UNDO_HISTORY_KEY);
            self.entries = vec![action];
            if self.persist(storage).is_err() {
                warn!("Undo history disabled due to storage quota");
            }
        }
    }

    /// Take the newest action off the history.
    pub fn pop<S: KeyValueStorage>(&mut self, storage: &mut S) -> Option<UndoAction> {
        let action = self.entries.pop()?;
        if let Err(e) = self.persist(storage) {
            warn!("Could not save undo history: {}", e);
        }
        Some(action)
    }

    fn persist<S: KeyValueStorage>(&self, storage: &mut S) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(&self.entries)?;
        storage.set(UNDO_HISTORY_KEY, json)?;
        Ok(())
    }

    pub fn entries(&self) -> &[UndoAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
