use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::editor::addressor::ElementKey;

/// One editor action, written as a JSONL line.
#[derive(Debug, Serialize)]
pub struct EditEvent {
    pub timestamp_ms: u128,

    /// `enter`, `exit`, `select`, `apply`, `commit_text`, `cancel_text`,
    /// `save`, `reset`
    pub kind: String,

    pub key: Option<String>,

    /// Style pairs written by an apply
    pub changes: Vec<(String, String)>,

    pub detail: Option<String>,
}

impl EditEvent {
    pub fn now(kind: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            kind: kind.to_string(),
            key: None,
            changes: vec![],
            detail: None,
        }
    }

    pub fn with_key(mut self, key: &ElementKey) -> Self {
        self.key = Some(key.to_string());
        self
    }

    pub fn with_changes(mut self, changes: &[(String, String)]) -> Self {
        self.changes = changes.to_vec();
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
