use thiserror::Error;

use crate::page::selector::SelectorError;
use crate::storage::kv::StorageError;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("could not persist overrides: {0}")]
    Storage(#[from] StorageError),

    #[error("could not serialize overrides: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("no element matches '{0}'")]
    NoSuchElement(String),
}
