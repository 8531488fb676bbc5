use thiserror::Error;
use tracing::info;

use crate::auth::authenticator::Authenticator;
use crate::catalog::data_manager::validate_product;
use crate::catalog::history::{UndoAction, UndoHistory};
use crate::catalog::product::Product;
use crate::catalog::store::{DocumentStore, StoreError};
use crate::storage::kv::KeyValueStorage;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("sign in to manage trainers")]
    NotAuthenticated,

    #[error("invalid trainer record: {}", .0.join(", "))]
    Invalid(Vec<String>),

    #[error("no trainer with id {0}")]
    NotFound(String),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Auth-gated trainer management with a short undo history.
///
/// The history lives in the same key-value storage as the editor overrides,
/// so callers pass that storage in.
pub struct AdminService<D: DocumentStore, A: Authenticator> {
    store: D,
    auth: A,
    history: UndoHistory,
}

impl<D: DocumentStore, A: Authenticator> AdminService<D, A> {
    pub fn new<S: KeyValueStorage>(store: D, auth: A, storage: &mut S) -> Self {
        AdminService {
            store,
            auth,
            history: UndoHistory::load(storage),
        }
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut A {
        &mut self.auth
    }

    pub fn store_mut(&mut self) -> &mut D {
        &mut self.store
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    fn require_auth(&self) -> Result<(), AdminError> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(AdminError::NotAuthenticated)
        }
    }

    /// Create or update a trainer. Returns true when the record was new.
    pub fn save_trainer<S: KeyValueStorage>(
        &mut self,
        storage: &mut S,
        product: Product,
    ) -> Result<bool, AdminError> {
        self.require_auth()?;

        let problems = validate_product(&product);
        if !problems.is_empty() {
            return Err(AdminError::Invalid(problems));
        }

        let existing = self
            .store
            .load_all()?
            .into_iter()
            .find(|p| p.id == product.id);

        self.store.save(&product)?;

        let is_new = existing.is_none();
        let action = match existing {
            Some(old_data) => UndoAction::Update {
                trainer_id: product.id.clone(),
                old_data,
                new_data: product.clone(),
            },
            None => UndoAction::Create {
                trainer_id: product.id.clone(),
                new_data: product.clone(),
            },
        };
        self.history.push(storage, action);

        info!("Saved trainer {} ({})", product.id, if is_new { "new" } else { "updated" });
        Ok(is_new)
    }

    pub fn delete_trainer<S: KeyValueStorage>(&mut self, storage: &mut S, id: &str) -> Result<Product, AdminError> {
        self.require_auth()?;

        let old_data = self
            .store
            .load_all()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AdminError::NotFound(id.to_string()))?;

        self.store.delete(id)?;
        self.history.push(
            storage,
            UndoAction::Delete {
                trainer_id: id.to_string(),
                old_data: old_data.clone(),
            },
        );

        info!("Deleted trainer {}", id);
        Ok(old_data)
    }

    /// Revert the newest recorded action against the store.
    pub fn undo_last<S: KeyValueStorage>(&mut self, storage: &mut S) -> Result<UndoAction, AdminError> {
        self.require_auth()?;

        let action = self.history.pop(storage).ok_or(AdminError::NothingToUndo)?;
        match &action {
            UndoAction::Create { trainer_id, .. } => self.store.delete(trainer_id)?,
            UndoAction::Update { old_data, .. } | UndoAction::Delete { old_data, .. } => {
                self.store.save(old_data)?
            }
        }

        info!("Undid action on {}", action.trainer_id());
        Ok(action)
    }
}
