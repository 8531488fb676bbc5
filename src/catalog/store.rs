use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::product::Product;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store is unreachable")]
    Offline,

    #[error("document store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("document store returned malformed data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record has no id")]
    MissingId,
}

pub type Subscriber = Box<dyn FnMut(&[Product])>;

/// Remote trainer collection: load-all, upsert, delete, change feed.
pub trait DocumentStore {
    fn load_all(&mut self) -> Result<Vec<Product>, StoreError>;
    fn save(&mut self, product: &Product) -> Result<(), StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;

    /// Called with the full collection after every change.
    fn subscribe(&mut self, callback: Subscriber);
}

// ============================================================================
// In-memory store
// ============================================================================

/// Collection kept in memory; notifies subscribers synchronously.
#[derive(Default)]
pub struct MemoryStore {
    records: BTreeMap<String, Product>,
    subscribers: Vec<Subscriber>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        MemoryStore {
            records: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
            ..Default::default()
        }
    }

    /// Make every call fail with [`StoreError::Offline`].
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline {
            return Err(StoreError::Offline);
        }
        Ok(())
    }

    fn notify(&mut self) {
        let snapshot: Vec<Product> = self.records.values().cloned().collect();
        for callback in &mut self.subscribers {
            callback(&snapshot);
        }
    }
}

impl DocumentStore for MemoryStore {
    fn load_all(&mut self) -> Result<Vec<Product>, StoreError> {
        self.check_online()?;
        Ok(self.records.values().cloned().collect())
    }

    fn save(&mut self, product: &Product) -> Result<(), StoreError> {
        self.check_online()?;
        if product.id.is_empty() {
            return Err(StoreError::MissingId);
        }
        self.records.insert(product.id.clone(), product.clone());
        self.notify();
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        if self.records.remove(id).is_some() {
            self.notify();
        }
        Ok(())
    }

    fn subscribe(&mut self, callback: Subscriber) {
        self.subscribers.push(callback);
    }
}

// ============================================================================
// HTTP store
// ============================================================================

/// JSON-over-HTTP collection:
/// `GET {endpoint}/{collection}`, `PUT`/`DELETE {endpoint}/{collection}/{id}`.
///
/// There is no server push; [`HttpStore::poll`] reloads and notifies.
pub struct HttpStore {
    endpoint: String,
    collection: String,
    client: reqwest::blocking::Client,
    subscribers: Vec<Subscriber>,
}

impl HttpStore {
    pub fn new(endpoint: &str, collection: &str) -> Self {
        HttpStore {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            client: reqwest::blocking::Client::new(),
            subscribers: vec![],
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.collection)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.collection_url(), id)
    }

    /// Reload the collection and hand it to every subscriber.
    pub fn poll(&mut self) -> Result<usize, StoreError> {
        let products = self.load_all()?;
        for callback in &mut self.subscribers {
            callback(&products);
        }
        Ok(products.len())
    }

    fn notify_after_change(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        if let Err(e) = self.poll() {
            warn!("Could not refresh subscribers: {}", e);
        }
    }
}

impl DocumentStore for HttpStore {
    fn load_all(&mut self) -> Result<Vec<Product>, StoreError> {
        let url = self.collection_url();
        debug!("GET {}", url);
        let products = self
            .client
            .get(&url)
            .send()?
            .error_for_status()?
            .json::<Vec<Product>>()?;
        Ok(products)
    }

    fn save(&mut self, product: &Product) -> Result<(), StoreError> {
        if product.id.is_empty() {
            return Err(StoreError::MissingId);
        }
        let url = self.record_url(&product.id);
        debug!("PUT {}", url);
        self.client.put(&url).json(product).send()?.error_for_status()?;
        self.notify_after_change();
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let url = self.record_url(id);
        debug!("DELETE {}", url);
        self.client.delete(&url).send()?.error_for_status()?;
        self.notify_after_change();
        Ok(())
    }

    fn subscribe(&mut self, callback: Subscriber) {
        self.subscribers.push(callback);
    }
}
