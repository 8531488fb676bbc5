use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::product::Product;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data format")]
    InvalidFormat,
}

/// Result of validating one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub id: String,
    pub problems: Vec<String>,
}

/// Holds the current catalog snapshot and answers lookups against it.
#[derive(Debug, Clone, Default)]
pub struct DataManager {
    products: Vec<Product>,
}

impl DataManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<Product>) -> Self {
        let manager = DataManager { products };
        manager.warn_invalid();
        manager
    }

    /// Load `{ "products": [...] }` from a file path or an `http(s)://` URL.
    pub fn load_snapshot(&mut self, source: &str) -> Result<&[Product], CatalogError> {
        self.products = fetch_snapshot(source)?;
        self.warn_invalid();
        Ok(&self.products)
    }

    /// Replace the snapshot wholesale (remote push updates).
    pub fn replace(&mut self, products: Vec<Product>) {
        debug!("Catalog replaced ({} records)", products.len());
        self.products = products;
        self.warn_invalid();
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product_by_id(&self, id: &str) -> Option<&Product> {
        if id.is_empty() {
            return None;
        }
        self.products.iter().find(|p| p.id == id)
    }

    /// Records fit for display: an id and a title.
    pub fn valid_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| is_displayable(p)).collect()
    }

    /// Reported once per snapshot, not on every render.
    fn warn_invalid(&self) {
        for p in self.products.iter().filter(|p| !is_displayable(p)) {
            warn!("Skipping product without id or title: {:?}", p.id);
        }
    }

    /// Displayable records matching a category filter; `all` matches every
    /// record.
    pub fn filter(&self, filter: &str) -> Vec<&Product> {
        self.valid_products()
            .into_iter()
            .filter(|p| filter == "all" || p.in_category(filter))
            .collect()
    }

    /// Insert or replace by id.
    pub fn upsert(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Product> {
        let index = self.products.iter().position(|p| p.id == id)?;
        Some(self.products.remove(index))
    }

    /// Next `prod-NNN` id after the highest numeric one in use.
    pub fn generate_trainer_id(&self) -> String {
        let max = self
            .products
            .iter()
            .filter_map(|p| p.id.strip_prefix("prod-"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("prod-{:03}", max + 1)
    }

    /// Template for a new trainer record.
    pub fn empty_trainer(&self) -> Product {
        Product {
            id: self.generate_trainer_id(),
            category: Some("Fitness".to_string()),
            experience: Some("1 year experience".to_string()),
            price: Some(2000.0),
            currency: Some("RUB".to_string()),
            image: "https://via.placeholder.com/400x600".to_string(),
            image_alt: Some(String::new()),
            detailed_description: Some(String::new()),
            education: Some(String::new()),
            ..Default::default()
        }
    }

    /// Every record failing [`validate_product`].
    pub fn validate_all(&self) -> Vec<ValidationIssue> {
        self.products
            .iter()
            .filter_map(|p| {
                let problems = validate_product(p);
                (!problems.is_empty()).then(|| ValidationIssue {
                    id: p.id.clone(),
                    problems,
                })
            })
            .collect()
    }
}

#[derive(Deserialize)]
struct Snapshot {
    products: Option<Vec<Value>>,
}

/// Read and parse a snapshot from a file path or an `http(s)://` URL.
pub fn fetch_snapshot(source: &str) -> Result<Vec<Product>, CatalogError> {
    let body = if source.starts_with("http://") || source.starts_with("https://") {
        let client = reqwest::blocking::Client::new();
        client.get(source).send()?.error_for_status()?.text()?
    } else {
        fs::read_to_string(Path::new(source)).map_err(|e| CatalogError::Read {
            path: source.to_string(),
            source: e,
        })?
    };

    let products = parse_snapshot(&body)?;
    info!("Loaded {} trainers from {}", products.len(), source);
    Ok(products)
}

fn is_displayable(product: &Product) -> bool {
    !product.id.is_empty() && !product.title.is_empty()
}

/// Parse a snapshot body. Records that do not deserialize are skipped with a
/// warning; a body without a `products` array is rejected.
pub fn parse_snapshot(body: &str) -> Result<Vec<Product>, CatalogError> {
    let snapshot: Snapshot = serde_json::from_str(body)?;
    let records = snapshot.products.ok_or(CatalogError::InvalidFormat)?;

    let mut products = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Product>(record) {
            Ok(p) => products.push(p),
            Err(e) => warn!("Skipping catalog record {}: {}", i, e),
        }
    }
    Ok(products)
}

/// Problems with a record: `id`, `title`, `description` and `image` must be
/// non-blank and `price` a non-negative number.
pub fn validate_product(product: &Product) -> Vec<String> {
    let mut problems = vec![];

    for (field, value) in [
        ("id", &product.id),
        ("title", &product.title),
        ("description", &product.description),
        ("image", &product.image),
    ] {
        if value.trim().is_empty() {
            problems.push(format!("{} is missing", field));
        }
    }

    match product.price {
        None => problems.push("price is missing".to_string()),
        Some(p) if p < 0.0 || !p.is_finite() => {
            problems.push(format!("price {} is negative", p));
        }
        Some(_) => {}
    }

    problems
}
