use tracing::{info, warn};

use crate::{
    catalog::data_manager::fetch_snapshot,
    catalog::product::Product,
    catalog::store::{DocumentStore, HttpStore},
    cli::config::AppConfig,
    site::app::{Site, SiteOptions},
    storage::kv::FileStorage,
    trace::logger::TraceLogger,
};

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod editor;
pub mod page;
pub mod report;
pub mod script;
pub mod site;
pub mod storage;
pub mod trace;

/// Load the catalog and the override storage named by `config` and build
/// the site with overrides applied.
///
/// A catalog that cannot be loaded still yields a site; the gallery then
/// shows the load error message.
pub fn open_site(config: &AppConfig) -> Result<Site<FileStorage>, Box<dyn std::error::Error>> {
    let storage = FileStorage::open(&config.storage.path, config.storage.quota_bytes)?;
    let products = load_catalog(config);

    let options = SiteOptions {
        max_cards: config.catalog.max_cards,
        persist: config.editor.persist,
        key_scheme: config.editor.key_scheme,
    };

    let site = Site::new(config.site.clone(), products, storage, options);
    Ok(match &config.trace.path {
        Some(path) => site.with_tracer(TraceLogger::new(path)),
        None => site,
    })
}

/// Trainer records for `config`: the remote collection when an endpoint is
/// configured, otherwise the snapshot source. An unreachable remote falls
/// back to the snapshot; a failed snapshot gives an empty catalog.
pub fn load_catalog(config: &AppConfig) -> Vec<Product> {
    if let Some(endpoint) = &config.remote.endpoint {
        let mut store = HttpStore::new(endpoint, &config.remote.collection);
        match store.load_all() {
            Ok(products) => {
                info!("Loaded {} trainers from {}", products.len(), endpoint);
                return products;
            }
            Err(e) => warn!("Remote catalog at {} unavailable, using snapshot: {}", endpoint, e),
        }
    }

    fetch_snapshot(&config.catalog.source).unwrap_or_else(|e| {
        warn!("Failed to load catalog from {}: {}", config.catalog.source, e);
        vec![]
    })
}
