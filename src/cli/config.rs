use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::authenticator::AdminCredential;
use crate::editor::addressor::KeyScheme;
use crate::editor::override_store::PersistPolicy;
use crate::page::render::DEFAULT_MAX_CARDS;
use crate::site::settings::SiteContent;
use crate::storage::kv::DEFAULT_QUOTA_BYTES;

pub const DEFAULT_CONFIG_PATH: &str = "site-editor.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "site-editor",
    version,
    about = "Trainer directory site with a persistent visual editor"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Catalog snapshot: a JSON file path or an http(s) URL
    #[arg(long, global = true)]
    pub catalog: Option<String>,

    /// Storage file holding the editor overrides
    #[arg(long, global = true)]
    pub storage: Option<String>,

    /// Remote trainer collection endpoint (overrides remote.endpoint)
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Path to config file (default: site-editor.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the home page with saved overrides applied
    Render {
        /// Output HTML file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Category filter to render
        #[arg(long)]
        filter: Option<String>,
    },

    /// Run scripted editor sessions from YAML
    Edit {
        /// Path to a script YAML file or a directory of them
        #[arg(long)]
        script: String,

        /// Report file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Inspect or clear saved overrides
    Overrides {
        #[command(subcommand)]
        action: OverridesAction,
    },

    /// Inspect the catalog snapshot
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Poll the remote collection and re-render the page after each change
    Watch {
        /// Output HTML file, rewritten on every update
        #[arg(short, long)]
        output: String,

        /// Seconds between polls
        #[arg(long, default_value_t = 30)]
        interval: u64,

        /// Stop after this many polls (default: run until interrupted)
        #[arg(long)]
        max_polls: Option<usize>,
    },

    /// Manage trainers in the remote collection as a signed-in admin
    Admin {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum OverridesAction {
    /// Print stored overrides as JSON
    Show,

    /// Remove all stored overrides
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// List trainers
    List {
        /// Category filter
        #[arg(long, default_value = "all")]
        filter: String,
    },

    /// Check every record; exits 1 when any is invalid
    Validate,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    /// Create or update a trainer from a JSON record; an empty id gets the
    /// next prod-NNN
    Save { file: String },

    /// Delete a trainer by id
    Delete { id: String },

    /// Revert the newest recorded action
    Undo,

    /// List recorded actions, oldest first
    History,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `site-editor.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub site: SiteContent,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_source")]
    pub source: String,

    #[serde(default = "default_max_cards")]
    pub max_cards: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: default_catalog_source(),
            max_cards: DEFAULT_MAX_CARDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,

    #[serde(default = "default_quota")]
    pub quota_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub persist: PersistPolicy,

    #[serde(default)]
    pub key_scheme: KeyScheme,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub admins: Vec<AdminCredential>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: Option<String>,

    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            collection: default_collection(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceConfig {
    /// JSONL file for editor events; unset disables it
    pub path: Option<String>,
}

// Serde default helpers
fn default_catalog_source() -> String { "data/products.json".to_string() }
fn default_max_cards() -> usize { DEFAULT_MAX_CARDS }
fn default_storage_path() -> String { ".site-editor/storage.json".to_string() }
fn default_quota() -> usize { DEFAULT_QUOTA_BYTES }
fn default_collection() -> String { "trainers".to_string() }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed config {}: {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Apply CLI overrides on top of the file config (CLI > config > defaults).
pub fn merge_cli(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(catalog) = &cli.catalog {
        config.catalog.source = catalog.clone();
    }
    if let Some(storage) = &cli.storage {
        config.storage.path = storage.clone();
    }
    if let Some(remote) = &cli.remote {
        config.remote.endpoint = Some(remote.clone());
    }
    config
}
