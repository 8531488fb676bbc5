use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::auth::authenticator::{AdminCredential, Authenticator, CredentialAuthenticator};
use crate::catalog::admin::AdminService;
use crate::catalog::data_manager::DataManager;
use crate::catalog::history::UndoAction;
use crate::catalog::product::{Product, format_price};
use crate::catalog::store::{DocumentStore, HttpStore};
use crate::cli::config::{AdminAction, AppConfig};
use crate::editor::override_store::{OverrideStore, STYLE_STORAGE_KEY, TEXT_STORAGE_KEY};
use crate::open_site;
use crate::report::console::format_console_report;
use crate::report::report_model::SuiteReport;
use crate::script::runner::ScriptRunner;
use crate::script::script_model::EditScript;
use crate::storage::kv::{FileStorage, KeyValueStorage};

// ============================================================================
// render subcommand
// ============================================================================

pub fn cmd_render(
    config: &AppConfig,
    output: Option<&str>,
    filter: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut site = open_site(config)?;
    if let Some(filter) = filter {
        site.apply_filter(filter);
    }

    let report = site.last_report();
    info!(
        "Rendered {} cards ({} styled, {} texted, {} stale keys)",
        site.card_count(),
        report.styled,
        report.texted,
        report.stale.len()
    );

    let html = site.to_html();
    match output {
        Some(path) => std::fs::write(path, &html)?,
        None => print!("{}", html),
    }
    Ok(())
}

// ============================================================================
// edit subcommand
// ============================================================================

/// Run edit scripts, each against a freshly loaded site, and return whether
/// all passed. Changes saved by a script persist for the next one.
pub fn cmd_edit(
    config: &AppConfig,
    script_path: &str,
    output: Option<&str>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scripts = load_scripts(script_path)?;

    if scripts.is_empty() {
        eprintln!("No edit scripts found at: {}", script_path);
        return Ok(true);
    }

    info!("Running {} edit scripts", scripts.len());
    let start = Instant::now();

    let mut results = Vec::new();
    for script in &scripts {
        info!("Running: {}", script.name);
        let mut site = open_site(config)?;
        results.push(ScriptRunner::run(script, &mut site));
    }

    let report = SuiteReport::from_results(script_path, results)
        .with_duration(start.elapsed().as_millis());
    let all_passed = report.all_passed();

    let output_content = format_console_report(&report);
    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

/// Load edit scripts from a single YAML file or a directory of YAML files.
pub fn load_scripts(path: &str) -> Result<Vec<EditScript>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        let mut scripts = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let p = entry?.path();
            if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
                let content = std::fs::read_to_string(&p)?;
                let script: EditScript = serde_yaml::from_str(&content)?;
                scripts.push(script);
            }
        }
        // Sort by name for deterministic order
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scripts)
    } else {
        let content = std::fs::read_to_string(path)?;
        let script: EditScript = serde_yaml::from_str(&content)?;
        Ok(vec![script])
    }
}

// ============================================================================
// overrides subcommands
// ============================================================================

pub fn cmd_overrides_show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage = FileStorage::open(&config.storage.path, config.storage.quota_bytes)?;
    let mut store = OverrideStore::new(storage);
    store.load();

    let overrides = store.overrides();
    if overrides.is_empty() {
        eprintln!(
            "No overrides in {} ({} / {})",
            config.storage.path, STYLE_STORAGE_KEY, TEXT_STORAGE_KEY
        );
    }
    println!("{}", serde_json::to_string_pretty(overrides)?);
    Ok(())
}

pub fn cmd_overrides_reset(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storage = FileStorage::open(&config.storage.path, config.storage.quota_bytes)?;
    let mut store = OverrideStore::new(storage);
    store.reset()?;
    println!("Cleared overrides in {}", config.storage.path);
    Ok(())
}

// ============================================================================
// catalog subcommands
// ============================================================================

pub fn cmd_catalog_list(config: &AppConfig, filter: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalog = DataManager::new();
    catalog.load_snapshot(&config.catalog.source)?;

    let products = catalog.filter(filter);
    for p in &products {
        let price = p
            .price
            .map(|v| format_price(v, p.currency.as_deref()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<30} {:<24} {}",
            p.id,
            p.title,
            p.category.as_deref().unwrap_or("-"),
            price
        );
    }
    println!("{} trainers", products.len());
    Ok(())
}

/// Print every invalid record; returns whether the catalog is clean.
pub fn cmd_catalog_validate(config: &AppConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let mut catalog = DataManager::new();
    catalog.load_snapshot(&config.catalog.source)?;

    let issues = catalog.validate_all();
    for issue in &issues {
        let id = if issue.id.is_empty() { "<no id>" } else { issue.id.as_str() };
        println!("{}: {}", id, issue.problems.join(", "));
    }
    println!(
        "{} of {} records valid",
        catalog.products().len() - issues.len(),
        catalog.products().len()
    );
    Ok(issues.is_empty())
}

// ============================================================================
// watch subcommand
// ============================================================================

/// Render once, then poll the remote collection every `interval` and rewrite
/// `output` whenever a poll answers. Runs until `max_polls` when set.
///
/// Returns the number of re-renders.
pub fn cmd_watch(
    config: &AppConfig,
    output: &str,
    interval: Duration,
    max_polls: Option<usize>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let endpoint = config
        .remote
        .endpoint
        .as_deref()
        .ok_or("watch needs a remote endpoint (--remote or remote.endpoint)")?;

    let mut site = open_site(config)?;
    std::fs::write(output, site.to_html())?;

    let latest: Rc<RefCell<Option<Vec<Product>>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&latest);
    let mut store = HttpStore::new(endpoint, &config.remote.collection);
    store.subscribe(Box::new(move |products| {
        *sink.borrow_mut() = Some(products.to_vec());
    }));

    info!("Watching {} every {}s", endpoint, interval.as_secs());
    let mut polls = 0;
    let mut renders = 0;
    while max_polls.is_none_or(|max| polls < max) {
        std::thread::sleep(interval);
        polls += 1;

        if let Err(e) = store.poll() {
            warn!("Poll {} failed: {}", polls, e);
            continue;
        }
        let update = latest.borrow_mut().take();
        if let Some(products) = update {
            site.on_remote_update(products);
            std::fs::write(output, site.to_html())?;
            renders += 1;
            info!("Re-rendered {} with {} cards", output, site.card_count());
        }
    }

    Ok(renders)
}

// ============================================================================
// admin subcommand
// ============================================================================

/// Sign in and run one admin action against `store`. The undo history lives
/// in `storage`, so it carries over between invocations.
pub fn run_admin<D: DocumentStore, S: KeyValueStorage>(
    admins: Vec<AdminCredential>,
    store: D,
    storage: &mut S,
    email: &str,
    password: &str,
    action: &AdminAction,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut admin = AdminService::new(store, CredentialAuthenticator::new(admins), storage);

    let login = admin.auth_mut().login(email, password);
    if !login.success {
        return Err(login.error.unwrap_or_else(|| "Sign-in failed".to_string()).into());
    }

    let message = match action {
        AdminAction::Save { file } => {
            let mut product: Product = serde_json::from_str(&std::fs::read_to_string(file)?)?;
            if product.id.trim().is_empty() {
                let existing = admin.store_mut().load_all()?;
                product.id = DataManager::with_products(existing).generate_trainer_id();
            }
            let id = product.id.clone();
            if admin.save_trainer(storage, product)? {
                format!("Created trainer {}", id)
            } else {
                format!("Updated trainer {}", id)
            }
        }
        AdminAction::Delete { id } => {
            let old = admin.delete_trainer(storage, id)?;
            format!("Deleted trainer {} ({})", id, old.title)
        }
        AdminAction::Undo => {
            let undone = admin.undo_last(storage)?;
            format!("Undid {} of {}", action_name(&undone), undone.trainer_id())
        }
        AdminAction::History => {
            let entries = admin.history().entries();
            if entries.is_empty() {
                "No recorded actions".to_string()
            } else {
                entries
                    .iter()
                    .map(|a| format!("{:<8} {}", action_name(a), a.trainer_id()))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
    };

    admin.auth_mut().logout();
    Ok(message)
}

fn action_name(action: &UndoAction) -> &'static str {
    match action {
        UndoAction::Create { .. } => "create",
        UndoAction::Update { .. } => "update",
        UndoAction::Delete { .. } => "delete",
    }
}

pub fn cmd_admin(
    config: &AppConfig,
    email: &str,
    password: &str,
    action: &AdminAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = config
        .remote
        .endpoint
        .as_deref()
        .ok_or("admin needs a remote endpoint (--remote or remote.endpoint)")?;

    let mut storage = FileStorage::open(&config.storage.path, config.storage.quota_bytes)?;
    let store = HttpStore::new(endpoint, &config.remote.collection);
    let message = run_admin(
        config.auth.admins.clone(),
        store,
        &mut storage,
        email,
        password,
        action,
    )?;
    println!("{}", message);
    Ok(())
}
