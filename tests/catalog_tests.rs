use std::cell::RefCell;
use std::rc::Rc;

use site_editor::auth::authenticator::{
    AdminCredential, Authenticator, CredentialAuthenticator, password_digest,
};
use site_editor::catalog::admin::{AdminError, AdminService};
use site_editor::catalog::data_manager::{CatalogError, DataManager, parse_snapshot, validate_product};
use site_editor::catalog::history::{MAX_UNDO_ENTRIES, UNDO_HISTORY_KEY, UndoAction, UndoHistory};
use site_editor::catalog::product::{Badge, Product, format_price};
use site_editor::catalog::store::{DocumentStore, MemoryStore, StoreError};
use site_editor::storage::kv::{KeyValueStorage, MemoryStorage};

mod common;

use common::utils::{captured_logs, trainer, trainers};

// ============================================================================
// Snapshot parsing
// ============================================================================

#[test]
fn parses_snapshot_and_skips_bad_records() {
    let body = r#"{
        "products": [
            {"id": "prod-001", "title": "Anna", "price": 2000, "category": "Fitness",
             "images": ["a.jpg"], "badges": ["Top", {"text": "New", "dark": true}]},
            {"id": 42, "title": "Broken"},
            {"id": "prod-002", "title": "Ivan", "detailedDescription": "Long text"}
        ]
    }"#;

    let products = parse_snapshot(body).unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price, Some(2000.0));
    assert_eq!(products[0].badges[0], Badge::Label("Top".to_string()));
    assert_eq!(products[0].badges[1].text(), "New");
    assert_eq!(products[1].detailed_description.as_deref(), Some("Long text"));
}

#[test]
fn snapshot_without_products_is_invalid() {
    let err = parse_snapshot(r#"{"items": []}"#).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidFormat));
    assert_eq!(err.to_string(), "Invalid data format");

    assert!(matches!(parse_snapshot("not json"), Err(CatalogError::Json(_))));
}

#[test]
fn loads_snapshot_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("products.json");
    std::fs::write(&path, r#"{"products": [{"id": "prod-007", "title": "Oleg"}]}"#).unwrap();

    let mut manager = DataManager::new();
    let loaded = manager.load_snapshot(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(manager.product_by_id("prod-007").unwrap().title, "Oleg");
}

#[test]
fn missing_snapshot_file_is_a_read_error() {
    let mut manager = DataManager::new();
    let err = manager.load_snapshot("/nonexistent/products.json").unwrap_err();
    assert!(matches!(err, CatalogError::Read { .. }));
}

// ============================================================================
// Data manager
// ============================================================================

#[test]
fn filters_by_category_substring() {
    let manager = DataManager::with_products(trainers());

    assert_eq!(manager.filter("all").len(), 3);
    let fitness: Vec<&str> = manager.filter("Fitness").iter().map(|p| p.id.as_str()).collect();
    assert_eq!(fitness, vec!["prod-001", "prod-003"]);
    assert_eq!(manager.filter("Boxing").len(), 1);
    assert!(manager.filter("Yoga").is_empty());
}

#[test]
fn product_lookup_ignores_empty_ids() {
    let mut products = trainers();
    products.push(Product {
        title: "No id".to_string(),
        ..Default::default()
    });
    let manager = DataManager::with_products(products);

    assert!(manager.product_by_id("").is_none());
    assert_eq!(manager.valid_products().len(), 3);
}

#[test]
fn invalid_records_are_reported_once_per_snapshot() {
    let mut products = trainers();
    products.push(trainer("prod-004", "", "Fitness"));

    let logs = captured_logs(|| {
        let mut manager = DataManager::with_products(products.clone());
        for _ in 0..5 {
            assert_eq!(manager.filter("all").len(), 3);
            assert_eq!(manager.valid_products().len(), 3);
        }
        manager.replace(products);
        assert_eq!(manager.filter("Fitness").len(), 2);
    });

    assert_eq!(logs.matches("Skipping product without id or title").count(), 2, "{}", logs);
}

#[test]
fn generates_next_trainer_id() {
    let mut manager = DataManager::with_products(trainers());
    assert_eq!(manager.generate_trainer_id(), "prod-004");

    manager.upsert(trainer("prod-041", "Late", "Fitness"));
    manager.upsert(trainer("custom", "Other", "Fitness"));
    assert_eq!(manager.generate_trainer_id(), "prod-042");

    assert_eq!(DataManager::new().generate_trainer_id(), "prod-001");
    assert_eq!(manager.empty_trainer().id, "prod-042");
}

#[test]
fn upsert_replaces_and_remove_deletes() {
    let mut manager = DataManager::with_products(trainers());
    manager.upsert(trainer("prod-002", "Ivan S.", "Boxing"));

    assert_eq!(manager.products().len(), 3);
    assert_eq!(manager.product_by_id("prod-002").unwrap().title, "Ivan S.");

    let removed = manager.remove("prod-001").unwrap();
    assert_eq!(removed.title, "Anna Petrova");
    assert!(manager.remove("prod-001").is_none());
}

#[test]
fn validation_reports_each_problem() {
    let mut product = trainer("prod-001", "Anna", "Fitness");
    assert!(validate_product(&product).is_empty());

    product.title = "  ".to_string();
    product.image.clear();
    product.price = Some(-5.0);
    assert_eq!(
        validate_product(&product),
        vec!["title is missing", "image is missing", "price -5 is negative"]
    );

    product.price = None;
    assert!(validate_product(&product).contains(&"price is missing".to_string()));
}

#[test]
fn validate_all_lists_only_failing_records() {
    let mut products = trainers();
    products[1].description.clear();
    let issues = DataManager::with_products(products).validate_all();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].id, "prod-002");
    assert_eq!(issues[0].problems, vec!["description is missing"]);
}

#[test]
fn formats_prices_with_currency_symbols() {
    assert_eq!(format_price(2000.0, None), "2000 \u{20bd}");
    assert_eq!(format_price(49.5, Some("USD")), "49.5 $");
    assert_eq!(format_price(10.0, Some("CHF")), "10 CHF");
}

#[test]
fn categories_fall_back_to_generic_label() {
    let mut product = trainer("prod-001", "Anna", " Fitness , Boxing,");
    assert_eq!(product.categories(), vec!["Fitness", "Boxing"]);

    product.category = None;
    assert_eq!(product.categories(), vec!["Trainer"]);
    assert!(!product.in_category("Fitness"));
}

// ============================================================================
// Document store
// ============================================================================

#[test]
fn memory_store_notifies_subscribers() {
    let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(vec![]));
    let sink = seen.clone();

    let mut store = MemoryStore::with_products(trainers());
    store.subscribe(Box::new(move |products| sink.borrow_mut().push(products.len())));

    store.save(&trainer("prod-004", "Oleg", "Boxing")).unwrap();
    store.delete("prod-001").unwrap();
    // Deleting a missing record does not notify
    store.delete("prod-999").unwrap();

    assert_eq!(*seen.borrow(), vec![4, 3]);
    assert_eq!(store.len(), 3);
}

#[test]
fn memory_store_rejects_missing_ids_and_offline_calls() {
    let mut store = MemoryStore::new();
    assert!(matches!(store.save(&Product::default()), Err(StoreError::MissingId)));

    store.set_offline(true);
    assert!(matches!(store.load_all(), Err(StoreError::Offline)));

    store.set_offline(false);
    assert!(store.load_all().unwrap().is_empty());
    assert!(store.is_empty());
}

// ============================================================================
// Undo history
// ============================================================================

fn created(id: &str) -> UndoAction {
    UndoAction::Create {
        trainer_id: id.to_string(),
        new_data: trainer(id, "Coach", "Fitness"),
    }
}

#[test]
fn history_keeps_the_newest_entries() {
    let mut storage = MemoryStorage::new();
    let mut history = UndoHistory::default();

    for i in 1..=7 {
        history.push(&mut storage, created(&format!("prod-{:03}", i)));
    }

    assert_eq!(history.len(), MAX_UNDO_ENTRIES);
    assert_eq!(history.entries()[0].trainer_id(), "prod-003");

    let reloaded = UndoHistory::load(&mut storage);
    assert_eq!(reloaded, history);
}

#[test]
fn history_serializes_with_type_tags() {
    let mut storage = MemoryStorage::new();
    let mut history = UndoHistory::default();
    history.push(
        &mut storage,
        UndoAction::Update {
            trainer_id: "prod-001".to_string(),
            old_data: trainer("prod-001", "Old", "Fitness"),
            new_data: trainer("prod-001", "New", "Fitness"),
        },
    );

    let raw: serde_json::Value =
        serde_json::from_str(&storage.get(UNDO_HISTORY_KEY).unwrap()).unwrap();
    assert_eq!(raw[0]["type"], "update");
    assert_eq!(raw[0]["trainerId"], "prod-001");
    assert_eq!(raw[0]["oldData"]["title"], "Old");
    assert_eq!(raw[0]["newData"]["title"], "New");
}

#[test]
fn history_strips_inline_images() {
    let mut storage = MemoryStorage::new();
    let mut history = UndoHistory::default();
    let mut product = trainer("prod-001", "Anna", "Fitness");
    product.image = "data:image/png;base64,AAAA".to_string();
    product.images = vec!["data:image/png;base64,BBBB".to_string(), "b.jpg".to_string()];

    history.push(
        &mut storage,
        UndoAction::Delete {
            trainer_id: "prod-001".to_string(),
            old_data: product,
        },
    );

    let UndoAction::Delete { old_data, .. } = &history.entries()[0] else {
        panic!("expected a delete entry");
    };
    assert!(old_data.image.is_empty());
    assert_eq!(old_data.images, vec!["b.jpg"]);
}

#[test]
fn history_shrinks_to_latest_action_when_storage_is_full() {
    let single = serde_json::to_string(&vec![created("prod-001")]).unwrap().len();
    let mut storage = MemoryStorage::with_quota(UNDO_HISTORY_KEY.len() + single + 10);
    let mut history = UndoHistory::default();

    history.push(&mut storage, created("prod-001"));
    history.push(&mut storage, created("prod-002"));

    assert_eq!(history.len(), 1);
    assert_eq!(history.entries()[0].trainer_id(), "prod-002");
    let reloaded = UndoHistory::load(&mut storage);
    assert_eq!(reloaded.entries()[0].trainer_id(), "prod-002");
}

#[test]
fn malformed_history_is_discarded() {
    let mut storage = MemoryStorage::new();
    storage.set(UNDO_HISTORY_KEY, "{oops".to_string()).unwrap();

    let history = UndoHistory::load(&mut storage);

    assert!(history.is_empty());
    assert_eq!(storage.get(UNDO_HISTORY_KEY), None);
}

// ============================================================================
// Auth
// ============================================================================

fn authenticator() -> CredentialAuthenticator {
    CredentialAuthenticator::new(vec![AdminCredential::new("admin@example.com", "secret")])
}

#[test]
fn password_digest_is_sha1_hex() {
    assert_eq!(password_digest("abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
}

#[test]
fn login_checks_credentials() {
    let mut auth = authenticator();

    let missing = auth.login("", "secret");
    assert!(!missing.success);
    assert_eq!(missing.error.as_deref(), Some("Email and password are required"));

    let wrong = auth.login("admin@example.com", "guess");
    assert_eq!(wrong.error.as_deref(), Some("Invalid email or password"));
    assert!(!auth.is_authenticated());

    let ok = auth.login(" Admin@Example.com ", "secret");
    assert!(ok.success);
    assert_eq!(auth.current_user().unwrap().email, "Admin@Example.com");

    auth.logout();
    assert!(auth.current_user().is_none());
}

// ============================================================================
// Admin service
// ============================================================================

fn admin(storage: &mut MemoryStorage) -> AdminService<MemoryStore, CredentialAuthenticator> {
    let mut service = AdminService::new(MemoryStore::with_products(trainers()), authenticator(), storage);
    service.auth_mut().login("admin@example.com", "secret");
    service
}

#[test]
fn admin_actions_require_sign_in() {
    let mut storage = MemoryStorage::new();
    let mut service = admin(&mut storage);
    service.auth_mut().logout();

    let err = service
        .save_trainer(&mut storage, trainer("prod-004", "Oleg", "Boxing"))
        .unwrap_err();
    assert!(matches!(err, AdminError::NotAuthenticated));
    assert!(matches!(
        service.delete_trainer(&mut storage, "prod-001"),
        Err(AdminError::NotAuthenticated)
    ));
    assert!(service.history().is_empty());
}

#[test]
fn invalid_records_are_not_saved() {
    let mut storage = MemoryStorage::new();
    let mut service = admin(&mut storage);
    let mut product = trainer("prod-004", "Oleg", "Boxing");
    product.price = None;

    let err = service.save_trainer(&mut storage, product).unwrap_err();
    assert!(matches!(err, AdminError::Invalid(ref problems) if problems == &vec!["price is missing".to_string()]));
    assert_eq!(service.store_mut().len(), 3);
}

#[test]
fn save_update_and_delete_can_be_undone() {
    let mut storage = MemoryStorage::new();
    let mut service = admin(&mut storage);

    assert!(service.save_trainer(&mut storage, trainer("prod-004", "Oleg", "Boxing")).unwrap());
    assert!(!service.save_trainer(&mut storage, trainer("prod-001", "Anna P.", "Fitness")).unwrap());
    service.delete_trainer(&mut storage, "prod-002").unwrap();
    assert_eq!(service.history().len(), 3);

    // Undo delete
    let undone = service.undo_last(&mut storage).unwrap();
    assert!(matches!(undone, UndoAction::Delete { .. }));
    assert!(service.store_mut().load_all().unwrap().iter().any(|p| p.id == "prod-002"));

    // Undo update
    service.undo_last(&mut storage).unwrap();
    let anna = service
        .store_mut()
        .load_all()
        .unwrap()
        .into_iter()
        .find(|p| p.id == "prod-001")
        .unwrap();
    assert_eq!(anna.title, "Anna Petrova");

    // Undo create
    service.undo_last(&mut storage).unwrap();
    assert_eq!(service.store_mut().len(), 3);

    assert!(matches!(service.undo_last(&mut storage), Err(AdminError::NothingToUndo)));
}

#[test]
fn deleting_unknown_trainer_fails() {
    let mut storage = MemoryStorage::new();
    let mut service = admin(&mut storage);
    let err = service.delete_trainer(&mut storage, "prod-999").unwrap_err();
    assert!(matches!(err, AdminError::NotFound(ref id) if id == "prod-999"));
}

#[test]
fn history_survives_a_new_service() {
    let mut storage = MemoryStorage::new();
    let mut service = admin(&mut storage);
    service.delete_trainer(&mut storage, "prod-003").unwrap();

    let restarted = AdminService::new(MemoryStore::new(), authenticator(), &mut storage);
    assert_eq!(restarted.history().len(), 1);
    assert_eq!(restarted.history().entries()[0].trainer_id(), "prod-003");
}

#[test]
fn store_failures_surface_as_admin_errors() {
    let mut storage = MemoryStorage::new();
    let mut service = admin(&mut storage);
    service.store_mut().set_offline(true);

    let err = service
        .save_trainer(&mut storage, trainer("prod-004", "Oleg", "Boxing"))
        .unwrap_err();
    assert!(matches!(err, AdminError::Store(StoreError::Offline)));
}
