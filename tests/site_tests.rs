use site_editor::catalog::product::Product;
use site_editor::editor::addressor::{EDITABLE_CLASS, KeyScheme};
use site_editor::editor::inspector::{ApplyAction, TextKey};
use site_editor::editor::override_store::{OverrideStore, STYLE_STORAGE_KEY, TEXT_STORAGE_KEY};
use site_editor::page::selector::Selector;
use site_editor::site::app::{LOAD_ERROR_MESSAGE, Site, SiteEffect, SiteOptions};
use site_editor::site::modal::{MODAL_OPEN_CLASS, MediaSlide, contact_options, media_slides};
use site_editor::site::notifier::{NoticeKind, Notifier};
use site_editor::site::settings::SiteContent;
use site_editor::storage::kv::{KeyValueStorage, MemoryStorage};

mod common;

use common::utils::{by_class, computed, content, node, site, site_with, trainer, trainers};

// ============================================================================
// Rendering and filters
// ============================================================================

#[test]
fn renders_all_valid_trainers() {
    let site = site();
    assert_eq!(site.card_count(), 3);
    assert_eq!(site.active_filter(), "all");
    assert!(site.to_html().contains("Anna Petrova"));
}

#[test]
fn records_without_title_are_not_rendered() {
    let mut products = trainers();
    products.push(trainer("prod-004", "", "Fitness"));
    let site = Site::new(
        SiteContent::default(),
        products,
        MemoryStorage::new(),
        SiteOptions::default(),
    );
    assert_eq!(site.card_count(), 3);
}

#[test]
fn empty_catalog_shows_load_error() {
    let site = Site::new(
        SiteContent::default(),
        vec![],
        MemoryStorage::new(),
        SiteOptions::default(),
    );
    assert_eq!(site.card_count(), 0);
    let message = by_class(&site, "error-message", 0);
    assert_eq!(content(&site, message), LOAD_ERROR_MESSAGE);
}

#[test]
fn max_cards_limits_the_gallery() {
    let options = SiteOptions {
        max_cards: 2,
        ..Default::default()
    };
    let site = site_with(MemoryStorage::new(), options);
    assert_eq!(site.card_count(), 2);
}

#[test]
fn filter_button_click_filters_the_gallery() {
    let mut site = site();
    let fitness = site
        .page()
        .select_first(&Selector::class("filter-btn").with_attr("data-filter", Some("Fitness")))
        .unwrap();

    site.click(fitness);

    assert_eq!(site.card_count(), 2);
    assert_eq!(site.active_filter(), "Fitness");
    assert_eq!(site.effects(), &[SiteEffect::Filtered("Fitness".to_string())]);
    let fitness = site
        .page()
        .select_first(&Selector::class("filter-btn").with_attr("data-filter", Some("Fitness")))
        .unwrap();
    assert!(site.page().has_class(fitness, "filter-btn--active"));
    let all = by_class(&site, "filter-btn", 0);
    assert!(!site.page().has_class(all, "filter-btn--active"));
}

#[test]
fn filter_without_matches_shows_empty_message() {
    let mut site = site();
    site.apply_filter("Yoga");

    assert_eq!(site.card_count(), 0);
    let message = by_class(&site, "error-message", 0);
    assert_eq!(content(&site, message), "No products available");
}

#[test]
fn hero_button_scrolls_to_trainers() {
    let mut site = site();
    let button = node(&site, "herobutton-0");
    site.click(button);
    assert_eq!(site.effects(), &[SiteEffect::ScrolledTo(site.layout().trainers)]);
}

// ============================================================================
// Overrides across re-renders
// ============================================================================

#[test]
fn overrides_are_reapplied_after_filtering() {
    let mut site = site();
    site.toggle_edit_mode();
    site.click(node(&site, "cardtitle-0"));
    site.panel_mut().unwrap().text_color.type_hex("#FF0000");
    site.apply(ApplyAction::Colors);

    site.apply_filter("CrossFit");

    // Ordinal keys: the first card of the new gallery carries the override
    let title = node(&site, "cardtitle-0");
    assert_eq!(content(&site, title), "Ivan Sokolov");
    assert_eq!(computed(&site, title, "color"), "#FF0000");
}

#[test]
fn record_id_keys_keep_overrides_on_their_trainer() {
    let options = SiteOptions {
        key_scheme: KeyScheme::RecordId,
        ..Default::default()
    };
    let mut site = site_with(MemoryStorage::new(), options);
    site.toggle_edit_mode();
    let title = node(&site, "cardtitle@prod-003-0");
    site.click(title);
    site.panel_mut().unwrap().text_color.type_hex("#00FF00");
    site.apply(ApplyAction::Colors);

    site.apply_filter("Boxing");

    let title = node(&site, "cardtitle@prod-003-0");
    assert_eq!(content(&site, title), "Maria Volkova");
    assert_eq!(computed(&site, title, "color"), "#00FF00");
}

#[test]
fn rerender_in_edit_mode_keeps_editing_treatment_and_drops_stale_selection() {
    let mut site = site();
    site.toggle_edit_mode();
    let title = node(&site, "cardtitle-0");
    site.click(title);
    site.begin_text_edit();
    site.type_text("Unsaved draft");

    site.on_remote_update(vec![trainer("prod-010", "New Coach", "Fitness")]);

    assert!(site.editor().is_editing());
    assert!(site.editor().selected().is_none());
    assert!(site.editor().inspector().text_edit().is_none());
    assert!(site.editor().store().overrides().texts.is_empty());

    let card = node(&site, "card-0");
    assert!(site.page().has_class(card, EDITABLE_CLASS));
    assert_eq!(site.page().style(card, "pointerEvents"), Some("auto"));
    assert_eq!(site.card_count(), 1);
}

#[test]
fn saved_overrides_apply_on_startup() {
    let mut storage = MemoryStorage::new();
    storage
        .set(
            STYLE_STORAGE_KEY,
            r##"{"hero-0":{"backgroundColor":"#000080"}}"##.to_string(),
        )
        .unwrap();
    storage
        .set(TEXT_STORAGE_KEY, r#"{"herotitle-0":"Welcome <br>back"}"#.to_string())
        .unwrap();

    let site = site_with(storage, SiteOptions::default());

    let hero = node(&site, "hero-0");
    assert_eq!(computed(&site, hero, "backgroundColor"), "#000080");
    assert_eq!(content(&site, node(&site, "herotitle-0")), "Welcome <br>back");
    assert_eq!(site.last_report().styled, 1);
    assert_eq!(site.last_report().texted, 1);
    assert!(!site.editor().is_editing());
}

#[test]
fn reload_leaves_edit_mode() {
    let mut site = site();
    site.toggle_edit_mode();
    site.apply_filter("Fitness");

    site.reload();

    assert!(!site.editor().is_editing());
    assert_eq!(site.active_filter(), "all");
    assert_eq!(site.card_count(), 3);
    assert!(site
        .page()
        .select_all(&Selector::class(EDITABLE_CLASS))
        .is_empty());
}

#[test]
fn text_override_round_trips_through_save_and_reload() {
    let mut site = site();
    site.toggle_edit_mode();
    site.click(node(&site, "trainerssubtitle-0"));
    site.begin_text_edit();
    site.type_text("Pick a coach");
    site.key_down(TextKey::Enter { shift: true });
    site.type_text("today");
    site.key_down(TextKey::Enter { shift: false });
    site.command(site_editor::editor::controller::EditorCommand::Save);

    site.reload();

    assert_eq!(
        content(&site, node(&site, "trainerssubtitle-0")),
        "Pick a coach<br>today"
    );
}

#[test]
fn a_second_site_on_the_same_storage_sees_saved_changes() {
    let mut site = site();
    site.toggle_edit_mode();
    site.click(node(&site, "herotitle-0"));
    site.panel_mut().unwrap().font_size.set(88);
    site.apply(ApplyAction::Typography);
    site.command(site_editor::editor::controller::EditorCommand::Save);

    let storage = site.editor().store().storage().clone();
    let mut store = OverrideStore::new(storage.clone());
    store.load();
    assert_eq!(store.overrides(), site.editor().store().overrides());

    let other = site_with(storage, SiteOptions::default());
    assert_eq!(computed(&other, node(&other, "herotitle-0"), "fontSize"), "88px");
}

// ============================================================================
// Details modal
// ============================================================================

fn detailed_trainer() -> Product {
    Product {
        images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
        videos: vec!["".to_string(), "intro.mp4".to_string()],
        phone: Some("+7 (900) 123-45-67".to_string()),
        detailed_description: Some("Ten years of strength coaching".to_string()),
        ..trainer("prod-001", "Anna Petrova", "Fitness")
    }
}

#[test]
fn card_click_opens_details() {
    let mut site = site();
    let card = node(&site, "card-1");

    site.click(card);

    assert!(site.modal().is_open());
    assert_eq!(site.modal().product_id(), Some("prod-002"));
    assert_eq!(site.effects(), &[SiteEffect::OpenedDetails("prod-002".to_string())]);

    let mount = site.page().find_by_id("modal").unwrap();
    assert!(site.page().has_class(mount, MODAL_OPEN_CLASS));
    let title = by_class(&site, "modal__title", 0);
    assert_eq!(content(&site, title), "Ivan Sokolov");
}

#[test]
fn primary_card_button_opens_details_through_the_card() {
    let mut site = site();
    let primary = node(&site, "cardbutton-0");
    site.click(primary);
    assert_eq!(site.modal().product_id(), Some("prod-001"));
}

#[test]
fn escape_closes_details() {
    let mut site = site();
    assert!(site.open_trainer("prod-003"));

    site.key_down(TextKey::Escape);

    assert!(!site.modal().is_open());
    let mount = site.page().find_by_id("modal").unwrap();
    assert!(!site.page().has_class(mount, MODAL_OPEN_CLASS));
    assert!(site.page().get(mount).unwrap().children().is_empty());
}

#[test]
fn unknown_trainer_notifies() {
    let mut site = site();
    assert!(!site.open_trainer("prod-999"));
    assert!(!site.modal().is_open());
    assert_eq!(site.notices().last().unwrap().kind, NoticeKind::Error);
}

#[test]
fn carousel_wraps_in_both_directions() {
    let mut site = Site::new(
        SiteContent::default(),
        vec![detailed_trainer()],
        MemoryStorage::new(),
        SiteOptions::default(),
    );
    site.open_trainer("prod-001");
    let modal = site.modal_mut();

    assert_eq!(modal.slides().len(), 3);
    assert_eq!(modal.current_slide(), Some(&MediaSlide::Image("a.jpg".to_string())));
    assert_eq!(modal.prev(), Some(&MediaSlide::Video("intro.mp4".to_string())));
    assert_eq!(modal.next(), Some(&MediaSlide::Image("a.jpg".to_string())));
    assert_eq!(modal.show(-2), Some(&MediaSlide::Image("b.jpg".to_string())));
    assert_eq!(modal.show(7), Some(&MediaSlide::Image("b.jpg".to_string())));
    assert_eq!(modal.current_index(), 1);
}

#[test]
fn modal_uses_detailed_description_and_trainer_phone() {
    let mut site = Site::new(
        SiteContent::default(),
        vec![detailed_trainer()],
        MemoryStorage::new(),
        SiteOptions::default(),
    );
    site.open_trainer("prod-001");

    let description = by_class(&site, "modal__description", 0);
    assert_eq!(content(&site, description), "Ten years of strength coaching");
    assert_eq!(site.modal().contacts()[0].href, "tel:+79001234567");
}

#[test]
fn media_slides_fall_back_to_cover_and_global_video() {
    let mut content = SiteContent {
        global_video: Some("global.mp4".to_string()),
        ..Default::default()
    };
    let plain = trainer("prod-002", "Ivan Sokolov", "CrossFit");

    assert_eq!(
        media_slides(&plain, &content),
        vec![
            MediaSlide::Image("img/prod-002.jpg".to_string()),
            MediaSlide::Video("global.mp4".to_string()),
        ]
    );

    content.global_video_enabled = false;
    assert_eq!(media_slides(&plain, &content).len(), 1);

    let personal = detailed_trainer();
    assert_eq!(
        media_slides(&personal, &content).last(),
        Some(&MediaSlide::Video("intro.mp4".to_string()))
    );
}

#[test]
fn contact_options_use_digits_only() {
    let options = contact_options("+7 (988) 293-11-93");
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();

    assert_eq!(labels, vec!["Call", "WhatsApp", "Telegram"]);
    assert_eq!(options[0].href, "tel:+79882931193");
    assert!(options[1].href.starts_with("https://wa.me/79882931193?text="));
    assert_eq!(options[2].href, "https://t.me/+79882931193");
}

// ============================================================================
// Notifications
// ============================================================================

#[test]
fn notifier_clones_share_one_queue() {
    let notifier = Notifier::new();
    let handle = notifier.clone();

    handle.success("Saved");
    notifier.error("Failed");

    assert_eq!(notifier.pending().len(), 2);
    let drained = handle.drain();
    assert_eq!(drained[0].kind, NoticeKind::Success);
    assert_eq!(drained[1].message, "Failed");
    assert!(notifier.last().is_none());
}
