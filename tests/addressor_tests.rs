use site_editor::catalog::product::Product;
use site_editor::editor::addressor::{
    AddressMap, Addressor, EDIT_ID_ATTR, EDIT_TYPE_ATTR, ElementKey, KeyScheme,
};
use site_editor::editor::applier::OverrideApplier;
use site_editor::editor::category::{EditableCategory, key_tag};
use site_editor::editor::override_store::Overrides;
use site_editor::page::page_model::{Page, PageNode};
use site_editor::page::render::{PageLayout, render_gallery, render_home, to_html};
use site_editor::page::selector::Selector;
use site_editor::site::settings::SiteContent;

mod common;

use common::utils::trainers;

fn home(products: &[Product]) -> (Page, PageLayout) {
    let (mut page, layout) = render_home(&SiteContent::default());
    let refs: Vec<&Product> = products.iter().collect();
    render_gallery(&mut page, layout.gallery, &refs, 50);
    (page, layout)
}

fn key(s: &str) -> ElementKey {
    ElementKey::from(s)
}

fn keys(map: &AddressMap) -> Vec<String> {
    map.iter().map(|(k, _)| k.to_string()).collect()
}

// ============================================================================
// Categories
// ============================================================================

#[test]
fn key_tags_keep_only_lowercase_letters() {
    assert_eq!(key_tag("hero__title"), "herotitle");
    assert_eq!(key_tag("trainers-section"), "trainerssection");
    assert_eq!(key_tag("filter-btn"), "filterbtn");
}

#[test]
fn container_categories_have_no_text() {
    assert!(EditableCategory::CardContainer.capabilities().is_container());
    assert!(EditableCategory::SectionBackground.capabilities().background_image);
    assert!(EditableCategory::HeroTitle.capabilities().text);
    assert_eq!(EditableCategory::FilterButton.to_string(), "filter-button");
}

// ============================================================================
// Tagging
// ============================================================================

#[test]
fn tags_every_editable_element_with_ordinal_keys() {
    let (mut page, _) = home(&trainers());
    let map = Addressor::new(KeyScheme::Ordinal).tag(&mut page);

    // 5 static texts, 4 filters, 2 sections, 3 cards with title, description
    // and two buttons each
    assert_eq!(map.len(), 5 + 4 + 2 + 3 * 5);

    for expected in [
        "herotitle-0",
        "herosubtitle-0",
        "herobutton-0",
        "trainerstitle-0",
        "trainerssubtitle-0",
        "filterbtn-3",
        "hero-0",
        "trainerssection-0",
        "card-2",
        "cardtitle-2",
        "carddescription-0",
        "cardbutton-5",
    ] {
        assert!(map.resolve(&key(expected)).is_some(), "missing key {}", expected);
    }
    assert!(map.resolve(&key("cardtitle-3")).is_none());
}

#[test]
fn writes_edit_markers() {
    let (mut page, _) = home(&trainers());
    let map = Addressor::default().tag(&mut page);

    let title = map.resolve(&key("herotitle-0")).unwrap();
    assert_eq!(page.attr(title, EDIT_ID_ATTR), Some("herotitle-0"));
    assert_eq!(page.attr(title, EDIT_TYPE_ATTR), Some("text"));

    let hero = map.resolve(&key("hero-0")).unwrap();
    assert_eq!(page.attr(hero, EDIT_TYPE_ATTR), Some("section"));
    assert_eq!(map.category_of(hero), Some(EditableCategory::SectionBackground));

    let card = map.resolve(&key("card-0")).unwrap();
    assert_eq!(page.attr(card, EDIT_TYPE_ATTR), Some("card"));

    let button = map.resolve(&key("cardbutton-1")).unwrap();
    assert_eq!(page.attr(button, EDIT_TYPE_ATTR), Some("button"));
}

#[test]
fn ordinal_keys_are_stable_across_passes() {
    let (mut page, _) = home(&trainers());
    let addressor = Addressor::new(KeyScheme::Ordinal);

    let first = addressor.tag(&mut page);
    let second = addressor.tag(&mut page);
    assert_eq!(keys(&first), keys(&second));

    // Same structure rendered from scratch yields the same keys
    let (mut fresh, _) = home(&trainers());
    let third = addressor.tag(&mut fresh);
    assert_eq!(keys(&first), keys(&third));
}

#[test]
fn retagging_clears_markers_of_elements_no_longer_editable() {
    let (mut page, _) = home(&trainers());
    let addressor = Addressor::default();
    addressor.tag(&mut page);

    let title = page.select_first(&Selector::class("hero__title")).unwrap();
    page.remove_class(title, "hero__title");
    let map = addressor.tag(&mut page);

    assert_eq!(page.attr(title, EDIT_ID_ATTR), None);
    assert!(!map.is_tagged(title));
}

#[test]
fn ordinal_keys_shift_when_the_gallery_changes() {
    let all = trainers();
    let (mut page, layout) = home(&all);
    let addressor = Addressor::new(KeyScheme::Ordinal);
    addressor.tag(&mut page);

    // Only the second trainer remains: it takes ordinal 0
    let only_second = [&all[1]];
    render_gallery(&mut page, layout.gallery, &only_second, 50);
    let map = addressor.tag(&mut page);

    let title = map.resolve(&key("cardtitle-0")).unwrap();
    assert_eq!(page.content(title), Some("Ivan Sokolov"));
    assert!(map.resolve(&key("cardtitle-1")).is_none());
}

#[test]
fn record_id_keys_follow_the_record() {
    let all = trainers();
    let (mut page, layout) = home(&all);
    let addressor = Addressor::new(KeyScheme::RecordId);
    let map = addressor.tag(&mut page);

    assert!(map.resolve(&key("cardtitle@prod-002-0")).is_some());
    assert!(map.resolve(&key("cardbutton@prod-001-1")).is_some());
    assert!(map.resolve(&key("card@prod-003-0")).is_some());
    // Elements outside cards keep ordinal keys
    assert!(map.resolve(&key("herotitle-0")).is_some());
    assert!(map.resolve(&key("filterbtn-0")).is_some());

    let only_second = [&all[1]];
    render_gallery(&mut page, layout.gallery, &only_second, 50);
    let map = addressor.tag(&mut page);

    let title = map.resolve(&key("cardtitle@prod-002-0")).unwrap();
    assert_eq!(page.content(title), Some("Ivan Sokolov"));
    assert!(map.resolve(&key("cardtitle@prod-001-0")).is_none());
}

#[test]
fn tagged_ancestor_is_the_innermost() {
    let (mut page, _) = home(&trainers());
    let map = Addressor::default().tag(&mut page);

    let image = page.select_first(&Selector::class("card__image")).unwrap();
    let card = map.resolve(&key("card-0")).unwrap();
    assert_eq!(map.tagged_ancestor(&page, image), Some(card));

    let button = map.resolve(&key("cardbutton-0")).unwrap();
    assert_eq!(map.tagged_ancestor(&page, button), Some(button));

    let title = map.resolve(&key("herotitle-0")).unwrap();
    assert_eq!(map.tagged_ancestor(&page, title), Some(title));

    assert_eq!(map.tagged_ancestor(&page, page.root()), None);
}

#[test]
fn untagged_page_yields_empty_map() {
    let mut page = Page::new();
    let root = page.root();
    page.append(root, PageNode::new("div").with_class("unrelated"));

    let map = Addressor::default().tag(&mut page);
    assert!(map.is_empty());
}

// ============================================================================
// Applier
// ============================================================================

fn sample_overrides() -> Overrides {
    let mut overrides = Overrides::default();
    overrides
        .styles
        .entry(key("herotitle-0"))
        .or_default()
        .insert("fontSize".to_string(), "96px".to_string());
    overrides
        .styles
        .entry(key("card-1"))
        .or_default()
        .insert("backgroundColor".to_string(), "#112233".to_string());
    overrides
        .texts
        .insert(key("trainerstitle-0"), "Meet the <em>team</em>".to_string());
    overrides
}

#[test]
fn applies_styles_and_texts_by_key() {
    let (mut page, _) = home(&trainers());
    let (map, report) = OverrideApplier::default().apply_all(&mut page, &sample_overrides());

    let title = map.resolve(&key("herotitle-0")).unwrap();
    assert_eq!(page.style(title, "fontSize"), Some("96px"));

    let card = map.resolve(&key("card-1")).unwrap();
    assert_eq!(page.style(card, "backgroundColor"), Some("#112233"));

    let section_title = map.resolve(&key("trainerstitle-0")).unwrap();
    assert_eq!(page.content(section_title), Some("Meet the <em>team</em>"));

    assert_eq!(report.styled, 2);
    assert_eq!(report.texted, 1);
    assert!(report.stale.is_empty());
}

#[test]
fn applying_twice_is_idempotent() {
    let (mut page, _) = home(&trainers());
    let applier = OverrideApplier::default();
    let overrides = sample_overrides();

    applier.apply_all(&mut page, &overrides);
    let once = to_html(&page, "t");
    applier.apply_all(&mut page, &overrides);
    let twice = to_html(&page, "t");

    assert_eq!(once, twice);
}

#[test]
fn ordinal_text_override_stays_on_its_card_after_rerender() {
    let all = trainers();
    let (mut page, layout) = home(&all);
    let applier = OverrideApplier::default();
    let mut overrides = Overrides::default();
    overrides.texts.insert(key("cardtitle-1"), "Head coach".to_string());

    applier.apply_all(&mut page, &overrides);

    // Same records, same order: a filter click on "all"
    let refs: Vec<&Product> = all.iter().collect();
    render_gallery(&mut page, layout.gallery, &refs, 50);
    let (map, report) = applier.apply_all(&mut page, &overrides);

    let titles: Vec<String> = (0..3)
        .map(|i| {
            let title = map.resolve(&key(&format!("cardtitle-{}", i))).unwrap();
            page.content(title).unwrap().to_string()
        })
        .collect();
    assert_eq!(titles, ["Anna Petrova", "Head coach", "Maria Volkova"]);
    assert_eq!(report.texted, 1);
    assert!(report.stale.is_empty());
}

#[test]
fn unresolvable_keys_are_reported_and_skipped() {
    let (mut page, _) = home(&trainers());
    let mut overrides = sample_overrides();
    overrides
        .texts
        .insert(key("cardtitle-7"), "Ghost".to_string());
    overrides
        .styles
        .entry(key("cardtitle-7"))
        .or_default()
        .insert("color".to_string(), "#FFFFFF".to_string());

    let (_, report) = OverrideApplier::default().apply_all(&mut page, &overrides);

    assert_eq!(report.stale, vec![key("cardtitle-7")]);
    assert_eq!(report.styled, 2);
    assert_eq!(report.texted, 1);
}

#[test]
fn empty_gallery_leaves_card_overrides_stale() {
    let (mut page, _) = home(&[]);
    let (_, report) = OverrideApplier::default().apply_all(&mut page, &sample_overrides());
    assert_eq!(report.stale, vec![key("card-1")]);
}
