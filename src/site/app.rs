use tracing::{debug, info, warn};

use crate::catalog::data_manager::DataManager;
use crate::catalog::product::Product;
use crate::editor::addressor::KeyScheme;
use crate::editor::applier::{ApplyReport, OverrideApplier};
use crate::editor::controller::{EditController, EditorCommand, PageEvent, Routed};
use crate::editor::inspector::{ApplyAction, InspectorPanel, TextKey};
use crate::editor::override_store::{OverrideStore, PersistPolicy};
use crate::page::page_model::{NativeAction, NodeId, Page};
use crate::page::render::{
    self, DEFAULT_MAX_CARDS, MODAL_ID, PageLayout, mark_active_filter, render_gallery, render_home,
    render_message,
};
use crate::site::modal::DetailModal;
use crate::site::notifier::Notifier;
use crate::site::settings::SiteContent;
use crate::storage::kv::KeyValueStorage;
use crate::trace::logger::TraceLogger;

pub const LOAD_ERROR_MESSAGE: &str = "Unable to load trainers. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiteOptions {
    pub max_cards: usize,
    pub persist: PersistPolicy,
    pub key_scheme: KeyScheme,
}

impl Default for SiteOptions {
    fn default() -> Self {
        SiteOptions {
            max_cards: DEFAULT_MAX_CARDS,
            persist: PersistPolicy::default(),
            key_scheme: KeyScheme::default(),
        }
    }
}

/// A native action that ran in response to a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteEffect {
    OpenedDetails(String),
    Filtered(String),
    ContactPopup,
    ScrolledTo(NodeId),
    Editor(EditorCommand),
}

/// The home page with its editor: owns the page, the catalog snapshot and
/// the edit controller, and sequences rendering before override application.
pub struct Site<S: KeyValueStorage> {
    page: Page,
    layout: PageLayout,
    content: SiteContent,
    catalog: DataManager,
    modal: DetailModal,
    editor: EditController<S>,
    applier: OverrideApplier,
    notices: Notifier,
    options: SiteOptions,
    active_filter: String,
    last_report: ApplyReport,
    effects: Vec<SiteEffect>,
}

impl<S: KeyValueStorage> Site<S> {
    /// Load persisted overrides, render the page and apply them.
    pub fn new(content: SiteContent, products: Vec<Product>, storage: S, options: SiteOptions) -> Self {
        let notices = Notifier::new();
        let mut store = OverrideStore::new(storage);
        store.load();

        let editor = EditController::new(store, options.persist, options.key_scheme, notices.clone());
        let (page, layout) = render_home(&content);
        let active_filter = first_filter(&content);

        let mut site = Site {
            page,
            layout,
            content,
            catalog: DataManager::with_products(products),
            modal: DetailModal::new(),
            editor,
            applier: OverrideApplier::new(options.key_scheme),
            notices,
            options,
            active_filter,
            last_report: ApplyReport::default(),
            effects: vec![],
        };
        site.render_gallery();
        info!(
            "Site ready: {} cards, {} overrides applied",
            site.card_count(),
            site.last_report.styled + site.last_report.texted
        );
        site
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.editor = self.editor.with_tracer(tracer);
        self
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Re-render the gallery for the active filter, then re-address the page
    /// and reapply every override.
    fn render_gallery(&mut self) {
        if self.catalog.valid_products().is_empty() {
            warn!("No valid products to display");
            render_message(&mut self.page, self.layout.gallery, LOAD_ERROR_MESSAGE);
        } else {
            let products = self.catalog.filter(&self.active_filter);
            let rendered = render_gallery(&mut self.page, self.layout.gallery, &products, self.options.max_cards);
            debug!("Rendered {} cards for filter '{}'", rendered, self.active_filter);
        }
        self.reapply();
    }

    fn reapply(&mut self) {
        let (map, report) = self
            .applier
            .apply_all(&mut self.page, self.editor.store().overrides());
        self.editor.after_render(&mut self.page, map);
        self.last_report = report;
    }

    pub fn apply_filter(&mut self, filter: &str) {
        self.active_filter = filter.to_string();
        mark_active_filter(&mut self.page, self.layout.filters, filter);
        self.render_gallery();
    }

    /// The document collection changed remotely.
    pub fn on_remote_update(&mut self, products: Vec<Product>) {
        self.catalog.replace(products);
        self.render_gallery();
    }

    /// Simulated page reload: fresh render, overrides re-read from storage,
    /// edit mode off.
    pub fn reload(&mut self) {
        self.editor.discard_page_state();
        self.editor.store_mut().clear_memory();
        self.editor.store_mut().load();

        let (page, layout) = render_home(&self.content);
        self.page = page;
        self.layout = layout;
        self.modal = DetailModal::new();
        self.active_filter = first_filter(&self.content);
        self.render_gallery();
        debug!("Reloaded page");
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Deliver a click. Native behavior runs only when the editor routes the
    /// click to it.
    pub fn click(&mut self, target: NodeId) -> Routed {
        let routed = self.editor.dispatch(&mut self.page, target, PageEvent::Click);
        if routed == Routed::Native {
            if let Some(action) = self.native_action(target) {
                self.run_native(action);
            }
        }
        routed
    }

    pub fn hover(&mut self, target: NodeId) -> Routed {
        self.editor.dispatch(&mut self.page, target, PageEvent::MouseEnter)
    }

    pub fn leave(&mut self, target: NodeId) -> Routed {
        self.editor.dispatch(&mut self.page, target, PageEvent::MouseLeave)
    }

    /// Key press on the focused element: the text being edited if any.
    pub fn key_down(&mut self, key: TextKey) -> Routed {
        let focus = self.focus();
        let routed = self.editor.dispatch(&mut self.page, focus, PageEvent::KeyDown(key));
        if routed == Routed::Ignored && key == TextKey::Escape && self.modal.is_open() {
            self.close_details();
            return Routed::Native;
        }
        routed
    }

    pub fn type_text(&mut self, text: &str) -> Routed {
        let focus = self.focus();
        self.editor
            .dispatch(&mut self.page, focus, PageEvent::Input(text.to_string()))
    }

    pub fn blur(&mut self) -> Routed {
        let focus = self.focus();
        self.editor.dispatch(&mut self.page, focus, PageEvent::Blur)
    }

    fn focus(&self) -> NodeId {
        self.editor
            .inspector()
            .text_edit()
            .map(|t| t.node)
            .unwrap_or_else(|| self.page.root())
    }

    pub fn toggle_edit_mode(&mut self) {
        self.editor.toggle(&mut self.page);
    }

    fn native_action(&self, target: NodeId) -> Option<NativeAction> {
        self.page
            .ancestors_or_self(target)
            .into_iter()
            .find_map(|n| self.page.get(n).and_then(|node| node.action.clone()))
    }

    fn run_native(&mut self, action: NativeAction) {
        match action {
            NativeAction::OpenDetails { product_id } => {
                if self.open_details(&product_id) {
                    self.effects.push(SiteEffect::OpenedDetails(product_id));
                }
            }
            NativeAction::Filter { filter } => {
                self.apply_filter(&filter);
                self.effects.push(SiteEffect::Filtered(filter));
            }
            NativeAction::ContactPopup => {
                self.effects.push(SiteEffect::ContactPopup);
            }
            NativeAction::ScrollToTrainers => {
                self.effects.push(SiteEffect::ScrolledTo(self.layout.trainers));
            }
            NativeAction::Editor(command) => {
                self.editor.handle_command(&mut self.page, command);
                self.effects.push(SiteEffect::Editor(command));
                if command == EditorCommand::Reset {
                    self.reload();
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Details
    // ------------------------------------------------------------------------

    fn open_details(&mut self, product_id: &str) -> bool {
        let Some(mount) = self.page.find_by_id(MODAL_ID) else {
            return false;
        };
        let Some(product) = self.catalog.product_by_id(product_id) else {
            warn!("Product not found: {}", product_id);
            self.notices.error("Trainer not found");
            return false;
        };
        self.modal.open(&mut self.page, mount, product, &self.content);
        true
    }

    /// Deep link: open a trainer's details directly.
    pub fn open_trainer(&mut self, product_id: &str) -> bool {
        self.open_details(product_id)
    }

    pub fn close_details(&mut self) {
        if let Some(mount) = self.page.find_by_id(MODAL_ID) {
            self.modal.close(&mut self.page, mount);
        }
    }

    // ------------------------------------------------------------------------
    // Editor shortcuts
    // ------------------------------------------------------------------------

    pub fn begin_text_edit(&mut self) -> bool {
        self.editor.begin_text_edit(&mut self.page)
    }

    pub fn panel_mut(&mut self) -> Option<&mut InspectorPanel> {
        self.editor.inspector_mut().panel_mut()
    }

    pub fn apply(&mut self, action: ApplyAction) -> Vec<(String, String)> {
        self.editor.apply(&mut self.page, action)
    }

    pub fn command(&mut self, command: EditorCommand) {
        self.run_native(NativeAction::Editor(command));
    }

    /// Clear all overrides and reload so the defaults show.
    pub fn reset_overrides(&mut self) {
        self.command(EditorCommand::Reset);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn layout(&self) -> PageLayout {
        self.layout
    }

    pub fn content(&self) -> &SiteContent {
        &self.content
    }

    pub fn catalog(&self) -> &DataManager {
        &self.catalog
    }

    pub fn modal(&self) -> &DetailModal {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut DetailModal {
        &mut self.modal
    }

    pub fn editor(&self) -> &EditController<S> {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditController<S> {
        &mut self.editor
    }

    pub fn notices(&self) -> &Notifier {
        &self.notices
    }

    pub fn active_filter(&self) -> &str {
        &self.active_filter
    }

    pub fn last_report(&self) -> &ApplyReport {
        &self.last_report
    }

    /// Native actions run so far, oldest first.
    pub fn effects(&self) -> &[SiteEffect] {
        &self.effects
    }

    pub fn card_count(&self) -> usize {
        self.page
            .get(self.layout.gallery)
            .map(|g| {
                g.children()
                    .iter()
                    .filter(|c| self.page.has_class(**c, "card"))
                    .count()
            })
            .unwrap_or(0)
    }

    pub fn to_html(&self) -> String {
        render::to_html(&self.page, &self.content.page_title)
    }
}

fn first_filter(content: &SiteContent) -> String {
    content
        .filters
        .first()
        .map(|f| f.filter.clone())
        .unwrap_or_else(|| "all".to_string())
}
