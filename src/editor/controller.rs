use tracing::{debug, info, warn};

use crate::editor::addressor::{AddressMap, Addressor, EDITABLE_CLASS, KeyScheme};
use crate::editor::error::EditorError;
use crate::editor::inspector::{ApplyAction, Inspector, TextEditEnd, TextKey};
use crate::editor::override_store::{OverrideStore, PersistPolicy, SaveOutcome};
use crate::page::page_model::{NativeAction, NodeId, Page, PageNode};
use crate::page::selector::Selector;
use crate::site::notifier::Notifier;
use crate::storage::kv::KeyValueStorage;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::EditEvent;

pub const INDICATOR_ID: &str = "editModeIndicator";
pub const PANEL_ID: &str = "visualEditPanel";
pub const SAVE_BUTTON_ID: &str = "saveChangesBtn";
pub const RESET_BUTTON_ID: &str = "resetChangesBtn";
pub const EXIT_BUTTON_ID: &str = "exitEditMode";
pub const CLOSE_PANEL_BUTTON_ID: &str = "closeEditPanel";
pub const HOVER_OUTLINE: &str = "2px dashed #f4d03f";

const EDITOR_BUTTON_IDS: [&str; 4] = [
    SAVE_BUTTON_ID,
    RESET_BUTTON_ID,
    EXIT_BUTTON_ID,
    CLOSE_PANEL_BUTTON_ID,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Viewing,
    Editing,
}

/// Buttons of the editor's own UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    Save,
    Reset,
    Exit,
    ClosePanel,
}

/// Discrete input events delivered to the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Click,
    MouseEnter,
    MouseLeave,
    KeyDown(TextKey),
    Input(String),
    Blur,
}

/// Where the dispatcher sent an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// The innermost tagged element was selected
    Selection(NodeId),

    /// Click inside the element being text-edited
    Caret,

    /// The element's normal behavior should run
    Native,

    /// Pointer interaction is disabled for the target
    Suppressed,

    /// Consumed by the editor (hover, text input, key handling)
    Handled,

    /// Nothing to do
    Ignored,
}

/// Elements whose pointer interaction is disabled while editing.
fn denylist() -> Vec<Selector> {
    let mut editor_buttons = Selector::tag("button");
    for id in EDITOR_BUTTON_IDS {
        editor_buttons = editor_buttons.not_id(id);
    }
    vec![
        editor_buttons,
        Selector::tag("a"),
        Selector::class("card"),
        Selector::class("filter-btn"),
        Selector::class("hero__button"),
        Selector::class("card__button"),
    ]
}

// ============================================================================
// Controller
// ============================================================================

/// Owns the override store and drives the Viewing ⇄ Editing mode.
pub struct EditController<S: KeyValueStorage> {
    mode: EditMode,
    store: OverrideStore<S>,
    persist: PersistPolicy,
    addressor: Addressor,
    map: AddressMap,
    inspector: Inspector,
    notices: Notifier,
    tracer: Option<TraceLogger>,

    /// Prior inline `pointerEvents` of every element touched on entry
    pointer_record: Vec<(NodeId, Option<String>)>,
    hovered: Option<NodeId>,
}

impl<S: KeyValueStorage> EditController<S> {
    pub fn new(store: OverrideStore<S>, persist: PersistPolicy, scheme: KeyScheme, notices: Notifier) -> Self {
        EditController {
            mode: EditMode::Viewing,
            store,
            persist,
            addressor: Addressor::new(scheme),
            map: AddressMap::default(),
            inspector: Inspector::default(),
            notices,
            tracer: None,
            pointer_record: vec![],
            hovered: None,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == EditMode::Editing
    }

    pub fn store(&self) -> &OverrideStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut OverrideStore<S> {
        &mut self.store
    }

    pub fn inspector(&self) -> &Inspector {
        &self.inspector
    }

    pub fn inspector_mut(&mut self) -> &mut Inspector {
        &mut self.inspector
    }

    pub fn address_map(&self) -> &AddressMap {
        &self.map
    }

    pub fn addressor(&self) -> Addressor {
        self.addressor
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.inspector.selection().map(|s| s.node)
    }

    fn trace(&self, event: EditEvent) {
        if let Some(tracer) = &self.tracer {
            tracer.log(&event);
        }
    }

    // ------------------------------------------------------------------------
    // Mode transitions
    // ------------------------------------------------------------------------

    pub fn toggle(&mut self, page: &mut Page) {
        match self.mode {
            EditMode::Viewing => self.enter(page),
            EditMode::Editing => self.exit(page),
        }
    }

    pub fn enter(&mut self, page: &mut Page) {
        if self.is_editing() {
            return;
        }

        self.store.load();
        self.mode = EditMode::Editing;
        mount_indicator(page);

        self.map = self.addressor.tag(page);
        self.disable_pointers(page);

        info!("Edit mode on ({} editable elements)", self.map.len());
        self.notices.info("Edit mode enabled. Click an element to edit it.");
        self.trace(EditEvent::now("enter"));
    }

    pub fn exit(&mut self, page: &mut Page) {
        if !self.is_editing() {
            return;
        }

        let flushed = self.inspector.close_panel(page, &mut self.store);
        self.after_text_edit(flushed);
        self.clear_hover(page);

        for node in page.select_all(&Selector::class(EDITABLE_CLASS)) {
            page.remove_class(node, EDITABLE_CLASS);
        }
        for (node, prior) in std::mem::take(&mut self.pointer_record) {
            match prior {
                Some(value) => page.set_style(node, "pointerEvents", &value),
                None => page.remove_style(node, "pointerEvents"),
            }
        }
        for id in [INDICATOR_ID, PANEL_ID] {
            if let Some(node) = page.find_by_id(id) {
                page.remove(node);
            }
        }

        self.mode = EditMode::Viewing;
        info!("Edit mode off");
        self.trace(EditEvent::now("exit"));
    }

    fn disable_pointers(&mut self, page: &mut Page) {
        let editor_ui: Vec<NodeId> = [INDICATOR_ID, PANEL_ID]
            .iter()
            .filter_map(|id| page.find_by_id(id))
            .collect();

        let mut targets: Vec<NodeId> = vec![];
        for selector in denylist() {
            for node in page.select_all(&selector) {
                let in_editor_ui = editor_ui.iter().any(|ui| page.is_within(node, *ui));
                if !in_editor_ui && !targets.contains(&node) {
                    targets.push(node);
                }
            }
        }
        for node in targets {
            self.record_pointer(page, node);
            page.set_style(node, "pointerEvents", "none");
        }

        for node in self.map.nodes() {
            self.record_pointer(page, node);
            page.set_style(node, "pointerEvents", "auto");
            page.add_class(node, EDITABLE_CLASS);
        }
    }

    fn record_pointer(&mut self, page: &Page, node: NodeId) {
        if self.pointer_record.iter().any(|(n, _)| *n == node) {
            return;
        }
        let prior = page.style(node, "pointerEvents").map(str::to_string);
        self.pointer_record.push((node, prior));
    }

    /// Call after any re-render with the fresh address map. While editing,
    /// the new elements get the edit-mode treatment and state pointing at
    /// removed elements is dropped.
    pub fn after_render(&mut self, page: &mut Page, map: AddressMap) {
        self.map = map;
        self.inspector.forget_stale(page);
        if self.hovered.is_some_and(|h| !page.contains_node(h)) {
            self.hovered = None;
        }
        if self.is_editing() {
            self.pointer_record.retain(|(n, _)| page.contains_node(*n));
            self.disable_pointers(page);
        }
    }

    /// Forget everything tied to the current page without touching it. Used
    /// when the page is thrown away and rebuilt (a reload); edit mode does
    /// not survive that.
    pub fn discard_page_state(&mut self) {
        self.mode = EditMode::Viewing;
        self.map = AddressMap::default();
        self.inspector = Inspector::default();
        self.pointer_record.clear();
        self.hovered = None;
    }

    // ------------------------------------------------------------------------
    // Input dispatch
    // ------------------------------------------------------------------------

    pub fn dispatch(&mut self, page: &mut Page, target: NodeId, event: PageEvent) -> Routed {
        if !page.contains_node(target) {
            return Routed::Ignored;
        }

        match event {
            PageEvent::Click => self.route_click(page, target),
            PageEvent::MouseEnter => self.hover(page, target),
            PageEvent::MouseLeave => self.leave(page, target),
            PageEvent::KeyDown(key) => {
                if self.inspector.text_edit().is_none() {
                    return Routed::Ignored;
                }
                let ended = self.inspector.key_down(page, &mut self.store, key);
                self.after_text_edit(ended);
                Routed::Handled
            }
            PageEvent::Input(text) => {
                if self.inspector.text_edit().is_none() {
                    return Routed::Ignored;
                }
                self.inspector.input_text(page, &text);
                Routed::Handled
            }
            PageEvent::Blur => {
                if !self.inspector.is_editing_text(target) {
                    return Routed::Ignored;
                }
                let ended = self.inspector.blur(page, &mut self.store);
                self.after_text_edit(ended);
                Routed::Handled
            }
        }
    }

    fn route_click(&mut self, page: &mut Page, target: NodeId) -> Routed {
        if !self.is_editing() {
            return Routed::Native;
        }

        let in_editor_ui = [INDICATOR_ID, PANEL_ID]
            .iter()
            .filter_map(|id| page.find_by_id(id))
            .any(|ui| page.is_within(target, ui));
        if in_editor_ui {
            return Routed::Native;
        }

        if let Some(edit) = self.inspector.text_edit() {
            if page.is_within(target, edit.node) {
                return Routed::Caret;
            }
        }

        if let Some(node) = self.map.tagged_ancestor(page, target) {
            self.clear_hover(page);
            let flushed = self.inspector.select(page, &self.map, &mut self.store, node);
            self.after_text_edit(flushed);
            mount_panel(page, self.map.category_of(node).map(|c| c.name()).unwrap_or("element"));
            if let Some(key) = self.map.key_of(node) {
                self.trace(EditEvent::now("select").with_key(key));
            }
            return Routed::Selection(node);
        }

        if pointer_disabled(page, target) {
            Routed::Suppressed
        } else {
            Routed::Native
        }
    }

    fn hover(&mut self, page: &mut Page, target: NodeId) -> Routed {
        if !self.is_editing() {
            return Routed::Ignored;
        }
        let Some(node) = self.map.tagged_ancestor(page, target) else {
            return Routed::Ignored;
        };
        if self.hovered == Some(node) {
            return Routed::Handled;
        }

        self.clear_hover(page);
        if self.selected() != Some(node) {
            page.set_style(node, "outline", HOVER_OUTLINE);
            self.hovered = Some(node);
        }
        Routed::Handled
    }

    fn leave(&mut self, page: &mut Page, target: NodeId) -> Routed {
        if !self.is_editing() {
            return Routed::Ignored;
        }
        match self.map.tagged_ancestor(page, target) {
            Some(node) if self.hovered == Some(node) => {
                self.clear_hover(page);
                Routed::Handled
            }
            _ => Routed::Ignored,
        }
    }

    fn clear_hover(&mut self, page: &mut Page) {
        if let Some(node) = self.hovered.take() {
            if self.selected() != Some(node) {
                page.remove_style(node, "outline");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Editor actions
    // ------------------------------------------------------------------------

    pub fn begin_text_edit(&mut self, page: &mut Page) -> bool {
        self.is_editing() && self.inspector.begin_text_edit(page)
    }

    /// Run an inspector apply action on the selection.
    pub fn apply(&mut self, page: &mut Page, action: ApplyAction) -> Vec<(String, String)> {
        if !self.is_editing() {
            return vec![];
        }

        let written = self.inspector.apply(page, &mut self.store, action);
        if written.is_empty() {
            return written;
        }

        if let Some(key) = self.inspector.selection().map(|s| s.key.clone()) {
            self.trace(EditEvent::now("apply").with_key(&key).with_changes(&written));
        }
        self.notices.success("Changes applied");
        self.persist_change();
        written
    }

    fn after_text_edit(&mut self, ended: Option<TextEditEnd>) {
        match ended {
            Some(TextEditEnd::Committed { key, markup }) => {
                self.trace(EditEvent::now("commit_text").with_key(&key).with_detail(markup));
                self.persist_change();
            }
            Some(TextEditEnd::Cancelled { key }) => {
                self.trace(EditEvent::now("cancel_text").with_key(&key));
            }
            None => {}
        }
    }

    fn persist_change(&mut self) {
        if self.persist == PersistPolicy::EveryChange {
            if let Err(e) = self.store.save() {
                warn!("Could not persist change: {}", e);
                self.notices.error("Changes apply live but could not be saved");
            }
        }
    }

    /// Persist both maps. Failures never lose in-memory state; they surface
    /// as a notification.
    pub fn save(&mut self) -> Result<SaveOutcome, EditorError> {
        match self.store.save() {
            Ok(outcome) => {
                match outcome {
                    SaveOutcome::Persisted => self.notices.success("Changes saved"),
                    SaveOutcome::PersistedAfterTrim => self
                        .notices
                        .success("Changes saved (undo history cleared to free space)"),
                }
                self.trace(EditEvent::now("save"));
                Ok(outcome)
            }
            Err(e) => {
                warn!("Saving overrides failed: {}", e);
                self.notices
                    .error("Storage is full: changes apply live but will not persist");
                self.trace(EditEvent::now("save").with_detail(&e));
                Err(e)
            }
        }
    }

    /// Clear every override in memory and storage. The page keeps its
    /// current look until it is reloaded.
    pub fn reset(&mut self) -> Result<(), EditorError> {
        match self.store.reset() {
            Ok(()) => {
                self.notices.success("All changes reset. Reload the page to see the defaults.");
                self.trace(EditEvent::now("reset"));
                Ok(())
            }
            Err(e) => {
                self.notices.error("Could not reset changes");
                Err(e)
            }
        }
    }

    pub fn close_panel(&mut self, page: &mut Page) {
        let flushed = self.inspector.close_panel(page, &mut self.store);
        self.after_text_edit(flushed);
        if let Some(node) = page.find_by_id(PANEL_ID) {
            page.remove(node);
        }
    }

    /// Execute an editor UI button. Errors were already notified.
    pub fn handle_command(&mut self, page: &mut Page, command: EditorCommand) {
        debug!("Editor command {:?}", command);
        match command {
            EditorCommand::Save => {
                let _ = self.save();
            }
            EditorCommand::Reset => {
                let _ = self.reset();
            }
            EditorCommand::Exit => self.exit(page),
            EditorCommand::ClosePanel => self.close_panel(page),
        }
    }
}

/// Effective `pointer-events`: the nearest explicit inline value wins.
fn pointer_disabled(page: &Page, node: NodeId) -> bool {
    page.ancestors_or_self(node)
        .into_iter()
        .find_map(|a| page.style(a, "pointerEvents"))
        .is_some_and(|v| v == "none")
}

fn mount_indicator(page: &mut Page) {
    if page.find_by_id(INDICATOR_ID).is_some() {
        return;
    }
    let root = page.root();
    let Some(indicator) = page.append(
        root,
        PageNode::new("div")
            .with_id(INDICATOR_ID)
            .with_class("edit-mode-indicator"),
    ) else {
        return;
    };
    page.append(indicator, PageNode::new("span").with_content("Edit mode"));

    let buttons = [
        (SAVE_BUTTON_ID, "Save", EditorCommand::Save),
        (RESET_BUTTON_ID, "Reset", EditorCommand::Reset),
        (EXIT_BUTTON_ID, "Exit", EditorCommand::Exit),
    ];
    for (id, label, command) in buttons {
        page.append(
            indicator,
            PageNode::new("button")
                .with_id(id)
                .with_content(label)
                .with_action(NativeAction::Editor(command)),
        );
    }
}

fn mount_panel(page: &mut Page, title: &str) {
    if let Some(old) = page.find_by_id(PANEL_ID) {
        page.remove(old);
    }
    let root = page.root();
    let Some(panel) = page.append(
        root,
        PageNode::new("div")
            .with_id(PANEL_ID)
            .with_class("visual-edit-panel"),
    ) else {
        return;
    };
    page.append(
        panel,
        PageNode::new("h3").with_content(&format!("Editing: {}", title)),
    );
    page.append(
        panel,
        PageNode::new("button")
            .with_id(CLOSE_PANEL_BUTTON_ID)
            .with_content("&times;")
            .with_action(NativeAction::Editor(EditorCommand::ClosePanel)),
    );
}
