use tracing::debug;

use crate::editor::addressor::{AddressMap, ElementKey};
use crate::editor::category::EditableCategory;
use crate::editor::controls::{
    ColorControl, FontWeightControl, ImageUrlControl, SizeControl, SliderControl, StyleProperty,
};
use crate::editor::override_store::OverrideStore;
use crate::page::page_model::{NodeId, Page};
use crate::page::stylesheet::Stylesheet;
use crate::storage::kv::KeyValueStorage;

pub const SELECTED_CLASS: &str = "selected-element";
pub const SELECTED_OUTLINE: &str = "3px solid #f4d03f";
pub const CONTENT_EDITABLE_ATTR: &str = "contenteditable";

/// Groups of properties written by one "apply" button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyAction {
    Colors,
    Typography,
    Spacing,
    BackgroundImage,
    Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Enter { shift: bool },
    Escape,
    Other,
}

/// Outcome of ending a text edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEditEnd {
    Committed { key: ElementKey, markup: String },
    Cancelled { key: ElementKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub node: NodeId,
    pub key: ElementKey,
    pub category: EditableCategory,
}

/// In-place text editing of the selected element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditSession {
    pub node: NodeId,
    pub key: ElementKey,

    /// Content when the edit began
    pub before: String,

    /// Content is still fully selected; the next input replaces it
    pub select_all: bool,
}

/// Controls for the selected element, seeded from its computed style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectorPanel {
    pub text_color: ColorControl,
    pub background_color: ColorControl,
    pub font_size: SliderControl,
    pub font_weight: FontWeightControl,
    pub padding: SliderControl,
    pub margin: SliderControl,
    pub border_radius: SliderControl,
    pub width: SizeControl,
    pub height: SizeControl,

    /// Shows the "edit text" affordance
    pub can_edit_text: bool,

    /// Present for background-capable categories
    pub background_image: Option<ImageUrlControl>,
}

impl InspectorPanel {
    pub fn build(stylesheet: &Stylesheet, page: &Page, node: NodeId, category: EditableCategory) -> Self {
        let computed = stylesheet.computed(page, node);
        let capabilities = category.capabilities();

        InspectorPanel {
            text_color: ColorControl::from_computed(&computed.color),
            background_color: ColorControl::from_computed(&computed.background_color),
            font_size: SliderControl::new(8, 120, &computed.font_size),
            font_weight: FontWeightControl::from_computed(&computed.font_weight),
            padding: SliderControl::new(0, 100, &computed.padding),
            margin: SliderControl::new(0, 100, &computed.margin),
            border_radius: SliderControl::new(0, 50, &computed.border_radius),
            width: SizeControl::from_computed(&computed.width),
            height: SizeControl::from_computed(&computed.height),
            can_edit_text: capabilities.text,
            background_image: capabilities
                .background_image
                .then(ImageUrlControl::default),
        }
    }

    /// Property/value pairs an apply action writes.
    pub fn values(&self, action: ApplyAction) -> Vec<(StyleProperty, String)> {
        match action {
            ApplyAction::Colors => vec![
                (StyleProperty::Color, self.text_color.value().to_string()),
                (
                    StyleProperty::BackgroundColor,
                    self.background_color.value().to_string(),
                ),
            ],
            ApplyAction::Typography => vec![
                (StyleProperty::FontSize, self.font_size.css_value()),
                (StyleProperty::FontWeight, self.font_weight.css_value()),
            ],
            ApplyAction::Spacing => vec![
                (StyleProperty::Padding, self.padding.css_value()),
                (StyleProperty::Margin, self.margin.css_value()),
                (StyleProperty::BorderRadius, self.border_radius.css_value()),
            ],
            ApplyAction::BackgroundImage => match self.background_image.as_ref().and_then(|c| c.url()) {
                Some(url) => vec![
                    (StyleProperty::BackgroundImage, format!("url({})", url)),
                    (StyleProperty::BackgroundSize, "cover".to_string()),
                    (StyleProperty::BackgroundPosition, "center".to_string()),
                ],
                None => vec![],
            },
            ApplyAction::Size => {
                let mut out = vec![];
                if let Some(w) = self.width.css_value() {
                    out.push((StyleProperty::Width, w.to_string()));
                }
                if let Some(h) = self.height.css_value() {
                    out.push((StyleProperty::Height, h.to_string()));
                }
                out
            }
        }
    }
}

// ============================================================================
// Inspector
// ============================================================================

/// Selection, the panel and the text-edit sub-protocol.
#[derive(Default)]
pub struct Inspector {
    stylesheet: Stylesheet,
    selection: Option<Selection>,
    panel: Option<InspectorPanel>,
    text_edit: Option<TextEditSession>,
}

impl Inspector {
    pub fn new(stylesheet: Stylesheet) -> Self {
        Inspector {
            stylesheet,
            selection: None,
            panel: None,
            text_edit: None,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn panel(&self) -> Option<&InspectorPanel> {
        self.panel.as_ref()
    }

    pub fn panel_mut(&mut self) -> Option<&mut InspectorPanel> {
        self.panel.as_mut()
    }

    pub fn text_edit(&self) -> Option<&TextEditSession> {
        self.text_edit.as_ref()
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    /// Select a tagged element. Any text edit in progress is committed first
    /// and the previous element loses its selection marks.
    pub fn select<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        map: &AddressMap,
        store: &mut OverrideStore<S>,
        node: NodeId,
    ) -> Option<TextEditEnd> {
        let (Some(key), Some(category)) = (map.key_of(node).cloned(), map.category_of(node)) else {
            return None;
        };

        let flushed = self.finish_text_edit(page, store);
        self.deselect(page);

        page.add_class(node, SELECTED_CLASS);
        page.set_style(node, "outline", SELECTED_OUTLINE);
        self.panel = Some(InspectorPanel::build(&self.stylesheet, page, node, category));

        debug!("Selected {} ({})", key, category);
        self.selection = Some(Selection {
            node,
            key,
            category,
        });
        flushed
    }

    /// Remove the selection marks and the panel.
    pub fn deselect(&mut self, page: &mut Page) {
        if let Some(prev) = self.selection.take() {
            page.remove_class(prev.node, SELECTED_CLASS);
            page.remove_style(prev.node, "outline");
        }
        self.panel = None;
    }

    /// Closing the panel flushes the text edit and clears the selection.
    pub fn close_panel<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        store: &mut OverrideStore<S>,
    ) -> Option<TextEditEnd> {
        let flushed = self.finish_text_edit(page, store);
        self.deselect(page);
        flushed
    }

    /// Drop state pointing at elements that no longer exist.
    pub fn forget_stale(&mut self, page: &Page) {
        if self.text_edit.as_ref().is_some_and(|t| !page.contains_node(t.node)) {
            self.text_edit = None;
        }
        if self.selection.as_ref().is_some_and(|s| !page.contains_node(s.node)) {
            self.selection = None;
            self.panel = None;
        }
    }

    // ------------------------------------------------------------------------
    // Text editing
    // ------------------------------------------------------------------------

    /// Make the selected element editable in place. Returns false when
    /// nothing is selected or the category has no text.
    pub fn begin_text_edit(&mut self, page: &mut Page) -> bool {
        let Some(selection) = &self.selection else {
            return false;
        };
        if !selection.category.capabilities().text {
            return false;
        }
        if self.text_edit.as_ref().is_some_and(|t| t.node == selection.node) {
            return true;
        }

        let before = page.content(selection.node).unwrap_or_default().to_string();
        page.set_attr(selection.node, CONTENT_EDITABLE_ATTR, "true");
        page.set_style(selection.node, "cursor", "text");

        self.text_edit = Some(TextEditSession {
            node: selection.node,
            key: selection.key.clone(),
            before,
            select_all: true,
        });
        true
    }

    pub fn is_editing_text(&self, node: NodeId) -> bool {
        self.text_edit.as_ref().is_some_and(|t| t.node == node)
    }

    /// Typed input. The first input after `begin_text_edit` replaces the
    /// whole content; later input is appended at the caret (the end).
    pub fn input_text(&mut self, page: &mut Page, text: &str) {
        let Some(edit) = self.text_edit.as_mut() else {
            return;
        };

        let markup = if edit.select_all {
            edit.select_all = false;
            text.to_string()
        } else {
            format!("{}{}", page.content(edit.node).unwrap_or_default(), text)
        };
        page.set_content(edit.node, &markup);
    }

    /// Enter without Shift commits; Escape cancels. Shift+Enter inserts a
    /// line break.
    pub fn key_down<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        store: &mut OverrideStore<S>,
        key: TextKey,
    ) -> Option<TextEditEnd> {
        self.text_edit.as_ref()?;
        match key {
            TextKey::Enter { shift: false } => self.finish_text_edit(page, store),
            TextKey::Enter { shift: true } => {
                self.input_text(page, "<br>");
                None
            }
            TextKey::Escape => self.cancel_text_edit(page, store),
            TextKey::Other => None,
        }
    }

    /// Blur commits.
    pub fn blur<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        store: &mut OverrideStore<S>,
    ) -> Option<TextEditEnd> {
        self.finish_text_edit(page, store)
    }

    /// Commit the current markup into the store and leave edit mode for the
    /// element.
    pub fn finish_text_edit<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        store: &mut OverrideStore<S>,
    ) -> Option<TextEditEnd> {
        let edit = self.text_edit.take()?;
        if !page.contains_node(edit.node) {
            return None;
        }

        let markup = page.content(edit.node).unwrap_or_default().to_string();
        store.record_text(&edit.key, &markup);
        end_editable(page, edit.node);

        debug!("Committed text for {}", edit.key);
        Some(TextEditEnd::Committed {
            key: edit.key,
            markup,
        })
    }

    /// Revert to the last committed text (or the pre-edit content) without
    /// touching the store.
    pub fn cancel_text_edit<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        store: &OverrideStore<S>,
    ) -> Option<TextEditEnd> {
        let edit = self.text_edit.take()?;
        let restored = store.text(&edit.key).unwrap_or(&edit.before).to_string();
        page.set_content(edit.node, &restored);
        end_editable(page, edit.node);

        debug!("Cancelled text edit for {}", edit.key);
        Some(TextEditEnd::Cancelled { key: edit.key })
    }

    // ------------------------------------------------------------------------
    // Apply
    // ------------------------------------------------------------------------

    /// Write the action's values onto the selected element and into the
    /// store. Returns the pairs written; empty when there is no selection or
    /// nothing to write.
    pub fn apply<S: KeyValueStorage>(
        &mut self,
        page: &mut Page,
        store: &mut OverrideStore<S>,
        action: ApplyAction,
    ) -> Vec<(String, String)> {
        let (Some(selection), Some(panel)) = (&self.selection, &self.panel) else {
            return vec![];
        };

        let written: Vec<(String, String)> = panel
            .values(action)
            .into_iter()
            .map(|(prop, value)| (prop.as_str().to_string(), value))
            .collect();

        for (prop, value) in &written {
            page.set_style(selection.node, prop, value);
            store.record_style(&selection.key, prop, value);
        }
        written
    }
}

fn end_editable(page: &mut Page, node: NodeId) {
    page.remove_attr(node, CONTENT_EDITABLE_ATTR);
    page.remove_style(node, "cursor");
}
