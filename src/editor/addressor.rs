use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::category::{EditableCategory, key_tag};
use crate::page::page_model::{NodeId, Page};
use crate::page::selector::Selector;

pub const EDIT_ID_ATTR: &str = "data-edit-id";
pub const EDIT_TYPE_ATTR: &str = "data-edit-type";
pub const EDITABLE_CLASS: &str = "editable-element";

/// Stable address of an editable element, e.g. `herotitle-0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementKey(String);

impl ElementKey {
    pub fn new(key: impl Into<String>) -> Self {
        ElementKey(key.into())
    }

    /// `{tag}-{ordinal}`
    pub fn ordinal(tag: &str, index: usize) -> Self {
        ElementKey(format!("{}-{}", tag, index))
    }

    /// `{tag}@{record id}-{ordinal within the record}`
    pub fn record(tag: &str, record_id: &str, index: usize) -> Self {
        ElementKey(format!("{}@{}-{}", tag, record_id, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementKey {
    fn from(s: &str) -> Self {
        ElementKey(s.to_string())
    }
}

/// How keys are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    /// Category tag + position among same-class elements in document order.
    /// Removing or reordering elements shifts later keys.
    #[default]
    Ordinal,

    /// Card-scoped elements are keyed by the enclosing card's
    /// `data-product-id`; everything else falls back to ordinals.
    RecordId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedElement {
    pub node: NodeId,
    pub category: EditableCategory,
}

/// Result of one tagging pass: key ↔ element, both directions.
#[derive(Debug, Clone, Default)]
pub struct AddressMap {
    by_key: BTreeMap<ElementKey, TaggedElement>,
    by_node: HashMap<NodeId, ElementKey>,
}

impl AddressMap {
    pub fn resolve(&self, key: &ElementKey) -> Option<NodeId> {
        self.by_key.get(key).map(|t| t.node)
    }

    pub fn key_of(&self, node: NodeId) -> Option<&ElementKey> {
        self.by_node.get(&node)
    }

    pub fn category_of(&self, node: NodeId) -> Option<EditableCategory> {
        let key = self.by_node.get(&node)?;
        self.by_key.get(key).map(|t| t.category)
    }

    pub fn is_tagged(&self, node: NodeId) -> bool {
        self.by_node.contains_key(&node)
    }

    /// Innermost tagged element containing `node` (itself included).
    pub fn tagged_ancestor(&self, page: &Page, node: NodeId) -> Option<NodeId> {
        page.ancestors_or_self(node)
            .into_iter()
            .find(|a| self.is_tagged(*a))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementKey, &TaggedElement)> {
        self.by_key.iter()
    }

    pub fn nodes(&self) -> Vec<NodeId> {
        self.by_key.values().map(|t| t.node).collect()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    fn insert(&mut self, key: ElementKey, tagged: TaggedElement) {
        if let Some(previous) = self.by_node.insert(tagged.node, key.clone()) {
            self.by_key.remove(&previous);
        }
        self.by_key.insert(key, tagged);
    }
}

// ============================================================================
// Addressor
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct Addressor {
    scheme: KeyScheme,
}

impl Addressor {
    pub fn new(scheme: KeyScheme) -> Self {
        Addressor { scheme }
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// Assign a key to every element of every editable category and write it
    /// to `data-edit-id` / `data-edit-type`. Safe to re-run after any
    /// re-render; markers from a previous pass are cleared first.
    pub fn tag(&self, page: &mut Page) -> AddressMap {
        for stale in page.select_all(&Selector::default().with_attr(EDIT_ID_ATTR, None)) {
            page.remove_attr(stale, EDIT_ID_ATTR);
            page.remove_attr(stale, EDIT_TYPE_ATTR);
        }

        let mut map = AddressMap::default();
        let mut per_record: HashMap<(String, String), usize> = HashMap::new();

        for category in EditableCategory::ALL {
            for class in category.classes() {
                let tag = key_tag(class);

                for (index, node) in page.select_all(&Selector::class(class)).into_iter().enumerate() {
                    let key = match self.record_id(page, node, category) {
                        Some(record) => {
                            let counter = per_record.entry((tag.clone(), record.clone())).or_insert(0);
                            let key = ElementKey::record(&tag, &record, *counter);
                            *counter += 1;
                            key
                        }
                        None => ElementKey::ordinal(&tag, index),
                    };

                    page.set_attr(node, EDIT_ID_ATTR, key.as_str());
                    page.set_attr(node, EDIT_TYPE_ATTR, category.edit_type());
                    map.insert(key, TaggedElement { node, category });
                }
            }
        }

        debug!("Addressed {} editable elements", map.len());
        map
    }

    fn record_id(&self, page: &Page, node: NodeId, category: EditableCategory) -> Option<String> {
        if self.scheme != KeyScheme::RecordId || !category.is_card_scoped() {
            return None;
        }
        let card = page.closest(node, &Selector::class("card"))?;
        page.attr(card, "data-product-id")
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}
