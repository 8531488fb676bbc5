use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::editor::controller::EditorCommand;
use crate::page::selector::Selector;

/// Handle to an element in a [`Page`]. Freed arena slots are reused under a
/// new generation, so a handle to a removed element simply stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// The element's normal (non-editor) click behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeAction {
    /// Open the detail modal for a catalog record
    OpenDetails { product_id: String },

    /// Re-render the gallery for a category filter ("all" shows everything)
    Filter { filter: String },

    /// Show the call / messenger popup
    ContactPopup,

    /// Hero call-to-action: jump to the trainers section
    ScrollToTrainers,

    /// Buttons of the editor's own UI
    Editor(EditorCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: BTreeMap<String, String>,

    /// Inline style, camelCase property → literal CSS value
    pub style: BTreeMap<String, String>,

    /// Inner markup of leaf elements
    pub content: String,

    pub action: Option<NativeAction>,

    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl PageNode {
    pub fn new(tag: &str) -> Self {
        PageNode {
            tag: tag.to_lowercase(),
            id: None,
            classes: vec![],
            attrs: BTreeMap::new(),
            style: BTreeMap::new(),
            content: String::new(),
            action: None,
            children: vec![],
            parent: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Add one or more space-separated classes.
    pub fn with_class(mut self, classes: &str) -> Self {
        for class in classes.split_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
            }
        }
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_style(mut self, property: &str, value: &str) -> Self {
        self.style.insert(property.to_string(), value.to_string());
        self
    }

    /// Set inner markup. Callers escape plain text themselves.
    pub fn with_content(mut self, markup: &str) -> Self {
        self.content = markup.to_string();
        self
    }

    pub fn with_action(mut self, action: NativeAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

// ============================================================================
// Page arena
// ============================================================================

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<PageNode>,
}

/// An element tree rooted at `<body>`.
///
/// Elements live in an arena; removing an element frees its whole subtree and
/// every handle into it stops resolving. Freed slots are recycled, so repeated
/// re-renders keep the arena at the size of the largest live tree. All
/// mutation helpers are no-ops on handles that no longer resolve.
#[derive(Debug, Clone)]
pub struct Page {
    slots: Vec<Slot>,
    free: Vec<usize>,
    root: NodeId,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        Page {
            slots: vec![Slot {
                generation: 0,
                node: Some(PageNode::new("body")),
            }],
            free: vec![],
            root: NodeId {
                index: 0,
                generation: 0,
            },
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&PageNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut PageNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Returns `None` when the parent no longer exists.
    pub fn append(&mut self, parent: NodeId, mut node: PageNode) -> Option<NodeId> {
        if !self.contains_node(parent) {
            return None;
        }

        node.parent = Some(parent);
        node.children.clear();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };

        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Remove an element and its subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }

        let parent = match self.get(id) {
            Some(node) => node.parent,
            None => return,
        };

        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|c| *c != id);
        }
        self.free_subtree(id);
    }

    /// Remove every child of `id` (the `innerHTML = ''` of the page model).
    pub fn clear_children(&mut self, id: NodeId) {
        let children = match self.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.free_subtree(child);
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(current.index)
                .filter(|slot| slot.generation == current.generation)
            else {
                continue;
            };
            if let Some(node) = slot.node.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
                stack.extend(node.children);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------------

    /// `id` followed by all its descendants, in document order.
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Every attached element in document order.
    pub fn document_order(&self) -> Vec<NodeId> {
        self.subtree(self.root)
    }

    pub fn select_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|id| self.get(*id).is_some_and(|n| selector.matches(n)))
            .collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<NodeId> {
        self.select_all(selector).into_iter().next()
    }

    pub fn find_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.select_first(&Selector::id(html_id))
    }

    /// `id` and then each ancestor up to the root.
    pub fn ancestors_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(node) = self.get(c) else {
                break;
            };
            out.push(c);
            current = node.parent;
        }
        out
    }

    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        self.ancestors_or_self(id)
            .into_iter()
            .find(|a| self.get(*a).is_some_and(|n| selector.matches(n)))
    }

    /// Whether `node` is `ancestor` or lies inside it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors_or_self(node).contains(&ancestor)
    }

    // ------------------------------------------------------------------------
    // Mutation helpers
    // ------------------------------------------------------------------------

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str) {
        if let Some(node) = self.get_mut(id) {
            node.style.insert(property.to_string(), value.to_string());
        }
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        if let Some(node) = self.get_mut(id) {
            node.style.remove(property);
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.style(property))
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.get_mut(id) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.get_mut(id) {
            node.attrs.remove(name);
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id).and_then(|n| n.attr(name))
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            if !node.has_class(class) {
                node.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if let Some(node) = self.get_mut(id) {
            node.classes.retain(|c| c != class);
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.get(id).is_some_and(|n| n.has_class(class))
    }

    pub fn content(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.content.as_str())
    }

    /// Replace the element's rendered content with `markup`, dropping any
    /// child elements.
    pub fn set_content(&mut self, id: NodeId, markup: &str) {
        if !self.contains_node(id) {
            return;
        }
        self.clear_children(id);
        if let Some(node) = self.get_mut(id) {
            node.content = markup.to_string();
        }
    }

    pub fn element_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Arena slots allocated, live or free.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}
