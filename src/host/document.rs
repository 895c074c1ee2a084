//! Document - In-memory retained node tree.
//!
//! A minimal DOM: text and element nodes, properties, per-type listeners and
//! ordered children. Listeners fire only on the node they are attached to.
//!
//! An optional mutation log records every call made through [`Host`], which is
//! how tests observe exactly what a commit did.
//!
//! Removing a child frees it and everything under it, listeners included.
//! [`Document::retain_detached`] keeps removed subtrees addressable instead.

use std::collections::BTreeMap;

use slotmap::SlotMap;

use super::Host;
use crate::element::{EventHandler, NODE_VALUE, PropValue};
use crate::types::HostEvent;

slotmap::new_key_type! {
    /// Key of a node in a [`Document`].
    pub struct NodeId;
}

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Element(String),
}

/// One node of the document.
#[derive(Debug)]
pub struct DocNode {
    pub kind: NodeKind,
    pub properties: BTreeMap<String, PropValue>,
    pub listeners: Vec<(String, EventHandler)>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl DocNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            properties: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            NodeKind::Text => None,
        }
    }
}

/// A recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    CreateText { node: NodeId, text: String },
    CreateElement { node: NodeId, tag: String },
    SetProperty { node: NodeId, name: String, value: Option<PropValue> },
    AddListener { node: NodeId, event: String },
    RemoveListener { node: NodeId, event: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug, Default)]
pub struct Document {
    nodes: SlotMap<NodeId, DocNode>,
    log: Option<Vec<Mutation>>,
    retain_detached: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document that records every mutation.
    pub fn with_mutation_log() -> Self {
        Self {
            log: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Keep removed and discarded nodes alive so they can still be queried.
    pub fn retain_detached(mut self) -> Self {
        self.retain_detached = true;
        self
    }

    /// Number of live nodes, containers included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a container element to render into. Not logged.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(DocNode::new(NodeKind::Element(tag.to_string())))
    }

    /// Drain the mutation log.
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        self.log.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn record(&mut self, mutation: Mutation) {
        if let Some(log) = self.log.as_mut() {
            log.push(mutation);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&DocNode> {
        self.nodes.get(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut DocNode, DocumentError> {
        self.nodes.get_mut(id).ok_or(DocumentError::UnknownNode(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn property(&self, id: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(id)?.properties.get(name)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn listener_count(&self, id: NodeId, event: &str) -> usize {
        self.nodes
            .get(id)
            .map(|n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Concatenated text of every text node under `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else { return };
        match node.kind {
            NodeKind::Text => {
                if let Some(value) = node.properties.get(NODE_VALUE) {
                    out.push_str(&value.to_text());
                }
            }
            NodeKind::Element(_) => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// Every node under `root` (root excluded), pre-order.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Every element with `tag` under `root`, pre-order.
    pub fn find_all_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.nodes.get(id).and_then(DocNode::tag) == Some(tag))
            .collect()
    }

    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_all_by_tag(root, tag).into_iter().next()
    }

    /// Fire `event` on `id`. Returns how many listeners ran.
    ///
    /// Handlers are cloned out first so they may freely schedule updates.
    pub fn dispatch(&self, id: NodeId, event: &HostEvent) -> usize {
        let handlers: Vec<EventHandler> = match self.nodes.get(id) {
            Some(node) => node
                .listeners
                .iter()
                .filter(|(kind, _)| *kind == event.kind)
                .map(|(_, handler)| handler.clone())
                .collect(),
            None => return 0,
        };

        for handler in &handlers {
            handler.call(event);
        }
        handlers.len()
    }

    /// Free `root` and every node under it.
    fn free_subtree(&mut self, root: NodeId) -> usize {
        let mut freed = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(id) {
                stack.extend(node.children);
                freed += 1;
            }
        }
        freed
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get(child).and_then(|n| n.parent) else { return };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&c| c != child);
        }
        if let Some(child) = self.nodes.get_mut(child) {
            child.parent = None;
        }
    }
}

// =============================================================================
// Host Implementation
// =============================================================================

impl Host for Document {
    type Node = NodeId;
    type Error = DocumentError;

    fn create_text_node(&mut self, text: &str) -> Result<NodeId, DocumentError> {
        let mut node = DocNode::new(NodeKind::Text);
        node.properties.insert(NODE_VALUE.to_string(), PropValue::from(text));
        let id = self.nodes.insert(node);
        self.record(Mutation::CreateText { node: id, text: text.to_string() });
        Ok(id)
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DocumentError> {
        let id = self.nodes.insert(DocNode::new(NodeKind::Element(tag.to_string())));
        self.record(Mutation::CreateElement { node: id, tag: tag.to_string() });
        Ok(id)
    }

    fn set_property(&mut self, node: &NodeId, name: &str, value: Option<&PropValue>) -> Result<(), DocumentError> {
        let stored = value.cloned().unwrap_or_else(|| PropValue::Str(String::new()));
        self.node_mut(*node)?.properties.insert(name.to_string(), stored);
        self.record(Mutation::SetProperty {
            node: *node,
            name: name.to_string(),
            value: value.cloned(),
        });
        Ok(())
    }

    fn add_event_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) -> Result<(), DocumentError> {
        self.node_mut(*node)?.listeners.push((event.to_string(), handler.clone()));
        self.record(Mutation::AddListener { node: *node, event: event.to_string() });
        Ok(())
    }

    fn remove_event_listener(&mut self, node: &NodeId, event: &str, handler: &EventHandler) -> Result<(), DocumentError> {
        self.node_mut(*node)?
            .listeners
            .retain(|(kind, existing)| !(kind == event && existing == handler));
        self.record(Mutation::RemoveListener { node: *node, event: event.to_string() });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DocumentError> {
        if !self.nodes.contains_key(*child) {
            return Err(DocumentError::UnknownNode(*child));
        }
        self.node_mut(*parent)?;
        self.detach(*child);

        self.node_mut(*parent)?.children.push(*child);
        self.node_mut(*child)?.parent = Some(*parent);
        self.record(Mutation::AppendChild { parent: *parent, child: *child });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DocumentError> {
        let parent_node = self.node_mut(*parent)?;
        let Some(pos) = parent_node.children.iter().position(|c| c == child) else {
            return Err(DocumentError::NotAChild { parent: *parent, child: *child });
        };
        parent_node.children.remove(pos);
        self.node_mut(*child)?.parent = None;
        self.record(Mutation::RemoveChild { parent: *parent, child: *child });

        if !self.retain_detached {
            self.free_subtree(*child);
        }
        Ok(())
    }

    fn discard(&mut self, node: &NodeId) -> Result<(), DocumentError> {
        let parent = self.nodes.get(*node).ok_or(DocumentError::UnknownNode(*node))?.parent;
        if parent.is_none() && !self.retain_detached {
            self.free_subtree(*node);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
