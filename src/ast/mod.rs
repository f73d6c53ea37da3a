//! Arena-backed syntax tree.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Parent
//! links are plain indices, so the tree has no reference cycles and ancestor
//! lookups are O(1) per step.
//!
//! ```text
//! root
//! ├── bos
//! ├── text "a"
//! ├── brace
//! │   ├── brace.open "{"
//! │   ├── text "b"
//! │   └── brace.close "}"
//! └── eos
//! ```

pub mod node;
pub mod position;

pub use node::{Node, NodeFlags, NodeId};
pub use position::{Location, Position, Span};

use serde_json::{json, Value as JsonValue};
use std::sync::Arc;

use crate::errors::Error;

pub const ROOT: &str = "root";
pub const BOS: &str = "bos";
pub const EOS: &str = "eos";

/// A parsed tree plus the diagnostics recorded while producing it.
#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    root: NodeId,
    source: Arc<str>,
    input: Arc<str>,
    /// Recoverable errors queued in silent mode.
    pub errors: Vec<Error>,
}

impl Ast {
    /// Creates a tree holding only the root container.
    pub fn new(source: impl Into<Arc<str>>, input: impl Into<Arc<str>>) -> Self {
        Self {
            nodes: vec![Node::container(ROOT, "")],
            root: NodeId(0),
            source: source.into(),
            input: input.into(),
            errors: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Source id the tree was parsed under.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The original input string.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn try_get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Adds a detached node to the arena.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Attaches `child` to `parent`. The parent link is written once: a child
    /// that already has a parent (or the root itself) is left alone and
    /// `false` is returned. Appending to a leaf turns it into a container.
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child == self.root || child == parent || self.nodes[child.0].parent.is_some() {
            return false;
        }
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0]
            .children
            .get_or_insert_with(Vec::new)
            .push(child);
        true
    }

    /// Allocates `node` and appends it to `parent`.
    pub fn push(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.alloc(node);
        self.append(parent, id);
        id
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    /// Parent, grandparent, ... up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let idx = siblings.iter().position(|&c| c == id)?;
        idx.checked_sub(1).map(|i| siblings[i])
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let idx = siblings.iter().position(|&c| c == id)?;
        siblings.get(idx + 1).copied()
    }

    /// Depth-first pre-order walk starting at (and including) `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Kinds of the root's direct children, in order.
    pub fn kinds(&self) -> Vec<&str> {
        self.children(self.root)
            .iter()
            .map(|&id| self.get(id).kind.as_str())
            .collect()
    }

    /// Nested kinds of the whole tree in pre-order, root excluded.
    pub fn flat_kinds(&self) -> Vec<&str> {
        self.descendants(self.root)
            .into_iter()
            .skip(1)
            .map(|id| self.get(id).kind.as_str())
            .collect()
    }

    /// Drops every node allocated at or after `len` and any link to it.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.nodes.len() {
            return;
        }
        self.nodes.truncate(len);
        for node in &mut self.nodes {
            if let Some(children) = node.children.as_mut() {
                children.retain(|c| c.0 < len);
            }
        }
    }

    /// Serializes the tree as `{type, value, position, nodes}` objects.
    pub fn to_json(&self) -> JsonValue {
        self.node_to_json(self.root)
    }

    fn node_to_json(&self, id: NodeId) -> JsonValue {
        let node = self.get(id);
        let mut obj = json!({
            "type": node.kind,
            "value": node.value,
        });
        if let Some(pos) = &node.position {
            obj["position"] = json!({
                "start": pos.start,
                "end": pos.end,
                "source": &*pos.source,
            });
        }
        if node.flags.escaped {
            obj["escaped"] = JsonValue::Bool(true);
        }
        if let Some(children) = &node.children {
            obj["nodes"] = children.iter().map(|&c| self.node_to_json(c)).collect();
        }
        obj
    }
}
