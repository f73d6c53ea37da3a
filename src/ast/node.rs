use serde::Serialize;

use super::position::Position;

/// Index of a node inside its [`Ast`](super::Ast) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Balancing and bookkeeping flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NodeFlags {
    /// Opens a nested set (`brace.open`, `paren.open`, ...).
    pub open: bool,
    /// Closes a nested set.
    pub close: bool,
    /// Recovered from an imbalance and should be rendered as literal text.
    pub escaped: bool,
    pub visited: bool,
}

/// One element of the tree.
///
/// `kind` and `value` are public and freely editable. The parent link and the
/// child list are only written through [`Ast`](super::Ast), which keeps the
/// "one parent, set once" invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: String,
    pub value: String,
    pub position: Option<Position>,
    pub flags: NodeFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<Vec<NodeId>>,
}

impl Node {
    /// A leaf node.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            position: None,
            flags: NodeFlags::default(),
            parent: None,
            children: None,
        }
    }

    /// A structural container with an empty child list.
    pub fn container(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            children: Some(Vec::new()),
            ..Self::new(kind, value)
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn is_container(&self) -> bool {
        self.children.is_some()
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Set name used for inside tracking: `brace.open` and `brace.close` both
    /// belong to `brace`; any other kind is its own set name.
    pub fn set_name(&self) -> &str {
        self.kind
            .strip_suffix(".open")
            .or_else(|| self.kind.strip_suffix(".close"))
            .unwrap_or(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_name_strips_open_and_close() {
        assert_eq!(Node::new("brace.open", "{").set_name(), "brace");
        assert_eq!(Node::new("brace.close", "}").set_name(), "brace");
        assert_eq!(Node::new("text", "a").set_name(), "text");
    }

    #[test]
    fn only_containers_have_children() {
        assert!(!Node::new("text", "a").is_container());
        assert!(Node::container("brace", "").is_container());
        assert!(Node::new("text", "a").children().is_empty());
    }
}
