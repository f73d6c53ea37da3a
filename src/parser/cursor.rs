//! Per-parse state handed to every rule.
//!
//! A [`Cursor`] owns the remaining input, the 1-based line/column of the
//! cursor, the tree under construction and the open-set stacks. Rules only
//! see this type, never the [`Parser`](super::Parser) itself.

use log::{trace, warn};
use std::collections::HashMap;
use std::sync::Arc;

use super::pattern::{Matched, Pattern};
use crate::ast::{Ast, Location, Node, NodeId, Position, Span, BOS, EOS};
use crate::errors::{Error, ErrorLocation, Result, SourceContext};
use crate::options::Options;

/// Kind given to literal fallback nodes and to recovered close tokens.
pub const TEXT: &str = "text";

/// Start of a node, captured by [`Cursor::position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    start: Location,
    offset: usize,
}

impl Mark {
    pub fn start(&self) -> Location {
        self.start
    }
}

/// Saved cursor state, used to undo a rule that produced a node without
/// consuming input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    offset: usize,
    location: Location,
    nodes: usize,
}

impl Checkpoint {
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }
}

pub struct Cursor<'p> {
    options: &'p Options,
    input: Arc<str>,
    source: Arc<str>,
    offset: usize,
    location: Location,
    ast: Ast,
    sets: HashMap<String, Vec<NodeId>>,
    /// Every open container in push order, innermost last.
    set_stack: Vec<(String, NodeId)>,
    rule: &'p str,
}

impl<'p> Cursor<'p> {
    pub(crate) fn new(options: &'p Options, input: &str) -> Self {
        let input: Arc<str> = Arc::from(input);
        let source: Arc<str> = Arc::from(options.source.as_str());
        let mut cursor = Self {
            options,
            ast: Ast::new(source.clone(), input.clone()),
            input,
            source,
            offset: 0,
            location: Location::default(),
            sets: HashMap::new(),
            set_stack: Vec::new(),
            rule: "",
        };
        let mark = cursor.position();
        let bos = cursor.node(mark, BOS, "");
        let root = cursor.ast.root();
        cursor.ast.append(root, bos);
        cursor
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    /// Input not consumed yet.
    pub fn rest(&self) -> &str {
        &self.input[self.offset..]
    }

    /// Everything consumed so far.
    pub fn parsed(&self) -> &str {
        &self.input[..self.offset]
    }

    /// The whole input of this parse.
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn is_eos(&self) -> bool {
        self.offset >= self.input.len()
    }

    pub fn options(&self) -> &Options {
        self.options
    }

    /// Kind of the rule currently running.
    pub fn rule(&self) -> &str {
        self.rule
    }

    pub(crate) fn set_rule(&mut self, kind: &'p str) {
        self.rule = kind;
    }

    fn consume(&mut self, len: usize) -> &str {
        let start = self.offset;
        let end = start + len;
        self.location.advance(&self.input[start..end]);
        self.offset = end;
        &self.input[start..end]
    }

    /// Matches `pattern` at the cursor and advances past the match.
    pub fn match_pattern(&mut self, pattern: &Pattern) -> Option<Matched> {
        let matched = pattern.match_start(self.rest())?;
        self.consume(matched.len());
        trace!("{} matched {:?} at {}", self.rule, matched.as_str(), self.location);
        Some(matched)
    }

    /// Returns the input up to `needle` and moves the cursor past `needle`.
    pub fn advance_to(&mut self, needle: &str) -> Option<String> {
        let idx = self.rest().find(needle)?;
        let value = self.rest()[..idx].to_string();
        self.consume(idx + needle.len());
        Some(value)
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Snapshots the current location as the start of a node.
    pub fn position(&self) -> Mark {
        Mark {
            start: self.location,
            offset: self.offset,
        }
    }

    /// Finishes `mark` at the current cursor.
    pub fn finish(&self, mark: Mark) -> Position {
        Position::new(mark.start, self.location, self.source.clone())
            .with_span(Span {
                start: mark.offset,
                end: self.offset,
            })
            .with_content(self.input.clone())
    }

    /// Allocates a positioned leaf node. It is attached later, either by
    /// [`push`](Self::push)/[`append`](Self::append) or by the parser once the
    /// rule returns it.
    pub fn node(&mut self, mark: Mark, kind: &str, value: impl Into<String>) -> NodeId {
        let position = self.finish(mark);
        self.ast.alloc(Node::new(kind, value).with_position(position))
    }

    /// Like [`node`](Self::node), using the running rule's kind.
    pub fn leaf(&mut self, mark: Mark, value: impl Into<String>) -> NodeId {
        let kind = self.rule;
        self.node(mark, kind, value)
    }

    /// Allocates a positioned container node.
    pub fn container(&mut self, mark: Mark, kind: &str, value: impl Into<String>) -> NodeId {
        let position = self.finish(mark);
        self.ast
            .alloc(Node::container(kind, value).with_position(position))
    }

    pub fn get(&self, id: NodeId) -> &Node {
        self.ast.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        self.ast.get_mut(id)
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> bool {
        self.ast.append(parent, child)
    }

    /// Node that new nodes attach to: the innermost open container, or the
    /// root.
    pub fn prev(&self) -> NodeId {
        self.set_stack
            .last()
            .map(|(_, id)| *id)
            .unwrap_or_else(|| self.ast.root())
    }

    /// Attaches `id` to [`prev`](Self::prev) unless it already has a parent.
    pub(crate) fn attach(&mut self, id: NodeId) {
        if id != self.ast.root() && self.ast.get(id).parent().is_none() {
            let parent = self.prev();
            self.ast.append(parent, id);
        }
    }

    // ------------------------------------------------------------------
    // Sets
    // ------------------------------------------------------------------

    /// Attaches `node` (if needed) and makes it the innermost open entry of
    /// set `name`.
    pub fn push(&mut self, name: &str, node: NodeId) {
        self.attach(node);
        self.sets.entry(name.to_string()).or_default().push(node);
        self.set_stack.push((name.to_string(), node));
    }

    /// Removes the innermost open entry of set `name`.
    pub fn pop(&mut self, name: &str) -> Option<NodeId> {
        let id = self.sets.get_mut(name)?.pop()?;
        if let Some(idx) = self.set_stack.iter().rposition(|(n, i)| n == name && *i == id) {
            self.set_stack.remove(idx);
        }
        Some(id)
    }

    pub fn is_inside(&self, name: &str) -> bool {
        self.depth(name) > 0
    }

    pub fn is_inside_any(&self) -> bool {
        !self.set_stack.is_empty()
    }

    /// True when the innermost open set is `name`.
    pub fn is_directly_inside(&self, name: &str) -> bool {
        self.set_stack.last().is_some_and(|(n, _)| n == name)
    }

    /// Current nesting depth of set `name`.
    pub fn depth(&self, name: &str) -> usize {
        self.sets.get(name).map_or(0, Vec::len)
    }

    /// Opens set `name`: flags `open_node`, nests it as the first child of
    /// `container` and pushes the container.
    pub fn open(&mut self, name: &str, container: NodeId, open_node: NodeId) {
        self.ast.get_mut(open_node).flags.open = true;
        self.ast.append(container, open_node);
        self.push(name, container);
    }

    /// Closes set `name` with `close_node`.
    ///
    /// With an open entry, the container is popped, `close_node` is flagged and
    /// appended to it, and the container is returned. Without one, strict mode
    /// fails with [`Error::ImbalancedSet`]; otherwise the node becomes escaped
    /// literal text and the stacks stay untouched.
    pub fn close(&mut self, name: &str, close_node: NodeId) -> Result<Option<NodeId>> {
        if let Some(container) = self.pop(name) {
            self.ast.get_mut(close_node).flags.close = true;
            self.ast.append(container, close_node);
            return Ok(Some(container));
        }

        let node = self.ast.get(close_node);
        let (at, span) = node
            .position
            .as_ref()
            .map_or((self.location, Span::default()), |p| (p.start, p.span));
        let err = Error::imbalanced_set(
            name,
            format!("missing opening {name:?} for {:?}", node.value),
            ErrorLocation::new(&*self.source, at),
            &self.source_context(),
            span,
        );
        if self.options.strict {
            return Err(err);
        }

        warn!("{err}; keeping it as literal text");
        let node = self.ast.get_mut(close_node);
        node.kind = TEXT.to_string();
        node.flags.escaped = true;
        self.record(err);
        Ok(None)
    }

    // ------------------------------------------------------------------
    // Errors and recovery
    // ------------------------------------------------------------------

    pub fn source_context(&self) -> SourceContext {
        SourceContext::new(&*self.source, self.input.clone())
    }

    pub fn error_location(&self) -> ErrorLocation {
        ErrorLocation::new(&*self.source, self.location)
    }

    /// Queues `err` on the tree when running silently.
    pub fn record(&mut self, err: Error) {
        if self.options.silent {
            self.ast.errors.push(err);
        }
    }

    /// Reports a rule error at the end of `node`, or at the cursor when no
    /// node is given. Silent mode queues it on the tree and returns `Ok`;
    /// otherwise the error is returned so the rule can abort the parse.
    pub fn error(&mut self, reason: impl Into<String>, node: Option<NodeId>) -> Result<()> {
        let err = match node {
            Some(id) => Error::custom(reason, self.ast.get(id), &self.source),
            None => Error::custom_at(
                reason,
                self.error_location(),
                &self.source_context(),
                Span {
                    start: self.offset,
                    end: self.offset,
                },
            ),
        };
        if self.options.silent {
            warn!("{err}");
            self.ast.errors.push(err);
            return Ok(());
        }
        Err(err)
    }

    pub(crate) fn unmatched_input(&self) -> Error {
        let found = self.rest().chars().next().unwrap_or('\0');
        Error::unmatched_input(
            found,
            self.error_location(),
            &self.source_context(),
            Span {
                start: self.offset,
                end: self.offset + found.len_utf8(),
            },
        )
    }

    /// Consumes one character as a literal `text` node.
    pub(crate) fn literal_fallback(&mut self) -> NodeId {
        let mark = self.position();
        let len = self.rest().chars().next().map_or(0, char::len_utf8);
        let value = self.consume(len).to_string();
        let id = self.node(mark, TEXT, value);
        self.ast.get_mut(id).flags.escaped = true;
        self.attach(id);
        id
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            offset: self.offset,
            location: self.location,
            nodes: self.ast.len(),
        }
    }

    /// Undoes consumption and allocations made since `cp`.
    pub(crate) fn rollback(&mut self, cp: Checkpoint) {
        self.offset = cp.offset;
        self.location = cp.location;
        if self.ast.len() > cp.nodes {
            self.ast.truncate(cp.nodes);
            let alive = |id: &NodeId| id.index() < cp.nodes;
            self.set_stack.retain(|(_, id)| alive(id));
            for stack in self.sets.values_mut() {
                stack.retain(alive);
            }
        }
    }

    /// Resolves sets still open at end of input, innermost first.
    pub(crate) fn balance_sets(&mut self) -> Result<()> {
        while let Some((name, id)) = self.set_stack.pop() {
            if let Some(stack) = self.sets.get_mut(&name) {
                stack.pop();
            }

            let (at, span) = self
                .ast
                .get(id)
                .position
                .as_ref()
                .map_or((self.location, Span::default()), |p| (p.start, p.span));
            let err = Error::imbalanced_set(
                &name,
                format!("imbalanced {name:?}: missing closing token"),
                ErrorLocation::new(&*self.source, at),
                &self.source_context(),
                span,
            );
            if self.options.strict {
                return Err(err);
            }

            warn!("{err}; escaping the open token");
            self.escape_orphan(id);
            self.record(err);
        }
        Ok(())
    }

    /// Flags an unclosed container, its open token and its ancestors (below
    /// the root) as escaped.
    fn escape_orphan(&mut self, container: NodeId) {
        let root = self.ast.root();
        let children = self.ast.children(container).to_vec();
        for child in children {
            let node = self.ast.get_mut(child);
            if node.flags.open {
                node.flags.open = false;
                node.flags.escaped = true;
            }
        }
        let chain: Vec<NodeId> = std::iter::once(container)
            .chain(self.ast.ancestors(container))
            .filter(|&id| id != root)
            .collect();
        for id in chain {
            let node = self.ast.get_mut(id);
            node.flags.escaped = true;
            node.flags.visited = true;
        }
    }

    /// Appends the end-of-string node to the root.
    pub(crate) fn push_eos(&mut self) {
        let mark = self.position();
        let eos = self.node(mark, EOS, "");
        let root = self.ast.root();
        self.ast.append(root, eos);
    }

    pub(crate) fn into_ast(self) -> Ast {
        self.ast
    }
}
