//! Ruleweave Parser - ordered, regex-driven rule dispatch.
//!
//! A [`Parser`] holds a per-instance registry of rules. `parse` runs them in
//! registration order at every cursor position; the first rule that returns a
//! node *and* consumes input wins. Nested constructs are balanced through the
//! set stacks on [`Cursor`].
//!
//! ```
//! use ruleweave::{Options, Parser};
//!
//! let mut parser = Parser::new(Options::default());
//! parser.capture("text", r"\w+").unwrap();
//! parser.capture("slash", r"/").unwrap();
//!
//! let ast = parser.parse("a/b").unwrap();
//! assert_eq!(ast.kinds(), ["bos", "text", "slash", "text", "eos"]);
//! ```
//!
//! Every call to `parse` is independent: the registry is only read, and each
//! run builds its own cursor, sets and tree.

pub mod cursor;
pub mod pattern;

pub use cursor::{Cursor, Mark, TEXT};
pub use pattern::{Matched, Pattern};

use log::{debug, trace, warn};
use std::fmt;
use std::sync::Arc;

use crate::ast::{Ast, NodeId};
use crate::errors::{Error, Result};
use crate::options::Options;

/// A rule inspects the cursor and, on success, returns the node it produced.
/// Returning `Ok(None)` means "no match here".
pub type RuleFn = dyn Fn(&mut Cursor<'_>) -> Result<Option<NodeId>> + Send + Sync;

/// A named entry in the parser's registry.
#[derive(Clone)]
pub struct Rule {
    kind: String,
    func: Arc<RuleFn>,
}

impl Rule {
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("kind", &self.kind).finish()
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    options: Options,
    rules: Vec<Rule>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Parser {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            rules: Vec::new(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    // ========================================================================
    // REGISTRY
    // ========================================================================

    /// Adds a rule under a new, non-empty type name.
    ///
    /// # Errors
    /// [`Error::InvalidRuleRegistration`] if `kind` is empty or already taken.
    pub fn register<F>(&mut self, kind: &str, func: F) -> Result<&mut Self>
    where
        F: Fn(&mut Cursor<'_>) -> Result<Option<NodeId>> + Send + Sync + 'static,
    {
        if kind.is_empty() {
            return Err(Error::InvalidRuleRegistration {
                kind: kind.to_string(),
                reason: "rule type must not be empty".into(),
            });
        }
        if self.has(kind) {
            return Err(Error::InvalidRuleRegistration {
                kind: kind.to_string(),
                reason: "a rule with this type is already registered".into(),
            });
        }
        self.rules.push(Rule {
            kind: kind.to_string(),
            func: Arc::new(func),
        });
        Ok(self)
    }

    /// Adds or replaces a rule. A replaced rule keeps its place in the
    /// dispatch order.
    pub fn set<F>(&mut self, kind: &str, func: F) -> &mut Self
    where
        F: Fn(&mut Cursor<'_>) -> Result<Option<NodeId>> + Send + Sync + 'static,
    {
        let rule = Rule {
            kind: kind.to_string(),
            func: Arc::new(func),
        };
        match self.rules.iter_mut().find(|r| r.kind == kind) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
        self
    }

    /// Registers a rule that matches `pattern` and yields a leaf of type
    /// `kind` whose value is the matched text.
    pub fn capture(&mut self, kind: &str, pattern: &str) -> Result<&mut Self> {
        let pattern = Pattern::new(pattern)?;
        self.register(kind, move |cx| {
            let mark = cx.position();
            Ok(cx
                .match_pattern(&pattern)
                .map(|m| cx.leaf(mark, m.into_string())))
        })
    }

    pub fn get(&self, kind: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.kind == kind)
    }

    pub fn has(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// Registered types in dispatch order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.kind.as_str())
    }

    // ========================================================================
    // PARSING
    // ========================================================================

    /// Parses `input` into a tree bracketed by `bos` and `eos`.
    ///
    /// # Errors
    /// - [`Error::UnmatchedInput`] when no rule matches and the parser is not
    ///   silent (or is strict).
    /// - [`Error::ImbalancedSet`] in strict mode for stray closes or unclosed
    ///   opens.
    /// - Any error a rule returns.
    pub fn parse(&self, input: &str) -> Result<Ast> {
        debug!(
            "parsing {} ({} bytes, {} rules)",
            self.options.source,
            input.len(),
            self.rules.len()
        );
        let mut cursor = Cursor::new(&self.options, input);

        while !cursor.is_eos() {
            self.advance(&mut cursor)?;
        }

        cursor.balance_sets()?;
        cursor.push_eos();

        let ast = cursor.into_ast();
        debug!(
            "parsed {}: {} nodes, {} recorded errors",
            self.options.source,
            ast.len(),
            ast.errors.len()
        );
        Ok(ast)
    }

    /// Runs the rules once and attaches the produced node.
    fn advance<'p>(&'p self, cursor: &mut Cursor<'p>) -> Result<()> {
        if let Some(id) = self.next_node(cursor)? {
            cursor.attach(id);
            return Ok(());
        }

        let err = cursor.unmatched_input();
        if self.options.silent && !self.options.strict {
            warn!("{err}; consuming it as literal text");
            cursor.record(err);
            cursor.literal_fallback();
            Ok(())
        } else {
            Err(err)
        }
    }

    /// First node produced by a rule that also moved the cursor.
    fn next_node<'p>(&'p self, cursor: &mut Cursor<'p>) -> Result<Option<NodeId>> {
        for rule in &self.rules {
            let checkpoint = cursor.checkpoint();
            cursor.set_rule(&rule.kind);
            let produced = (rule.func)(cursor)?;
            let moved = cursor.offset() > checkpoint.offset();

            match produced {
                Some(id) if moved => return Ok(Some(id)),
                Some(_) => {
                    trace!("{} produced a node without consuming input; ignored", rule.kind);
                    cursor.rollback(checkpoint);
                }
                None if moved => cursor.rollback(checkpoint),
                None => {}
            }
        }
        Ok(None)
    }
}
