//! Ruleweave Compiler - per-type emission over a parsed tree.
//!
//! A [`Compiler`] maps node types to handlers. `compile` walks the tree once,
//! depth-first, and each handler decides what text its node contributes
//! through [`Visitor::emit`]. Types without a handler fall back to the
//! `unknown` handler when one is registered.
//!
//! ```
//! use ruleweave::{Compiler, Options, Parser};
//!
//! let mut parser = Parser::new(Options::default());
//! parser.capture("text", r"\w+").unwrap();
//! parser.capture("slash", r"/").unwrap();
//!
//! let mut compiler = Compiler::new(Options::default());
//! compiler
//!     .register("text", |v, id| v.emit_value(id))
//!     .unwrap()
//!     .register("slash", |v, id| v.emit("-", id))
//!     .unwrap();
//!
//! let ast = parser.parse("a/b/c").unwrap();
//! assert_eq!(compiler.compile(&ast).unwrap().output, "a-b-c");
//! ```

pub mod visitor;

pub use visitor::Visitor;

use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{Ast, NodeId, BOS, EOS};
use crate::errors::{Error, Result};
use crate::options::Options;
use crate::source_map::CompiledMap;

/// Handler fallback for types with no handler of their own.
pub const UNKNOWN: &str = "unknown";

pub type HandlerFn = dyn Fn(&mut Visitor<'_>, NodeId) -> Result<()> + Send + Sync;

/// Result of one compile run.
#[derive(Debug)]
pub struct CompileOutput {
    pub output: String,
    pub map: Option<CompiledMap>,
    /// Non-fatal diagnostics, e.g. input source maps that could not be read.
    pub errors: Vec<Error>,
}

#[derive(Clone)]
pub struct Compiler {
    options: Options,
    handlers: HashMap<String, Arc<HandlerFn>>,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("Compiler")
            .field("options", &self.options)
            .field("handlers", &kinds)
            .finish()
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Compiler {
    /// A compiler with the `bos` and `eos` handlers installed. Both emit the
    /// node value and may be replaced with [`set`](Self::set).
    pub fn new(options: Options) -> Self {
        let mut compiler = Self {
            options,
            handlers: HashMap::new(),
        };
        compiler.set(BOS, |v, id| v.emit_value(id));
        compiler.set(EOS, |v, id| v.emit_value(id));
        compiler
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Adds a handler for a new, non-empty type name.
    ///
    /// # Errors
    /// [`Error::InvalidHandlerRegistration`] if `kind` is empty or already
    /// has a handler.
    pub fn register<F>(&mut self, kind: &str, handler: F) -> Result<&mut Self>
    where
        F: Fn(&mut Visitor<'_>, NodeId) -> Result<()> + Send + Sync + 'static,
    {
        if kind.is_empty() {
            return Err(Error::InvalidHandlerRegistration {
                kind: kind.to_string(),
                reason: "handler type must not be empty".into(),
            });
        }
        if self.has(kind) {
            return Err(Error::InvalidHandlerRegistration {
                kind: kind.to_string(),
                reason: "a handler for this type is already registered".into(),
            });
        }
        self.handlers.insert(kind.to_string(), Arc::new(handler));
        Ok(self)
    }

    /// Adds or replaces a handler.
    pub fn set<F>(&mut self, kind: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Visitor<'_>, NodeId) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(kind.to_string(), Arc::new(handler));
        self
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<HandlerFn>> {
        self.handlers.get(kind)
    }

    pub fn has(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }

    /// The handler for `kind`, or the `unknown` fallback.
    pub fn resolve(&self, kind: &str) -> Option<&Arc<HandlerFn>> {
        self.get(kind).or_else(|| self.get(UNKNOWN))
    }

    /// Compiles `ast` with this compiler's options. The root itself has no
    /// handler; its children are visited in order.
    ///
    /// # Errors
    /// - [`Error::MissingHandler`] for a node type with no handler and no
    ///   `unknown` fallback, in every mode.
    /// - Any error a handler returns.
    pub fn compile(&self, ast: &Ast) -> Result<CompileOutput> {
        self.compile_with_options(ast, &self.options)
    }

    /// Compiles `ast` with per-call options.
    pub fn compile_with_options(&self, ast: &Ast, options: &Options) -> Result<CompileOutput> {
        debug!("compiling {} ({} nodes)", ast.source(), ast.len());
        let mut visitor = Visitor::new(self, ast, options);
        visitor.map_visit(ast.root())?;
        let out = visitor.finish()?;
        debug!(
            "compiled {}: {} bytes, map: {}, {} diagnostics",
            ast.source(),
            out.output.len(),
            out.map.is_some(),
            out.errors.len()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::errors::ErrorKind;

    #[test]
    fn bos_and_eos_are_preinstalled() {
        let compiler = Compiler::default();
        assert!(compiler.has(BOS) && compiler.has(EOS));
    }

    #[test]
    fn register_rejects_duplicates_and_empty_names() {
        let mut compiler = Compiler::default();
        compiler.register("text", |v, id| v.emit_value(id)).unwrap();
        let err = compiler.register("text", |_, _| Ok(())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandlerRegistration);
        assert!(compiler.register("", |_, _| Ok(())).is_err());
        assert!(compiler.register(BOS, |_, _| Ok(())).is_err());
    }

    #[test]
    fn resolve_falls_back_to_unknown() {
        let mut compiler = Compiler::default();
        assert!(compiler.resolve("text").is_none());
        compiler.set(UNKNOWN, |_, _| Ok(()));
        assert!(compiler.resolve("text").is_some());
    }

    #[test]
    fn compiles_hand_built_tree() {
        let mut ast = Ast::new("string", "ab");
        let root = ast.root();
        ast.push(root, Node::new("text", "a"));
        ast.push(root, Node::new("text", "b"));

        let mut compiler = Compiler::default();
        compiler.set("text", |v, id| {
            let upper = v.node(id).value.to_uppercase();
            v.emit(&upper, id)
        });
        assert_eq!(compiler.compile(&ast).unwrap().output, "AB");
    }
}
