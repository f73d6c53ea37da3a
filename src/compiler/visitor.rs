//! Per-compile state handed to every handler.

use log::{trace, warn};
use std::collections::HashMap;

use super::{CompileOutput, Compiler};
use crate::ast::{Ast, Node, NodeId};
use crate::errors::{Error, Result};
use crate::options::Options;
use crate::source_map::{is_source_mapping_comment, SourceMapState};

/// Reserved type whose `sourceMappingURL` directives are dropped from the
/// output when source maps are on.
pub const COMMENT: &str = "comment";

pub struct Visitor<'a> {
    compiler: &'a Compiler,
    ast: &'a Ast,
    options: &'a Options,
    output: String,
    inside: HashMap<String, usize>,
    source_map: Option<SourceMapState>,
    errors: Vec<Error>,
}

impl<'a> Visitor<'a> {
    pub(crate) fn new(compiler: &'a Compiler, ast: &'a Ast, options: &'a Options) -> Self {
        Self {
            compiler,
            ast,
            options,
            output: String::new(),
            inside: HashMap::new(),
            source_map: options.sourcemap.is_enabled().then(SourceMapState::new),
            errors: Vec::new(),
        }
    }

    pub fn ast(&self) -> &'a Ast {
        self.ast
    }

    pub fn node(&self, id: NodeId) -> &'a Node {
        self.ast.get(id)
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// Output produced so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// True while visiting below an open node of set `name`.
    pub fn is_inside(&self, name: &str) -> bool {
        self.inside.get(name).is_some_and(|&n| n > 0)
    }

    pub fn source_map(&self) -> Option<&SourceMapState> {
        self.source_map.as_ref()
    }

    /// Dispatches `id` to its handler, keeping the inside counts of open and
    /// close nodes around the call.
    pub fn visit(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let node = ast.get(id);

        if self.source_map.is_some() && node.is(COMMENT) && is_source_mapping_comment(&node.value) {
            trace!("dropping sourceMappingURL comment");
            return self.noop(id);
        }

        let set = node.set_name();
        if node.flags.open {
            *self.inside.entry(set.to_string()).or_default() += 1;
        }

        let compiler = self.compiler;
        let handler = compiler
            .resolve(&node.kind)
            .ok_or_else(|| Error::missing_handler(node, ast.source()))?;
        handler(self, id)?;

        if node.flags.close {
            if let Some(depth) = self.inside.get_mut(set) {
                *depth = depth.saturating_sub(1);
            }
        }
        Ok(())
    }

    /// Visits the children of `id` in order.
    pub fn map_visit(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        for &child in ast.children(id) {
            self.visit(child)?;
        }
        Ok(())
    }

    /// Appends `text` to the output. With source maps on and a positioned
    /// node, a mapping to the node's start is recorded before the generated
    /// cursor moves.
    pub fn emit(&mut self, text: &str, id: NodeId) -> Result<()> {
        if let Some(state) = self.source_map.as_mut() {
            if let Some(position) = &self.ast.get(id).position {
                state.record(position);
            }
            state.advance(text);
        }
        self.output.push_str(text);
        Ok(())
    }

    /// Emits the node's own value.
    pub fn emit_value(&mut self, id: NodeId) -> Result<()> {
        let ast = self.ast;
        self.emit(&ast.get(id).value, id)
    }

    /// Emits nothing while still recording the node's mapping.
    pub fn noop(&mut self, id: NodeId) -> Result<()> {
        self.emit("", id)
    }

    /// Reports a handler error at the end of `id`. Silent mode queues it on
    /// the compile output and returns `Ok`; otherwise the error is returned so
    /// the handler can abort the compile.
    pub fn error(&mut self, reason: impl Into<String>, id: NodeId) -> Result<()> {
        let ast = self.ast;
        let err = Error::custom(reason, ast.get(id), ast.source());
        if self.options.silent {
            warn!("{err}");
            self.errors.push(err);
            return Ok(());
        }
        Err(err)
    }

    pub(crate) fn finish(self) -> Result<CompileOutput> {
        let mut errors = self.errors;
        let map = match self.source_map {
            Some(state) => {
                let (map, diagnostics) = state.finalize(self.options)?;
                errors.extend(diagnostics);
                map
            }
            None => None,
        };
        Ok(CompileOutput {
            output: self.output,
            map,
            errors,
        })
    }
}
