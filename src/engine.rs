//! The [`Engine`] pairs one [`Parser`] and one [`Compiler`] under shared
//! [`Options`], so a grammar can be installed once and reused for every
//! input.
//!
//! ```
//! use ruleweave::{grammars, Engine, Options};
//!
//! let mut engine = Engine::new(Options::default());
//! engine.use_plugin(grammars::braces::plugin).unwrap();
//!
//! let out = engine.transform("a/{b,c}.txt").unwrap();
//! assert_eq!(out.output, r"a\/(b|c)\.txt");
//! ```

use log::debug;

use crate::ast::Ast;
use crate::compiler::{CompileOutput, Compiler};
use crate::errors::Result;
use crate::options::Options;
use crate::parser::Parser;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    options: Options,
    parser: Parser,
    compiler: Compiler,
}

impl Engine {
    pub fn new(options: Options) -> Self {
        Self {
            parser: Parser::new(options.clone()),
            compiler: Compiler::new(options.clone()),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Replaces the options of the engine, its parser and its compiler.
    pub fn set_options(&mut self, options: Options) -> &mut Self {
        *self.parser.options_mut() = options.clone();
        *self.compiler.options_mut() = options.clone();
        self.options = options;
        self
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut Parser {
        &mut self.parser
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn compiler_mut(&mut self) -> &mut Compiler {
        &mut self.compiler
    }

    /// Runs `plugin` against the engine, typically to register a grammar's
    /// rules and handlers.
    pub fn use_plugin<F>(&mut self, plugin: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Engine) -> Result<()>,
    {
        plugin(self)?;
        debug!(
            "plugin installed: {} rules, options source {}",
            self.parser.kinds().count(),
            self.options.source
        );
        Ok(self)
    }

    pub fn parse(&self, input: &str) -> Result<Ast> {
        self.parser.parse(input)
    }

    pub fn compile(&self, ast: &Ast) -> Result<CompileOutput> {
        self.compiler.compile(ast)
    }

    /// Parses and compiles `input`. Errors recorded on the tree in silent
    /// mode are moved into [`CompileOutput::errors`] ahead of compile
    /// diagnostics.
    pub fn transform(&self, input: &str) -> Result<CompileOutput> {
        let mut ast = self.parse(input)?;
        let mut out = self.compile(&ast)?;
        let mut errors = std::mem::take(&mut ast.errors);
        errors.append(&mut out.errors);
        out.errors = errors;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SourceMapMode;

    fn slashes(engine: &mut Engine) -> Result<()> {
        engine.parser_mut().capture("text", r"\w+")?.capture("slash", "/")?;
        engine
            .compiler_mut()
            .register("text", |v, id| v.emit_value(id))?
            .register("slash", |v, id| v.emit("-", id))?;
        Ok(())
    }

    #[test]
    fn plugin_installs_rules_and_handlers() {
        let mut engine = Engine::default();
        engine.use_plugin(slashes).unwrap();
        assert_eq!(engine.transform("a/b/c").unwrap().output, "a-b-c");
    }

    #[test]
    fn plugin_errors_propagate() {
        let mut engine = Engine::default();
        engine.use_plugin(slashes).unwrap();
        assert!(engine.use_plugin(slashes).is_err());
    }

    #[test]
    fn set_options_reaches_parser_and_compiler() {
        let mut engine = Engine::default();
        engine.set_options(Options::new().with_source("x.txt").sourcemap(SourceMapMode::Json));
        assert_eq!(engine.parser().options().source, "x.txt");
        assert_eq!(engine.compiler().options().sourcemap, SourceMapMode::Json);
    }

    #[test]
    fn transform_collects_silent_parse_errors() {
        let mut engine = Engine::new(Options::new().silent(true));
        engine.use_plugin(slashes).unwrap();
        engine.compiler_mut().set("text", |v, id| v.emit_value(id));
        let out = engine.transform("a/?").unwrap();
        assert_eq!(out.output, "a-?");
        assert_eq!(out.errors.len(), 1);
    }
}
