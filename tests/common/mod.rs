//! # Ruleweave Test Helpers
//!
//! Small grammars shared by the integration tests.

#![allow(dead_code)]

use ruleweave::{Compiler, Engine, Options, Parser, Result};

/// Words and slashes: `a/b/c` tokenizes to `text slash text slash text`.
pub fn slash_parser(options: Options) -> Parser {
    let mut parser = Parser::new(options);
    parser
        .capture("text", r"\w+")
        .and_then(|p| p.capture("slash", "/"))
        .unwrap();
    parser
}

/// Compiler for [`slash_parser`] that joins words with `-`.
pub fn dash_compiler(options: Options) -> Compiler {
    let mut compiler = Compiler::new(options);
    compiler.set("text", |v, id| v.emit_value(id));
    compiler.set("slash", |v, id| v.emit("-", id));
    compiler
}

/// Balanced parentheses around free text. Every node re-emits its own value,
/// so compiling reproduces the input.
pub fn parens(engine: &mut Engine) -> Result<()> {
    let parser = engine.parser_mut();
    let open = ruleweave::Pattern::new(r"\(")?;
    parser.register("parens.open", move |cx| {
        let mark = cx.position();
        let Some(m) = cx.match_pattern(&open) else {
            return Ok(None);
        };
        let container = cx.container(mark, "parens", "");
        let node = cx.node(mark, "parens.open", m.into_string());
        cx.open("parens", container, node);
        Ok(Some(container))
    })?;

    let close = ruleweave::Pattern::new(r"\)")?;
    parser.register("parens.close", move |cx| {
        let mark = cx.position();
        let Some(m) = cx.match_pattern(&close) else {
            return Ok(None);
        };
        let node = cx.node(mark, "parens.close", m.into_string());
        Ok(Some(cx.close("parens", node)?.unwrap_or(node)))
    })?;
    parser.capture("newline", r"\n")?;
    parser.capture("text", r"[^()\n]+")?;

    let compiler = engine.compiler_mut();
    compiler.set("parens", |v, id| v.map_visit(id));
    for kind in ["parens.open", "parens.close", "newline", "text"] {
        compiler.set(kind, |v, id| v.emit_value(id));
    }
    Ok(())
}

pub fn parens_engine(options: Options) -> Engine {
    let mut engine = Engine::new(options);
    engine.use_plugin(parens).unwrap();
    engine
}

/// Lines of text and slashes, with `//` comments running to end of line.
pub fn commented(engine: &mut Engine) -> Result<()> {
    engine
        .parser_mut()
        .capture("comment", r"//[^\n]*")?
        .capture("newline", r"\n")?
        .capture("slash", "/")?
        .capture("text", r"[^/\n]+")?;
    let compiler = engine.compiler_mut();
    for kind in ["comment", "newline", "slash", "text"] {
        compiler.set(kind, |v, id| v.emit_value(id));
    }
    Ok(())
}

pub fn commented_engine(options: Options) -> Engine {
    let mut engine = Engine::new(options);
    engine.use_plugin(commented).unwrap();
    engine
}
