//! Brace patterns to regular-expression source.
//!
//! `a/{b,c}.txt` compiles to `a\/(b|c)\.txt`. Braces nest, commas only
//! become alternations inside a brace set, and `\x` escapes pass through
//! untouched. An unclosed `{` or a stray `}` is kept as escaped literal text.
//!
//! | type          | matches            | emits                      |
//! |---------------|--------------------|----------------------------|
//! | `escape`      | `\x`               | value                      |
//! | `brace.open`  | `{`                | `(`, or `\{` when escaped  |
//! | `brace.close` | `}`                | `)`                        |
//! | `comma`       | `,`                | `\|` inside braces, else `,` |
//! | `slash`       | `/`                | `\/`                       |
//! | `dot`         | `.`                | `\.`                       |
//! | `text`        | anything else      | value, regex-escaped if recovered |

use crate::compiler::Compiler;
use crate::engine::Engine;
use crate::errors::Result;
use crate::parser::{Parser, Pattern};

pub const BRACE: &str = "brace";

/// Installs the rules and handlers on `engine`.
pub fn plugin(engine: &mut Engine) -> Result<()> {
    register_rules(engine.parser_mut())?;
    register_handlers(engine.compiler_mut())
}

pub fn register_rules(parser: &mut Parser) -> Result<()> {
    parser.capture("escape", r"\\(?s:.)")?;

    let open = Pattern::new(r"\{")?;
    parser.register("brace.open", move |cx| {
        let mark = cx.position();
        let Some(m) = cx.match_pattern(&open) else {
            return Ok(None);
        };
        let brace = cx.container(mark, BRACE, "");
        let node = cx.node(mark, "brace.open", m.into_string());
        cx.open(BRACE, brace, node);
        Ok(Some(brace))
    })?;

    let close = Pattern::new(r"\}")?;
    parser.register("brace.close", move |cx| {
        let mark = cx.position();
        let Some(m) = cx.match_pattern(&close) else {
            return Ok(None);
        };
        let node = cx.node(mark, "brace.close", m.into_string());
        Ok(Some(cx.close(BRACE, node)?.unwrap_or(node)))
    })?;

    parser
        .capture("comma", ",")?
        .capture("slash", "/")?
        .capture("dot", r"\.")?
        .capture("text", r"[^\\{},/.]+")?;
    Ok(())
}

pub fn register_handlers(compiler: &mut Compiler) -> Result<()> {
    compiler
        .register(BRACE, |v, id| v.map_visit(id))?
        .register("brace.open", |v, id| {
            let text = if v.node(id).flags.escaped { r"\{" } else { "(" };
            v.emit(text, id)
        })?
        .register("brace.close", |v, id| v.emit(")", id))?
        .register("comma", |v, id| {
            let text = if v.is_inside(BRACE) { "|" } else { "," };
            v.emit(text, id)
        })?
        .register("slash", |v, id| v.emit(r"\/", id))?
        .register("dot", |v, id| v.emit(r"\.", id))?
        .register("escape", |v, id| v.emit_value(id))?
        .register("text", |v, id| {
            let node = v.node(id);
            if node.flags.escaped {
                v.emit(&regex::escape(&node.value), id)
            } else {
                v.emit_value(id)
            }
        })?;
    Ok(())
}
