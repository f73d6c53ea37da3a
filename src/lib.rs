//! # Ruleweave
//!
//! Build string-to-string transformers from ordered regex rules. A
//! [`Parser`] turns input into an [`Ast`], balancing nested open/close sets
//! along the way, and a [`Compiler`] walks the tree back into text through
//! per-type handlers, optionally producing a v3 source map.
//!
//! ```
//! use ruleweave::{grammars, Engine, Options, SourceMapMode};
//!
//! let mut engine = Engine::new(Options::new().sourcemap(SourceMapMode::Json));
//! engine.use_plugin(grammars::braces::plugin).unwrap();
//!
//! let out = engine.transform("{a,b}").unwrap();
//! assert_eq!(out.output, "(a|b)");
//! assert!(out.map.is_some());
//! ```

pub mod ast;
pub mod cli;
pub mod compiler;
pub mod engine;
pub mod errors;
pub mod grammars;
pub mod options;
pub mod parser;
pub mod source_map;

pub use ast::{Ast, Location, Node, NodeFlags, NodeId, Position, Span};
pub use compiler::{CompileOutput, Compiler, Visitor};
pub use engine::Engine;
pub use errors::{Error, ErrorKind, ErrorLocation, Result};
pub use options::{Options, SourceMapMode};
pub use parser::{Cursor, Mark, Matched, Parser, Pattern};
pub use source_map::{CompiledMap, RawSourceMap};
