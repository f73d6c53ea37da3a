//! Defines the command-line arguments and subcommands for the ruleweave CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::options::{Options, SourceMapMode};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "ruleweave",
    version,
    about = "Transform brace patterns into regular expressions with source maps."
)]
pub struct RuleweaveArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile the input and print the output.
    Compile {
        #[command(flatten)]
        input: InputArgs,
        /// Also print the source map, as JSON, after the output.
        #[arg(long, value_enum)]
        sourcemap: Option<SourceMapMode>,
    },
    /// Print the parsed tree as JSON.
    Ast {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Compile the input and print only its source map.
    Map {
        #[command(flatten)]
        input: InputArgs,
        /// Compose maps referenced by `sourceMappingURL` directives.
        #[arg(long)]
        input_sourcemaps: bool,
    },
}

/// Where the input comes from and how to parse it.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// The input string.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub text: Option<String>,
    /// Read the input from a file instead.
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Source id used in diagnostics and maps. Defaults to the file path, or
    /// "string" for inline input.
    #[arg(long)]
    pub source: Option<String>,
    /// Fail on unbalanced braces instead of escaping them.
    #[arg(long)]
    pub strict: bool,
    /// Record unmatched input instead of failing.
    #[arg(long)]
    pub silent: bool,
}

impl InputArgs {
    pub fn options(&self) -> Options {
        let source = self
            .source
            .clone()
            .or_else(|| self.file.as_ref().map(|p| p.display().to_string()));
        let options = Options::new().strict(self.strict).silent(self.silent);
        match source {
            Some(source) => options.with_source(source),
            None => options,
        }
    }
}
