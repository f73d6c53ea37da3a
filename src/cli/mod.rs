//! The ruleweave Command-Line Interface.
//!
//! Runs the [`braces`](crate::grammars::braces) grammar over a string or a
//! file. Set `RUST_LOG=debug` to trace parsing and compilation.

use crate::cli::args::{Command, InputArgs, RuleweaveArgs};
use crate::engine::Engine;
use crate::errors::{print_error, Error, Result};
use crate::grammars::braces;
use crate::options::{Options, SourceMapMode};
use clap::Parser;
use std::{fs, process};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = RuleweaveArgs::parse();

    let result = match args.command {
        Command::Compile { input, sourcemap } => {
            handle_compile(&input, sourcemap.unwrap_or(SourceMapMode::Off))
        }
        Command::Ast { input } => handle_ast(&input),
        Command::Map {
            input,
            input_sourcemaps,
        } => handle_map(&input, input_sourcemaps),
    };

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

fn read_input(input: &InputArgs) -> Result<String> {
    match (&input.text, &input.file) {
        (_, Some(path)) => fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        }),
        (Some(text), None) => Ok(text.clone()),
        (None, None) => Ok(String::new()),
    }
}

fn engine(options: Options) -> Result<Engine> {
    let mut engine = Engine::new(options);
    engine.use_plugin(braces::plugin)?;
    Ok(engine)
}

/// Handles the `compile` subcommand.
fn handle_compile(input: &InputArgs, sourcemap: SourceMapMode) -> Result<()> {
    let text = read_input(input)?;
    let engine = engine(input.options().sourcemap(sourcemap))?;
    let out = engine.transform(&text)?;
    output::print_compiled(&out)?;
    output::print_diagnostics(out.errors);
    Ok(())
}

/// Handles the `ast` subcommand.
fn handle_ast(input: &InputArgs) -> Result<()> {
    let text = read_input(input)?;
    let mut ast = engine(input.options())?.parse(&text)?;
    output::print_ast(&ast);
    output::print_diagnostics(std::mem::take(&mut ast.errors));
    Ok(())
}

/// Handles the `map` subcommand.
fn handle_map(input: &InputArgs, input_sourcemaps: bool) -> Result<()> {
    let text = read_input(input)?;
    let options = input
        .options()
        .sourcemap(SourceMapMode::Json)
        .input_sourcemaps(input_sourcemaps);
    let out = engine(options)?.transform(&text)?;
    output::print_map(&out)?;
    output::print_diagnostics(out.errors);
    Ok(())
}
