//! Handles all user-facing output for the CLI.
//!
//! Results go to stdout, diagnostics to stderr through `miette`.

use crate::ast::Ast;
use crate::compiler::CompileOutput;
use crate::errors::{print_error, Error, Result};

/// Prints compiled text, followed by the map when one was produced.
pub fn print_compiled(out: &CompileOutput) -> Result<()> {
    println!("{}", out.output);
    if let Some(map) = &out.map {
        println!("{}", map.to_json_string()?);
    }
    Ok(())
}

pub fn print_map(out: &CompileOutput) -> Result<()> {
    if let Some(map) = &out.map {
        println!("{}", map.to_json_string()?);
    }
    Ok(())
}

pub fn print_ast(ast: &Ast) {
    println!("{:#}", ast.to_json());
}

/// Renders recoverable diagnostics without failing the command.
pub fn print_diagnostics(errors: Vec<Error>) {
    for error in errors {
        print_error(error);
    }
}
