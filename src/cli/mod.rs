//! CLI support for sift-lang
//!
//! Provides programmatic access to the `sift` commands so other tools can
//! check and run requests without spawning the binary.

mod check;
mod docs;
mod run;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use docs::{get_doc_category, get_docs_overview, DocCategory};
pub use run::{execute_run, RunOptions};

use std::io;

use thiserror::Error;

use crate::{
    lexer::Lexer,
    parser::{Parser, ParserConfig},
    schema::{Schema, SchemaError},
    validator::{ContractViolation, ValidationReport},
    Request,
};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] crate::SyntaxError),

    #[error("Invalid request:\n  {}", .0.join("\n  "))]
    Validation(Vec<String>),

    #[error("Validator failure: {0}")]
    Contract(#[from] ContractViolation),

    #[error("Compile error: {0}")]
    Compile(#[from] crate::CompileError),

    #[error("Print error: {0}")]
    Print(#[from] crate::PrintError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Unknown category: '{0}'\nRun 'sift docs' to see available categories.")]
    UnknownCategory(String),
}

/// Parses `text`, typing constants from `schema` when one is given.
fn parse(text: &str, schema: Option<&Schema>, max_depth: usize) -> Result<Request, CliError> {
    let config = ParserConfig::default().with_max_depth(max_depth);
    let mut parser = Parser::new(Lexer::new(text)?).with_config(config);
    if let Some(schema) = schema {
        parser = parser.with_schema(schema);
    }
    Ok(parser.parse_request()?)
}

/// Turns a report with findings into [`CliError::Validation`].
fn reject(report: ValidationReport<'_>) -> Result<(), CliError> {
    if report.is_valid() {
        return Ok(());
    }
    Err(CliError::Validation(
        report.iter().map(ToString::to_string).collect(),
    ))
}
