//! Check requests for syntax and schema errors

use tracing::debug;

use super::{parse, reject, CliError};
use crate::{
    parser::DEFAULT_MAX_DEPTH,
    printer::print_request,
    schema::Schema,
    validator::{Validator, ValidatorConfig},
};

/// Options for the check command
#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// The request text
    pub request: String,
    /// JSON schema text; without one only syntax is checked
    pub schema: Option<String>,
    /// Parser nesting limit
    pub max_depth: usize,
    /// Largest accepted `limit`
    pub max_limit: Option<u64>,
    /// Return the canonical form of the request
    pub print: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            request: String::new(),
            schema: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_limit: None,
            print: false,
        }
    }
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Parsed, no schema to validate against
    SyntaxValid,
    /// Parsed and validated
    Valid,
    /// Canonical form of a request that passed every check
    Printed(String),
}

/// Execute a sift check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let schema = options
        .schema
        .as_deref()
        .map(Schema::from_json)
        .transpose()?;
    let request = parse(&options.request, schema.as_ref(), options.max_depth)?;
    debug!(request = %request.name, parameters = request.parameters.len(), "parsed request");

    if let Some(schema) = &schema {
        let config = ValidatorConfig {
            max_limit: options.max_limit,
        };
        let report = Validator::with_config(schema, config).validate_request(&request)?;
        reject(report)?;
    }

    if options.print {
        return Ok(CheckResult::Printed(print_request(&request)?));
    }
    Ok(match schema {
        Some(_) => CheckResult::Valid,
        None => CheckResult::SyntaxValid,
    })
}
