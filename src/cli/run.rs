//! Run requests against JSON documents

use tracing::debug;

use super::{parse, reject, CliError};
use crate::{
    compiler::{compile_request, execute_json},
    parser::DEFAULT_MAX_DEPTH,
    schema::Schema,
    validator::{Validator, ValidatorConfig},
};

/// Options for the run command
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// The request text
    pub request: String,
    /// JSON schema text; the request is validated first when present
    pub schema: Option<String>,
    /// JSON array of documents, or a single document
    pub input: Option<String>,
    /// Parser nesting limit
    pub max_depth: usize,
    /// Largest accepted `limit`
    pub max_limit: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            request: String::new(),
            schema: None,
            input: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_limit: None,
        }
    }
}

/// Execute a sift run operation, returning the selected documents.
pub fn execute_run(options: &RunOptions) -> Result<serde_json::Value, CliError> {
    let schema = options
        .schema
        .as_deref()
        .map(Schema::from_json)
        .transpose()?;
    let request = parse(&options.request, schema.as_ref(), options.max_depth)?;

    if let Some(schema) = &schema {
        let config = ValidatorConfig {
            max_limit: options.max_limit,
        };
        let report = Validator::with_config(schema, config).validate_request(&request)?;
        reject(report)?;
    }

    let input = options.input.as_ref().ok_or(CliError::NoInput)?;
    let documents: serde_json::Value = serde_json::from_str(input)?;

    let compiled = compile_request(&request)?;
    let output = execute_json(&compiled, documents);
    debug!(
        request = %request.name,
        selected = output.as_array().map_or(1, Vec::len),
        "executed request"
    );
    Ok(output)
}
