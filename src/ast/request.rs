use crate::ast::{Metadata, Parameter};

/// A complete request: a name plus its ordered parameters.
///
/// # Example
/// ```text
/// users(filter(ge(age, 18)), sort(asc(name)), limit(10))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub metadata: Metadata,
}

impl Request {
    pub fn filter(&self) -> Option<&crate::ast::Filter> {
        self.parameters.iter().find_map(|parameter| match parameter {
            Parameter::Filter(filter) => Some(filter),
            _ => None,
        })
    }
}
