use std::{
    fmt,
    sync::{Arc, Weak},
};

use crate::ast::Metadata;

/// Name of the current-item marker.
pub const CURRENT_ITEM: &str = "$it";

/// A named field.
///
/// # Examples
/// ```text
/// age
/// ["zip code"]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub metadata: Metadata,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            metadata: Metadata::synthetic(),
        }
    }
}

/// The current collection item (`$it`) inside a quantifier predicate.
///
/// Holds a non-owning back-reference to the collection path of the
/// quantifier it was parsed under. The reference is dangling when the
/// marker was written outside of any quantifier; the validator reports that.
#[derive(Debug, Clone)]
pub struct CurrentItem {
    pub binding: Weak<FieldPath>,
    pub metadata: Metadata,
}

impl CurrentItem {
    /// The collection path this marker iterates, if it is still alive.
    pub fn collection(&self) -> Option<Arc<FieldPath>> {
        self.binding.upgrade()
    }
}

impl PartialEq for CurrentItem {
    fn eq(&self, other: &Self) -> bool {
        self.collection() == other.collection()
    }
}

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldReference {
    Field(Field),
    CurrentItem(CurrentItem),
}

impl FieldReference {
    pub fn metadata(&self) -> &Metadata {
        match self {
            FieldReference::Field(field) => &field.metadata,
            FieldReference::CurrentItem(item) => &item.metadata,
        }
    }
}

/// Ordered sequence of field references, relative to the request's root
/// type or, when it starts with `$it`, to the current collection item.
///
/// # Examples
/// ```text
/// address.city
/// $it.name
/// tags
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldPath {
    pub segments: Vec<FieldReference>,
    pub metadata: Metadata,
}

impl FieldPath {
    pub fn new(segments: Vec<FieldReference>) -> Self {
        FieldPath {
            segments,
            metadata: Metadata::synthetic(),
        }
    }

    /// Path of plain field names.
    pub fn of(names: &[&str]) -> Self {
        FieldPath::new(
            names
                .iter()
                .map(|name| FieldReference::Field(Field::new(*name)))
                .collect(),
        )
    }
}

/// True when `name` can be written without bracket form.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(char::is_alphanumeric) && !matches!(name, "true" | "false" | "null")
}

fn write_quoted(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    f.write_str("[\"")?;
    for ch in name.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"]")
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                FieldReference::CurrentItem(_) => f.write_str(CURRENT_ITEM)?,
                FieldReference::Field(field) if is_plain_identifier(&field.name) => {
                    if index > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(&field.name)?;
                }
                FieldReference::Field(field) => write_quoted(f, &field.name)?,
            }
        }
        Ok(())
    }
}
