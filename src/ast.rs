//! # Sift Request Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for the Sift request
//! language, a small function-call language for expressing filter predicates,
//! sort keys, pagination bounds and input payloads against a schema.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[metadata]** - Source spans attached to every node
//! - **[fields]** - Field references and field paths
//! - **[functions]** - Field functions and field operands
//! - **[constants]** - Typed literal constants
//! - **[operators]** - Comparison, quantifier and sort direction names
//! - **[expressions]** - Boolean expressions
//! - **[parameters]** - Request parameters
//! - **[request]** - The complete request
//! - **[node]** - Borrowed node references and the node kind hierarchy
//!
//! ## Quick Start
//!
//! ```text
//! users(filter(and(ge(age, 18), any(tags, eq($it, "admin")))), sort(asc(name)), limit(10))
//! ```
//!
//! This request keeps adult users tagged `admin`, sorted by name, at most ten.
//!
//! ## Core Concepts
//!
//! ### Everything is a function call
//!
//! Every construct starts with a reserved name followed by an argument list:
//!
//! ```text
//! name(arg, arg, ...)
//! ```
//!
//! ### Field paths
//!
//! - `address.city` - dotted access
//! - `address["zip code"]` - bracket form for names that are not identifiers
//! - `$it` - the current item inside `any`/`all`
//!
//! ### Immutability
//!
//! Nodes are built once by the parser and never mutated. Source spans live in
//! [`Metadata`], which is ignored by equality, so two parses of the same text
//! compare equal regardless of spacing.
pub mod tokens;
pub mod metadata;
pub mod fields;
pub mod functions;
pub mod constants;
pub mod operators;
pub mod expressions;
pub mod parameters;
pub mod request;
pub mod node;

pub use tokens::{Token, TokenKind};
pub use metadata::{Metadata, Span};
pub use fields::{CurrentItem, Field, FieldPath, FieldReference, CURRENT_ITEM, is_plain_identifier};
pub use functions::{FieldFunction, FieldFunctionName, FieldOperand};
pub use constants::{Constant, Literal, LiteralType};
pub use operators::{ComparisonOperator, QuantifierKind, SortDirection};
pub use expressions::{Binary, BooleanExpression, Comparison, Not, Quantifier};
pub use parameters::{Count, Filter, Input, Paging, Parameter, Sort, SortExpression};
pub use request::Request;
pub use node::{NodeKind, NodeRef};
