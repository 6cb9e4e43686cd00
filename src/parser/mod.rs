//! Declaration parser for C++-style headers
//!
//! This module transforms header source text into a syntax tree and a table
//! of type layouts:
//! - [`lexer`]: Tokenization (source text → symbols) driven by registered tables
//! - [`grammar`]: Declarative table and built-in type description per grammar
//! - [`parse`]: Parser state, options, errors and entry points
//! - [`tree`]: Arena syntax tree
//! - [`types`]: Type table, aliases and [`TypeInfo`](types::TypeInfo) layouts
//! - [`resolve`]: Name lookup and layout construction
//!
//! # Supported Subset
//!
//! - Namespaces, `using`/`typedef` aliases, forward declarations, enums
//! - Classes and structs with bases, access sections, nested types, arrays
//! - Member functions, constructors and destructors (bodies are skipped)
//! - Free functions and variables
//! - No templates, unions, bit-fields or macro expansion (`#` lines are skipped)
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with single-symbol lookahead plus bounded
//! scans for matching closers. No external parser generator dependencies.

mod declarations;
pub mod grammar;
pub mod lexer;
pub mod parse;
pub mod resolve;
pub mod tree;
mod type_node;
pub mod types;

pub use grammar::{BuiltinType, Grammar};
pub use parse::{ParseError, Parser, ParserOptions, UnresolvedTypePolicy};
pub use resolve::TypeClass;
pub use type_node::TypeContext;
