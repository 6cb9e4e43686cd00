//! # Introduction
//!
//! shadertype reads C++-style headers, computes the byte layout of every
//! declared struct and class, and generates matching HLSL `struct` and
//! `cbuffer` declarations plus GPU vertex-input formats. A terminal UI built
//! with [ratatui](https://docs.rs/ratatui) lets you browse the layouts.
//!
//! ## Pipeline
//!
//! ```text
//! Source → Lexer → Symbols → Parser → Syntax tree + TypeInfo table → Codegen
//! ```
//!
//! 1. [`parser`]: table-driven lexer, recursive-descent declaration parser,
//!    type resolution and sequential layout.
//! 2. [`codegen`]: HLSL templates and vertex formats from finished layouts.
//! 3. [`logger`]: `tracing` subscriber setup for the binary.
//! 4. [`ui`]: ratatui-based inspector; not part of the stable library API.
//!
//! ## Example
//!
//! ```rust
//! use shadertype::codegen;
//! use shadertype::parser::{Grammar, Parser};
//!
//! let mut parser = Parser::new(Grammar::Cpp);
//! parser.parse("struct Foo { float x; float y; };").unwrap();
//!
//! let foo = parser.type_info_by_name("Foo").unwrap();
//! assert_eq!(foo.size, 8);
//! assert!(codegen::generate_struct(foo).unwrap().contains("float y;"));
//! ```

pub mod codegen;
pub mod logger;
pub mod parser;
pub mod ui;
