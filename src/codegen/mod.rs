//! Shader code generation from type layouts
//!
//! Turns finished [`TypeInfo`](crate::parser::types::TypeInfo) records into
//! HLSL text and GPU vertex-input formats:
//! - [`hlsl`]: `struct` and `cbuffer` templates with built-in name mapping
//! - [`vertex`]: per-attribute vertex formats
//!
//! Both are pure functions of their input layout.

pub mod hlsl;
pub mod vertex;

pub use hlsl::{
    generate_cbuffer, generate_module, generate_struct, is_aggregate, shader_type_name, Template,
};
pub use vertex::{vertex_elements, vertex_format, VertexElement, VertexFormat};

use std::fmt;

/// Code generation error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A leaf type has no shader-language equivalent.
    UnmappedType { type_name: String, member: String },
    /// Templates apply to structs and classes only.
    NotAggregate { type_name: String },
}

impl fmt::Display for CodegenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodegenError::UnmappedType { type_name, member } => write!(
                f,
                "Codegen error: member '{member}' has type '{type_name}' with no shader equivalent"
            ),
            CodegenError::NotAggregate { type_name } => {
                write!(f, "Codegen error: '{type_name}' is not a struct or class")
            }
        }
    }
}

impl std::error::Error for CodegenError {}
