//! Vertex-input formats
//!
//! A [`TypeInfo`] read as one vertex attribute maps to a format by its shape:
//! the number of 32-bit lanes across all leaves and whether they are floats.
//! Shapes with no matching format yield [`VertexFormat::Unknown`].

use crate::parser::types::TypeInfo;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexFormat {
    R32Float,
    R32G32Float,
    R32G32B32Float,
    R32G32B32A32Float,
    R32Sint,
    R32G32Sint,
    R32G32B32Sint,
    R32G32B32A32Sint,
    Unknown,
}

impl VertexFormat {
    pub fn from_shape(lanes: usize, is_float: bool) -> Self {
        match (lanes, is_float) {
            (1, true) => VertexFormat::R32Float,
            (2, true) => VertexFormat::R32G32Float,
            (3, true) => VertexFormat::R32G32B32Float,
            (4, true) => VertexFormat::R32G32B32A32Float,
            (1, false) => VertexFormat::R32Sint,
            (2, false) => VertexFormat::R32G32Sint,
            (3, false) => VertexFormat::R32G32B32Sint,
            (4, false) => VertexFormat::R32G32B32A32Sint,
            _ => VertexFormat::Unknown,
        }
    }

    pub fn dxgi_name(self) -> &'static str {
        match self {
            VertexFormat::R32Float => "DXGI_FORMAT_R32_FLOAT",
            VertexFormat::R32G32Float => "DXGI_FORMAT_R32G32_FLOAT",
            VertexFormat::R32G32B32Float => "DXGI_FORMAT_R32G32B32_FLOAT",
            VertexFormat::R32G32B32A32Float => "DXGI_FORMAT_R32G32B32A32_FLOAT",
            VertexFormat::R32Sint => "DXGI_FORMAT_R32_SINT",
            VertexFormat::R32G32Sint => "DXGI_FORMAT_R32G32_SINT",
            VertexFormat::R32G32B32Sint => "DXGI_FORMAT_R32G32B32_SINT",
            VertexFormat::R32G32B32A32Sint => "DXGI_FORMAT_R32G32B32A32_SINT",
            VertexFormat::Unknown => "DXGI_FORMAT_UNKNOWN",
        }
    }

    pub fn lanes(self) -> usize {
        match self {
            VertexFormat::R32Float | VertexFormat::R32Sint => 1,
            VertexFormat::R32G32Float | VertexFormat::R32G32Sint => 2,
            VertexFormat::R32G32B32Float | VertexFormat::R32G32B32Sint => 3,
            VertexFormat::R32G32B32A32Float | VertexFormat::R32G32B32A32Sint => 4,
            VertexFormat::Unknown => 0,
        }
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dxgi_name())
    }
}

/// One attribute of an input layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexElement {
    pub name: String,
    pub offset: usize,
    pub format: VertexFormat,
}

/// Lane count and float-ness of a built-in leaf.
fn scalar_shape(name: &str) -> Option<(usize, bool)> {
    match name {
        "float" => Some((1, true)),
        "Vector2" => Some((2, true)),
        "Vector3" => Some((3, true)),
        "Vector4" => Some((4, true)),
        "int" | "int32_t" => Some((1, false)),
        _ => None,
    }
}

/// Total lanes of `info`; `None` when a leaf has no 32-bit lane shape or
/// float and integer leaves are mixed.
fn shape(info: &TypeInfo) -> Option<(usize, bool)> {
    let (lanes, is_float) = if info.members.is_empty() {
        scalar_shape(info.underlying.as_deref().unwrap_or(&info.name))?
    } else {
        let mut total: Option<(usize, bool)> = None;
        for member in &info.members {
            let (lanes, is_float) = shape(member)?;
            total = match total {
                None => Some((lanes, is_float)),
                Some((sum, kind)) if kind == is_float => Some((sum + lanes, kind)),
                Some(_) => return None,
            };
        }
        total?
    };
    Some((lanes * info.array_len.unwrap_or(1), is_float))
}

pub fn vertex_format(info: &TypeInfo) -> VertexFormat {
    match shape(info) {
        Some((lanes, is_float)) => VertexFormat::from_shape(lanes, is_float),
        None => VertexFormat::Unknown,
    }
}

/// One element per top-level member of a vertex struct.
pub fn vertex_elements(info: &TypeInfo) -> Vec<VertexElement> {
    info.members
        .iter()
        .map(|member| VertexElement {
            name: member.decl_name.clone(),
            offset: member.offset,
            format: vertex_format(member),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Grammar, Parser};

    #[test]
    fn test_leaf_formats() {
        assert_eq!(vertex_format(&TypeInfo::leaf("float", 4)), VertexFormat::R32Float);
        assert_eq!(vertex_format(&TypeInfo::leaf("Vector3", 12)), VertexFormat::R32G32B32Float);
        assert_eq!(vertex_format(&TypeInfo::leaf("int", 4)), VertexFormat::R32Sint);
        assert_eq!(vertex_format(&TypeInfo::leaf("Matrix4", 64)), VertexFormat::Unknown);
        assert_eq!(vertex_format(&TypeInfo::leaf("double", 8)), VertexFormat::Unknown);
    }

    #[test]
    fn test_vertex_elements() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser
            .parse(
                "struct UV { float u; float v; };
                 struct Vertex { Vector3 position; UV uv; int ids[4]; float weights[5]; Vector2 mix[2]; };",
            )
            .unwrap();
        let elements = vertex_elements(parser.type_info_by_name("Vertex").unwrap());

        let formats: Vec<_> = elements.iter().map(|e| e.format).collect();
        assert_eq!(
            formats,
            vec![
                VertexFormat::R32G32B32Float,
                VertexFormat::R32G32Float,
                VertexFormat::R32G32B32A32Sint,
                VertexFormat::Unknown,
                VertexFormat::R32G32B32A32Float,
            ]
        );
        assert_eq!(elements[1].name, "uv");
        assert_eq!(elements[1].offset, 12);
        assert_eq!(elements[2].offset, 20);
    }

    #[test]
    fn test_mixed_leaves_are_unknown() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse("struct M { float f; int i; };").unwrap();
        assert_eq!(
            vertex_format(parser.type_info_by_name("M").unwrap()),
            VertexFormat::Unknown
        );
    }

    #[test]
    fn test_dxgi_names() {
        assert_eq!(VertexFormat::R32G32Float.dxgi_name(), "DXGI_FORMAT_R32G32_FLOAT");
        assert_eq!(VertexFormat::Unknown.to_string(), "DXGI_FORMAT_UNKNOWN");
        assert_eq!(VertexFormat::from_shape(5, true), VertexFormat::Unknown);
        assert_eq!(VertexFormat::from_shape(3, false).lanes(), 3);
    }
}
