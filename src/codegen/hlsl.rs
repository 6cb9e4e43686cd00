//! HLSL `struct` and `cbuffer` templates
//!
//! Nested user-defined members are expanded inline rather than referenced,
//! so the emitted text does not depend on declaration order. An expanded
//! member's fields are named `<outer>_<inner>`; arrays of aggregates expand
//! per element as `<outer>_<index>_<inner>`.

use super::CodegenError;
use crate::parser::types::TypeInfo;
use tracing::warn;

const INDENT: &str = "    ";

/// HLSL packs constant buffers in 16-byte registers.
const CBUFFER_ALIGNMENT: usize = 16;

/// Host built-in name → HLSL type name.
const TYPE_NAMES: &[(&str, &str)] = &[
    ("float", "float"),
    ("double", "double"),
    ("int", "int"),
    ("unsigned int", "uint"),
    ("bool", "bool"),
    ("int32_t", "int"),
    ("uint32_t", "uint"),
    ("Vector2", "float2"),
    ("Vector3", "float3"),
    ("Vector4", "float4"),
    ("Matrix3", "float3x3"),
    ("Matrix4", "float4x4"),
];

/// Which template [`generate_module`] applies to each type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Template {
    #[default]
    Struct,
    Cbuffer,
}

impl Template {
    pub fn toggled(self) -> Self {
        match self {
            Template::Struct => Template::Cbuffer,
            Template::Cbuffer => Template::Struct,
        }
    }
}

pub fn shader_type_name(host: &str) -> Option<&'static str> {
    TYPE_NAMES
        .iter()
        .find(|(name, _)| *name == host)
        .map(|(_, shader)| *shader)
}

/// `struct Name { ... };`
pub fn generate_struct(info: &TypeInfo) -> Result<String, CodegenError> {
    let body = member_lines(info)?;
    Ok(format!("struct {}\n{{\n{body}}};\n", shader_identifier(&info.name)))
}

/// `cbuffer Name : register(bN) { ... };`
pub fn generate_cbuffer(info: &TypeInfo, register: u32) -> Result<String, CodegenError> {
    let body = member_lines(info)?;
    if info.size % CBUFFER_ALIGNMENT != 0 {
        warn!(
            "cbuffer '{}' is {} bytes, not a multiple of {CBUFFER_ALIGNMENT}",
            info.name, info.size
        );
    }
    Ok(format!(
        "cbuffer {} : register(b{register})\n{{\n{body}}};\n",
        shader_identifier(&info.name)
    ))
}

/// Every struct or class in `infos`, separated by blank lines. Cbuffers take
/// consecutive registers starting at `first_register`.
pub fn generate_module<'a>(
    infos: impl IntoIterator<Item = &'a TypeInfo>,
    template: Template,
    first_register: u32,
) -> Result<String, CodegenError> {
    let mut out = String::new();
    let mut register = first_register;

    for info in infos.into_iter().filter(|info| is_aggregate(info)) {
        if !out.is_empty() {
            out.push('\n');
        }
        match template {
            Template::Struct => out.push_str(&generate_struct(info)?),
            Template::Cbuffer => {
                out.push_str(&generate_cbuffer(info, register)?);
                register += 1;
            }
        }
    }
    Ok(out)
}

/// Structs and classes; enums and built-in leaves are not.
pub fn is_aggregate(info: &TypeInfo) -> bool {
    !info.is_builtin && info.underlying.is_none()
}

fn shader_identifier(qualified: &str) -> String {
    qualified.replace('.', "_")
}

fn member_lines(info: &TypeInfo) -> Result<String, CodegenError> {
    if !is_aggregate(info) {
        return Err(CodegenError::NotAggregate {
            type_name: info.name.clone(),
        });
    }
    let mut out = String::new();
    for member in &info.members {
        emit_member(member, "", &mut out)?;
    }
    Ok(out)
}

fn emit_member(member: &TypeInfo, prefix: &str, out: &mut String) -> Result<(), CodegenError> {
    let field = format!("{prefix}{}", member.decl_name);

    if is_aggregate(member) {
        match member.array_len {
            None => {
                for inner in &member.members {
                    emit_member(inner, &format!("{field}_"), out)?;
                }
            }
            Some(len) => {
                for index in 0..len {
                    for inner in &member.members {
                        emit_member(inner, &format!("{field}_{index}_"), out)?;
                    }
                }
            }
        }
        return Ok(());
    }

    // Enums are emitted as their underlying type.
    let host = member.underlying.as_deref().unwrap_or(&member.name);
    let shader = shader_type_name(host).ok_or_else(|| CodegenError::UnmappedType {
        type_name: host.to_string(),
        member: field.clone(),
    })?;
    if host == "bool" {
        warn!("'{field}' is bool: 1 byte on the host, 4 bytes in HLSL");
    }

    let extent = member
        .array_len
        .map(|len| format!("[{len}]"))
        .unwrap_or_default();
    out.push_str(&format!("{INDENT}{shader} {field}{extent};\n"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Grammar, Parser};

    fn parse(source: &str) -> Parser {
        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse(source).unwrap();
        parser
    }

    #[test]
    fn test_two_float_struct() {
        let parser = parse("struct Foo { float x; float y; };");
        let text = generate_struct(parser.type_info_by_name("Foo").unwrap()).unwrap();

        assert_eq!(text, "struct Foo\n{\n    float x;\n    float y;\n};\n");
    }

    #[test]
    fn test_cbuffer_template() {
        let parser = parse("namespace gfx { struct Frame { Matrix4 view; Vector4 tint; }; }");
        let text = generate_cbuffer(parser.type_info_by_name("gfx::Frame").unwrap(), 2).unwrap();

        assert!(text.starts_with("cbuffer gfx_Frame : register(b2)\n{\n"));
        assert!(text.contains("    float4x4 view;\n    float4 tint;\n"));
    }

    #[test]
    fn test_nested_members_expand_inline() {
        let parser = parse(
            "struct Light { Vector3 dir; float power; };
             struct Scene { Light key; Light fill[2]; unsigned int count; };",
        );
        let text = generate_struct(parser.type_info_by_name("Scene").unwrap()).unwrap();
        let lines: Vec<_> = text.lines().filter(|l| l.starts_with(INDENT)).map(str::trim).collect();

        assert_eq!(
            lines,
            vec![
                "float3 key_dir;",
                "float key_power;",
                "float3 fill_0_dir;",
                "float fill_0_power;",
                "float3 fill_1_dir;",
                "float fill_1_power;",
                "uint count;",
            ]
        );
        assert!(!text.contains("Light"));
    }

    #[test]
    fn test_arrays_and_enums() {
        let parser = parse("enum class Kind : int32_t { A }; struct S { float w[4]; Kind k; };");
        let text = generate_struct(parser.type_info_by_name("S").unwrap()).unwrap();

        assert!(text.contains("    float w[4];\n"));
        assert!(text.contains("    int k;\n"));
    }

    #[test]
    fn test_unmapped_type() {
        let parser = parse("struct S { float a; char c; };");
        let err = generate_struct(parser.type_info_by_name("S").unwrap()).unwrap_err();

        assert_eq!(
            err,
            CodegenError::UnmappedType {
                type_name: "char".to_string(),
                member: "c".to_string(),
            }
        );
    }

    #[test]
    fn test_not_aggregate() {
        let parser = parse("enum E { A }; struct S { float f; };");
        let err = generate_struct(parser.type_info_by_name("E").unwrap()).unwrap_err();
        assert!(matches!(err, CodegenError::NotAggregate { .. }));
    }

    #[test]
    fn test_module_registers() {
        let parser = parse("struct A { float a; }; enum E { X }; struct B { int b; };");
        let text = generate_module(parser.type_infos().iter(), Template::Cbuffer, 3).unwrap();

        assert!(text.contains("cbuffer A : register(b3)"));
        assert!(text.contains("cbuffer B : register(b4)"));
        assert!(!text.contains("cbuffer E"));
        assert!(!text.contains("cbuffer float"));
    }
}
