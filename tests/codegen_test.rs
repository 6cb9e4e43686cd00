// Integration tests for HLSL generation

use shadertype::codegen::{self, CodegenError, Template, VertexFormat};
use shadertype::parser::{Grammar, Parser};

fn parse(source: &str) -> Parser {
    let mut parser = Parser::new(Grammar::Cpp);
    parser.parse(source).expect("Parsing failed");
    parser
}

#[test]
fn test_struct_members_in_declaration_order() {
    let parser = parse("struct Pair { float first; float second; };");
    let text = codegen::generate_struct(parser.type_info_by_name("Pair").unwrap()).unwrap();

    let members: Vec<_> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.ends_with(';') && !line.starts_with('}'))
        .collect();
    assert_eq!(members, vec!["float first;", "float second;"]);
}

#[test]
fn test_module_for_header() {
    let parser = parse(
        r#"
        namespace fx {
            struct Light { Vector3 direction; float intensity; Vector4 color; };
            struct Lights { Light sun; Light moon; };
            enum class Quality : int { Low, High };
        }
        "#,
    );

    let structs = codegen::generate_module(parser.type_infos().iter(), Template::Struct, 0).unwrap();
    assert_eq!(structs.matches("struct ").count(), 2);
    assert!(structs.contains("struct fx_Light\n"));
    assert!(structs.contains("    float3 sun_direction;\n"));
    assert!(structs.contains("    float4 moon_color;\n"));
    assert!(structs.contains("};\n\nstruct fx_Lights"));

    let buffers = codegen::generate_module(parser.type_infos().user_types(), Template::Cbuffer, 1).unwrap();
    assert!(buffers.contains("cbuffer fx_Light : register(b1)"));
    assert!(buffers.contains("cbuffer fx_Lights : register(b2)"));
}

#[test]
fn test_pointer_member_is_unmapped() {
    let parser = parse("struct Bad { float* data; };");
    let err = codegen::generate_cbuffer(parser.type_info_by_name("Bad").unwrap(), 0).unwrap_err();

    assert_eq!(
        err,
        CodegenError::UnmappedType {
            type_name: "float*".to_string(),
            member: "data".to_string(),
        }
    );
    assert!(err.to_string().contains("no shader equivalent"));
}

#[test]
fn test_vertex_input_layout() {
    let parser = parse(
        "struct Vertex { Vector3 position; Vector3 normal; Vector2 uv; int boneIds[4]; Vector4 weights; };",
    );
    let vertex = parser.type_info_by_name("Vertex").unwrap();

    let layout: Vec<_> = codegen::vertex_elements(vertex)
        .into_iter()
        .map(|e| (e.name, e.offset, e.format.dxgi_name()))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("position".to_string(), 0, "DXGI_FORMAT_R32G32B32_FLOAT"),
            ("normal".to_string(), 12, "DXGI_FORMAT_R32G32B32_FLOAT"),
            ("uv".to_string(), 24, "DXGI_FORMAT_R32G32_FLOAT"),
            ("boneIds".to_string(), 32, "DXGI_FORMAT_R32G32B32A32_SINT"),
            ("weights".to_string(), 48, "DXGI_FORMAT_R32G32B32A32_FLOAT"),
        ]
    );

    // Whole vertex has too many lanes for a single attribute
    assert_eq!(codegen::vertex_format(vertex), VertexFormat::Unknown);
}
