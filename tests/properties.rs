//! Property tests for the lexer tables and layout invariants using proptest

use proptest::prelude::*;
use shadertype::parser::lexer::{Lexer, OperatorKind, Punctuator, SkipperKind, SymbolKind};
use shadertype::parser::{Grammar, Parser};

const PUNCTUATORS: &[&str] = &["::", ":", ",", "..."];

/// Built-in member types with their expected sizes.
const MEMBER_TYPES: &[(&str, usize)] = &[
    ("float", 4),
    ("double", 8),
    ("int", 4),
    ("char", 1),
    ("bool", 1),
    ("uint16_t", 2),
    ("Vector2", 8),
    ("Vector3", 12),
    ("Matrix4", 64),
];

fn table_sizes(lexer: &Lexer) -> [usize; 7] {
    let t = lexer.tables();
    [
        t.delimiter_count(),
        t.skipper_count(),
        t.grouper_count(),
        t.quote_count(),
        t.punctuator_count(),
        t.operator_count(),
        t.keyword_count(),
    ]
}

/// Strategy for generating whitespace padding
fn padding_strategy() -> impl Strategy<Value = String> {
    "[ \t\n]{0,3}"
}

proptest! {
    #[test]
    fn prop_registration_is_idempotent(rounds in 1usize..4, keyword in "[a-z]{1,8}") {
        let mut lexer = Grammar::Cpp.lexer();
        lexer.register_keyword(&keyword);
        let before = table_sizes(&lexer);

        for _ in 0..rounds {
            Grammar::Cpp.configure(&mut lexer);
            lexer.register_keyword(&keyword);
            lexer.register_punctuator("::", Punctuator::ScopeResolution);
            lexer.register_operator("+=", OperatorKind::Assignment);
            lexer.register_line_skipper("//", SkipperKind::Single);
        }

        prop_assert_eq!(table_sizes(&lexer), before);
    }

    #[test]
    fn prop_punctuator_round_trip(
        index in 0..PUNCTUATORS.len(),
        before in padding_strategy(),
        after in padding_strategy(),
    ) {
        let punctuator = PUNCTUATORS[index];
        let source = format!("{before}{punctuator}{after}");

        let mut lexer = Grammar::Cpp.lexer();
        lexer.set_source(&source);
        lexer.execute().unwrap();

        let symbols = lexer.symbols();
        prop_assert_eq!(symbols.len(), 1);
        prop_assert!(matches!(symbols[0].kind, SymbolKind::Punctuator(_)));
        prop_assert_eq!(symbols[0].text.as_str(), punctuator);
        prop_assert_eq!(symbols[0].offset, before.len());
    }

    #[test]
    fn prop_line_comment_skipped(comment in "[^\r\n]{0,40}", name in "[a-z_][a-z0-9_]{0,8}") {
        let source = format!("//{comment}\n  {name}");

        let mut lexer = Grammar::Cpp.lexer();
        lexer.set_source(&source);
        lexer.execute().unwrap();

        let symbols = lexer.symbols();
        prop_assert!(!symbols.is_empty());
        prop_assert_eq!(symbols[0].location.line, 2);
        prop_assert_eq!(symbols[0].location.column, 3);
    }

    #[test]
    fn prop_nested_blocks_balance(depth in 1usize..6) {
        let open = "/* ".repeat(depth);
        let close = " */".repeat(depth);

        let mut lexer = Grammar::Cpp.lexer();
        lexer.set_source(&format!("{open}hidden{close} visible"));
        lexer.execute().unwrap();
        prop_assert_eq!(lexer.symbols().len(), 1);
        prop_assert_eq!(lexer.symbols()[0].text.as_str(), "visible");

        // One close short never terminates
        let short = " */".repeat(depth - 1);
        lexer.set_source(&format!("{open}hidden{short} visible"));
        prop_assert!(lexer.execute().is_err());
    }

    #[test]
    fn prop_size_is_sum_of_members(types in prop::collection::vec(0..MEMBER_TYPES.len(), 1..12)) {
        let members: String = types
            .iter()
            .enumerate()
            .map(|(i, &t)| format!("{} m{i}; ", MEMBER_TYPES[t].0))
            .collect();
        let source = format!("struct Generated {{ {members}}};");

        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse(&source).unwrap();
        let info = parser.type_info_by_name("Generated").unwrap();

        let mut expected_offset = 0;
        for (member, &t) in info.members.iter().zip(&types) {
            prop_assert_eq!(member.offset, expected_offset);
            prop_assert_eq!(member.size, MEMBER_TYPES[t].1);
            expected_offset += MEMBER_TYPES[t].1;
        }
        prop_assert_eq!(info.size, expected_offset);
        prop_assert_eq!(info.members.len(), types.len());
    }

    #[test]
    fn prop_alias_resolves_like_target(alias in "[A-Z][a-z]{1,6}") {
        prop_assume!(alias != "Target");
        let source = format!("struct Target {{ int v; }}; using {alias} = Target;");

        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse(&source).unwrap();

        prop_assert_eq!(parser.resolve_type_name(&alias), parser.resolve_type_name("Target"));
        prop_assert_eq!(parser.type_info_by_name(&alias), parser.type_info_by_name("Target"));
    }
}
