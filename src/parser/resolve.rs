//! Name lookup and layout construction
//!
//! Type names are looked up from the innermost enclosing scope outward; at
//! each scope the alias table is consulted before the type table. Layouts are
//! built by sequential packing: each member starts where the previous one
//! ends, with no padding.

use crate::parser::lexer::{Symbol, SymbolKind};
use crate::parser::parse::{ParseError, Parser};
use crate::parser::tree::{NodeId, NodeKind};
use crate::parser::types::{EntryKind, Indirection, TypeInfo, TypeRef};
use tracing::{debug, warn};

/// What a symbol denotes to the type resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    /// Names a built-in type; carries its type table index.
    Builtin(usize),
    Literal,
    UserDefined(usize),
    Unresolved,
}

const LITERAL_KEYWORDS: &[&str] = &["true", "false", "nullptr"];

impl Parser {
    /// Type table index for `name` as seen from the current scope.
    ///
    /// Accepts source spelling (`N::S`) and qualified spelling (`N.S`); a
    /// leading `::` restricts the lookup to the global scope.
    pub fn resolve_type_name(&self, name: &str) -> Option<usize> {
        let global = name.starts_with("::");
        let normalized = name.trim_start_matches("::").replace("::", ".");

        let scopes = if global { &self.scopes[..1] } else { &self.scopes[..] };
        for scope in scopes.iter().rev() {
            let candidate = scope.qualify(&normalized);
            if let Some(target) = self.aliases.get(&candidate) {
                return Some(target);
            }
            if let Some(index) = self.type_table.find(&candidate) {
                return Some(index);
            }
        }
        None
    }

    pub fn classify_symbol(&self, symbol: &Symbol) -> TypeClass {
        match symbol.kind {
            SymbolKind::NumberLiteral | SymbolKind::StringLiteral => TypeClass::Literal,
            SymbolKind::Keyword if LITERAL_KEYWORDS.contains(&symbol.text.as_str()) => {
                TypeClass::Literal
            }
            SymbolKind::Identifier => match self.resolve_type_name(&symbol.text) {
                Some(index) => match self.type_table.get(index) {
                    Some(entry) if entry.is_builtin() => TypeClass::Builtin(index),
                    Some(_) => TypeClass::UserDefined(index),
                    None => TypeClass::Unresolved,
                },
                None => TypeClass::Unresolved,
            },
            _ => TypeClass::Unresolved,
        }
    }

    /// Layout of one data member or base of type `type_ref`, placed at
    /// offset 0. Built-in leaves are registered on first use.
    pub(crate) fn member_layout(
        &mut self,
        type_ref: &TypeRef,
        symbol: usize,
    ) -> Result<TypeInfo, ParseError> {
        let entry = self
            .type_table
            .get(type_ref.index)
            .cloned()
            .ok_or_else(|| self.error_at(symbol, "Type index out of range"))?;

        let suffix = match type_ref.indirection {
            Indirection::Value => None,
            Indirection::Pointer => Some("*"),
            Indirection::Reference => Some("&"),
            Indirection::RValueReference => Some("&&"),
        };
        if let Some(suffix) = suffix {
            let name = format!("{}{suffix}", entry.name);
            return Ok(TypeInfo::leaf(&name, self.options.pointer_size));
        }

        match entry.kind {
            EntryKind::Builtin { size, .. } => {
                if size == 0 {
                    return Err(self.error_at(
                        symbol,
                        format!("Member cannot have type '{}'", entry.name),
                    ));
                }
                if let Some(info) = self.type_infos.find(&entry.name) {
                    return Ok(info.clone());
                }
                let leaf = TypeInfo::leaf(&entry.name, size);
                self.type_infos.push(leaf.clone());
                Ok(leaf)
            }
            EntryKind::UserDefined(_) => self.type_infos.find(&entry.name).cloned().ok_or_else(|| {
                self.error_at(
                    symbol,
                    format!(
                        "Incomplete type '{}' used by value",
                        entry.name.replace('.', "::")
                    ),
                )
            }),
        }
    }

    /// Lay out a finished class: bases first, then non-static data members
    /// in declaration order.
    pub(crate) fn build_class_layout(
        &mut self,
        class_node: NodeId,
        qualified: &str,
        decl_name: &str,
        alignment: Option<usize>,
        symbol: usize,
    ) -> Result<(), ParseError> {
        let mut members = Vec::new();
        let mut offset = 0;

        for child in self.tree.children(class_node).to_vec() {
            let node = self.tree.node(child);
            let (member_name, array_len) = match &node.kind {
                NodeKind::BaseClass { .. } => (None, None),
                NodeKind::MemberVariable { name, array_len, .. } => (Some(name.clone()), *array_len),
                _ => continue,
            };
            let member_symbol = node.symbol.unwrap_or(symbol);
            let Some(type_ref) = self.tree.type_of(child) else {
                continue;
            };
            if !type_ref.is_instance_storage() {
                continue;
            }

            let mut info = self.member_layout(&type_ref, member_symbol)?;
            info.decl_name = member_name.unwrap_or_else(|| simple_name(&info.name).to_string());
            if let Some(len) = array_len {
                info.size = info
                    .size
                    .checked_mul(len)
                    .ok_or_else(|| self.error_at(member_symbol, "Array extent too large"))?;
                info.array_len = Some(len);
            }
            info.offset = offset;
            offset = offset.checked_add(info.size).ok_or_else(|| {
                self.error_at(member_symbol, format!("Layout of '{decl_name}' is too large"))
            })?;
            members.push(info);
        }

        let info = TypeInfo {
            is_builtin: false,
            name: qualified.to_string(),
            decl_name: decl_name.to_string(),
            size: offset,
            offset: 0,
            array_len: None,
            alignment,
            underlying: None,
            members,
        };

        if info.members_size() != info.size {
            return Err(self.error_at(
                symbol,
                format!("Layout of '{decl_name}' does not add up"),
            ));
        }
        if let Some(align) = alignment {
            if align > 0 && info.size % align != 0 {
                warn!(
                    "'{}' has size {} which is not a multiple of alignas({align})",
                    qualified.replace('.', "::"),
                    info.size
                );
            }
        }

        debug!("layout {}: {} members, {} bytes", qualified, info.members.len(), info.size);
        self.type_infos.push(info);
        Ok(())
    }

    /// Record an enum as a leaf of its underlying built-in.
    pub(crate) fn build_enum_layout(
        &mut self,
        qualified: &str,
        decl_name: &str,
        underlying: &TypeRef,
        symbol: usize,
    ) -> Result<(), ParseError> {
        let entry = self
            .type_table
            .get(underlying.index)
            .cloned()
            .ok_or_else(|| self.error_at(symbol, "Type index out of range"))?;
        let EntryKind::Builtin { size, .. } = entry.kind else {
            return Err(self.error_at(
                symbol,
                format!("Underlying type of enum '{decl_name}' must be a built-in type"),
            ));
        };

        let mut info = TypeInfo::leaf(qualified, size);
        info.is_builtin = false;
        info.decl_name = decl_name.to_string();
        info.underlying = Some(entry.name);
        debug!("layout enum {}: {} bytes", qualified, size);
        self.type_infos.push(info);
        Ok(())
    }
}

/// Last component of a dotted name.
pub(crate) fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::Grammar;

    #[test]
    fn test_scope_chain_lookup() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser
            .parse("namespace N { struct S { float v; }; struct T { S s; }; } struct U { N::S s; };")
            .unwrap();

        assert_eq!(parser.type_info_by_name("N::T").unwrap().size, 4);
        assert_eq!(parser.type_info_by_name("U").unwrap().members[0].name, "N.S");
        assert!(parser.resolve_type_name("S").is_none());
        assert_eq!(parser.resolve_type_name("N::S"), parser.resolve_type_name("N.S"));
    }

    #[test]
    fn test_alias_resolves_to_target() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser
            .parse("struct B { int i; }; using A = B; typedef B C;")
            .unwrap();

        let b = parser.resolve_type_name("B");
        assert!(b.is_some());
        assert_eq!(parser.resolve_type_name("A"), b);
        assert_eq!(parser.resolve_type_name("C"), b);
        assert_eq!(parser.type_info_by_name("A"), parser.type_info_by_name("B"));
    }

    #[test]
    fn test_classify_symbol() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser
            .parse("struct S { int i; }; S s = 42; bool b = true; Q q;")
            .unwrap_err();

        let class_of = |text: &str| {
            let symbol = parser.symbols().iter().find(|s| s.text == text).unwrap();
            parser.classify_symbol(symbol)
        };

        assert!(matches!(class_of("int"), TypeClass::Builtin(_)));
        assert!(matches!(class_of("S"), TypeClass::UserDefined(_)));
        assert_eq!(class_of("42"), TypeClass::Literal);
        assert_eq!(class_of("true"), TypeClass::Literal);
        assert_eq!(class_of("Q"), TypeClass::Unresolved);
    }

    #[test]
    fn test_static_members_take_no_space() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser
            .parse("struct S { static int count; float a; static constexpr int k = 3; float b; };")
            .unwrap();

        let info = parser.type_info_by_name("S").unwrap();
        assert_eq!(info.size, 8);
        assert_eq!(info.members.len(), 2);
        assert_eq!(info.member("b").unwrap().offset, 4);
    }

    #[test]
    fn test_incomplete_type_by_value() {
        let mut parser = Parser::new(Grammar::Cpp);
        let err = parser
            .parse("struct F; struct S { F f; };")
            .unwrap_err();
        assert!(err.message.contains("Incomplete type 'F'"));

        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse("struct F; struct S { F* f; };").unwrap();
        assert_eq!(
            parser.type_info_by_name("S").unwrap().size,
            std::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_void_member_is_error() {
        let mut parser = Parser::new(Grammar::Cpp);
        assert!(parser.parse("struct S { void v; };").is_err());
    }

    #[test]
    fn test_oversized_arrays_are_errors() {
        let mut parser = Parser::new(Grammar::Cpp);
        let err = parser
            .parse("struct S { float w[4611686018427387904]; };")
            .unwrap_err();
        assert!(err.message.contains("Array extent too large"));
        assert_eq!(err.location.column, 18);

        let mut parser = Parser::new(Grammar::Cpp);
        let err = parser
            .parse("struct S { char w[4294967296][4294967296]; };")
            .unwrap_err();
        assert!(err.message.contains("Array extent too large"));
        assert_eq!(err.location.column, 30);

        let mut parser = Parser::new(Grammar::Cpp);
        let err = parser
            .parse("struct S { char a[9223372036854775807]; char b[9223372036854775807]; char c[2]; };")
            .unwrap_err();
        assert!(err.message.contains("Layout of 'S' is too large"));
        assert!(parser.type_info_by_name("S").is_none());
    }

    #[test]
    fn test_array_members() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse("struct S { float w[4]; int n; };").unwrap();

        let info = parser.type_info_by_name("S").unwrap();
        let w = info.member("w").unwrap();
        assert_eq!(w.size, 16);
        assert_eq!(w.element_size(), 4);
        assert_eq!(w.array_len, Some(4));
        assert_eq!(info.member("n").unwrap().offset, 16);
    }
}
