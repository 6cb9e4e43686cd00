//! Type-node parsing
//!
//! ```text
//! type_node ::= modifier* [elaborated] [qualified_name] modifier* [suffix]
//! modifier  ::= const | constexpr | mutable | static | thread_local | volatile
//!             | short | long | signed | unsigned
//! suffix    ::= "*"+ | "&" | "&&"
//! ```
//!
//! Which modifiers are legal depends on the [`TypeContext`].

use crate::parser::parse::{ParseError, Parser, UnresolvedTypePolicy};
use crate::parser::types::{Indirection, TypeModifierSet, TypeRef};

/// Where a type node appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeContext {
    /// Aliases, free variables and free function return types.
    FreeExpression,
    AggregateMember,
    FunctionParameter,
}

impl TypeContext {
    fn allows(self, word: &str) -> bool {
        match self {
            TypeContext::AggregateMember => true,
            TypeContext::FreeExpression => word != "mutable",
            TypeContext::FunctionParameter => {
                matches!(word, "const" | "short" | "long" | "signed" | "unsigned")
            }
        }
    }

    fn describe(self) -> &'static str {
        match self {
            TypeContext::FreeExpression => "a free declaration",
            TypeContext::AggregateMember => "a class member",
            TypeContext::FunctionParameter => "a function parameter",
        }
    }
}

/// Base names a sign or size keyword may attach to.
const SIZED_BASES: &[&str] = &["int", "char", "double"];

impl Parser {
    /// Parse a type node and resolve its base type.
    pub(crate) fn parse_type_node(&mut self, context: TypeContext) -> Result<TypeRef, ParseError> {
        let start = self.position;
        let mut modifiers = TypeModifierSet::default();
        self.parse_modifiers(&mut modifiers, context)?;

        for elaborated in ["struct", "class", "enum", "typename"] {
            if self.match_keyword(elaborated) {
                break;
            }
        }

        let takes_base = match self.peek() {
            Some(symbol) if symbol.is_identifier() => {
                !modifiers.has_sign_or_size() || SIZED_BASES.contains(&symbol.text.as_str())
            }
            Some(_) => self.check("::"),
            None => false,
        };
        let base = if takes_base {
            Some(self.parse_qualified_name()?)
        } else {
            None
        };

        // `int const`, `int unsigned`
        self.parse_modifiers(&mut modifiers, context)?;

        if base.is_none() && !modifiers.has_sign_or_size() {
            return Err(self.error(format!("Expected type, found {}", self.found())));
        }

        self.finish_type_node(start, base, modifiers)
    }

    fn finish_type_node(
        &mut self,
        start: usize,
        base: Option<String>,
        modifiers: TypeModifierSet,
    ) -> Result<TypeRef, ParseError> {
        let index = self.resolve_base_type(base.as_deref(), &modifiers, start)?;
        let indirection = self.parse_indirection();
        Ok(TypeRef {
            index,
            flags: modifiers.to_flags(),
            indirection,
        })
    }

    fn parse_modifiers(
        &mut self,
        modifiers: &mut TypeModifierSet,
        context: TypeContext,
    ) -> Result<(), ParseError> {
        loop {
            if self.match_keyword("volatile") {
                continue;
            }
            let word = match self.peek() {
                Some(symbol) if TypeModifierSet::is_modifier(&symbol.text) && !symbol.is_identifier() => {
                    symbol.text.clone()
                }
                _ => return Ok(()),
            };
            if !context.allows(&word) {
                return Err(self.error(format!(
                    "'{word}' is not allowed in {}",
                    context.describe()
                )));
            }
            modifiers.apply(&word).map_err(|message| self.error(message))?;
            self.advance();
        }
    }

    /// `[::] ident {:: ident}`, returned with `.` separators.
    pub(crate) fn parse_qualified_name(&mut self) -> Result<String, ParseError> {
        self.match_token("::");
        let mut parts = vec![self.expect_identifier("in type name")?.0];
        while self.check("::") && self.peek_ahead(1).is_some_and(|s| s.is_identifier()) {
            self.advance();
            parts.push(self.expect_identifier("after '::'")?.0);
        }
        Ok(parts.join("."))
    }

    /// Zero or one pointer/reference suffix. Repeated `*` collapses into one
    /// pointer level since only the pointer's own size matters for layout.
    fn parse_indirection(&mut self) -> Indirection {
        let indirection = if self.match_token("*") {
            while self.match_token("*") {}
            Indirection::Pointer
        } else if self.match_token("&&") {
            Indirection::RValueReference
        } else if self.match_token("&") {
            Indirection::Reference
        } else {
            Indirection::Value
        };
        if indirection != Indirection::Value {
            self.match_keyword("const");
        }
        indirection
    }

    /// Type table index for a base name under its sign/size modifiers.
    fn resolve_base_type(
        &self,
        base: Option<&str>,
        modifiers: &TypeModifierSet,
        start: usize,
    ) -> Result<usize, ParseError> {
        let name = modifiers
            .canonical_name(base)
            .map_err(|message| self.error_at(start, message))?;

        if modifiers.has_sign_or_size() {
            return self
                .type_table
                .find(&name)
                .ok_or_else(|| self.error_at(start, format!("Unknown built-in type '{name}'")));
        }

        match self.resolve_type_name(&name) {
            Some(index) => Ok(index),
            None => self.unresolved_type(&name, start),
        }
    }

    fn unresolved_type(&self, name: &str, start: usize) -> Result<usize, ParseError> {
        let shown = name.replace('.', "::");
        match self.options.unresolved_types {
            UnresolvedTypePolicy::Error => {
                Err(self.error_at(start, format!("Unknown type '{shown}'")))
            }
            UnresolvedTypePolicy::FallbackToInt => {
                let location = self.symbols.get(start).map(|s| s.location).unwrap_or_default();
                tracing::warn!(
                    "unknown type '{shown}' at line {}, column {}; treating it as int",
                    location.line,
                    location.column
                );
                self.type_table
                    .find("int")
                    .ok_or_else(|| self.error_at(start, "Fallback type 'int' is not registered"))
            }
        }
    }
}
