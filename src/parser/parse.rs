//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, options, helper methods, and the parse entry points.
//!
//! # Parser Architecture
//!
//! The Parser is a recursive descent over the lexer's symbol sequence:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: namespaces, aliases, classes, enums, functions
//! - `type_node`: type prefixes, base names and pointer/reference suffixes
//! - `resolve`: name lookup and [`TypeInfo`] construction
//!
//! # State lifetime
//!
//! The symbol sequence and syntax tree are rebuilt on every [`Parser::execute`].
//! The type table, alias table and type infos persist across calls, so a later
//! input may use types an earlier one declared.

use crate::parser::grammar::Grammar;
use crate::parser::lexer::{GrouperSide, LexError, Lexer, Symbol, SymbolKind};
use crate::parser::tree::{NodeId, SourceLocation, SyntaxTree};
use crate::parser::types::{AliasTable, EntryKind, TypeFlags, TypeInfo, TypeInfoTable, TypeTable};
use std::fmt;

/// Parser error type
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
    pub offset: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Parse error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
            offset: err.offset,
        }
    }
}

/// What to do with a type name that resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnresolvedTypePolicy {
    /// Abort the parse.
    #[default]
    Error,
    /// Log a warning and treat the name as `int`.
    FallbackToInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    pub unresolved_types: UnresolvedTypePolicy,
    /// Size of pointer and reference members.
    pub pointer_size: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            unresolved_types: UnresolvedTypePolicy::default(),
            pointer_size: std::mem::size_of::<usize>(),
        }
    }
}

/// An enclosing namespace or class during the descent.
#[derive(Debug, Clone)]
pub(crate) struct Scope {
    pub(crate) node: NodeId,
    pub(crate) full_name: String,
}

impl Scope {
    pub(crate) fn qualify(&self, name: &str) -> String {
        if self.full_name.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", self.full_name, name)
        }
    }
}

/// Recursive descent parser producing a syntax tree and type layouts
pub struct Parser {
    pub(crate) grammar: Grammar,
    pub(crate) options: ParserOptions,
    pub(crate) symbols: Vec<Symbol>,
    pub(crate) position: usize,
    pub(crate) tree: SyntaxTree,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) type_table: TypeTable,
    pub(crate) aliases: AliasTable,
    pub(crate) type_infos: TypeInfoTable,
    pub(crate) errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(grammar: Grammar) -> Self {
        Self::with_options(grammar, ParserOptions::default())
    }

    pub fn with_options(grammar: Grammar, options: ParserOptions) -> Self {
        let mut parser = Parser {
            grammar,
            options,
            symbols: Vec::new(),
            position: 0,
            tree: SyntaxTree::new(),
            scopes: vec![Scope {
                node: SyntaxTree::ROOT,
                full_name: String::new(),
            }],
            type_table: TypeTable::new(),
            aliases: AliasTable::default(),
            type_infos: TypeInfoTable::default(),
            errors: Vec::new(),
        };
        for builtin in grammar.builtin_types() {
            parser.register_builtin(builtin.name, builtin.size);
        }
        parser
    }

    /// Pre-declare a built-in type with its host size. Registering a name
    /// that already exists is a no-op.
    pub fn register_builtin(&mut self, name: &str, size: usize) -> usize {
        let flags = TypeFlags::from_builtin_name(name);
        self.type_table.register(name, EntryKind::Builtin { flags, size })
    }

    /// Lex `source` with this parser's grammar, then parse it.
    pub fn parse(&mut self, source: &str) -> Result<(), ParseError> {
        let mut lexer = self.grammar.lexer();
        lexer.set_source(source);
        if let Err(err) = lexer.execute() {
            let err = ParseError::from(err);
            self.errors.push(err.clone());
            return Err(err);
        }
        self.execute(lexer)
    }

    /// Parse the symbols of a lexer that has already run.
    ///
    /// On error nothing is rolled back; whatever was registered before the
    /// failure stays in the tables.
    pub fn execute(&mut self, lexer: Lexer) -> Result<(), ParseError> {
        self.symbols = lexer.into_symbols();
        self.position = 0;
        self.tree = SyntaxTree::new();
        self.scopes.truncate(1);

        while !self.is_at_end() {
            if let Err(err) = self.parse_declaration() {
                tracing::debug!("parse failed: {err}");
                self.errors.push(err.clone());
                return Err(err);
            }
        }

        tracing::debug!(
            "parsed {} symbols into {} nodes, {} type layouts known",
            self.symbols.len(),
            self.tree.len(),
            self.type_infos.len()
        );
        Ok(())
    }

    // ===== Queries =====

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn type_table(&self) -> &TypeTable {
        &self.type_table
    }

    pub fn alias_table(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn type_infos(&self) -> &TypeInfoTable {
        &self.type_infos
    }

    pub fn type_info(&self, index: usize) -> Option<&TypeInfo> {
        self.type_infos.get(index)
    }

    /// Layout for a type name as written in source (`N::S`) or qualified
    /// (`N.S`), following aliases.
    pub fn type_info_by_name(&self, name: &str) -> Option<&TypeInfo> {
        let index = self.resolve_type_name(name)?;
        let entry = self.type_table.get(index)?;
        self.type_infos.find(&entry.name)
    }

    /// Every error reported so far, oldest first.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    // ===== Helper methods =====

    pub(crate) fn scope(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.position >= self.symbols.len()
    }

    pub(crate) fn peek(&self) -> Option<&Symbol> {
        self.symbols.get(self.position)
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Symbol> {
        self.symbols.get(self.position + n)
    }

    pub(crate) fn advance(&mut self) -> Option<&Symbol> {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.position.checked_sub(1).and_then(|i| self.symbols.get(i))
    }

    /// True if the current symbol is the punctuation/operator/keyword `text`.
    /// String literals never match.
    pub(crate) fn check(&self, text: &str) -> bool {
        self.peek()
            .is_some_and(|s| s.kind != SymbolKind::StringLiteral && s.text == text)
    }

    pub(crate) fn check_ahead(&self, n: usize, text: &str) -> bool {
        self.peek_ahead(n)
            .is_some_and(|s| s.kind != SymbolKind::StringLiteral && s.text == text)
    }

    pub(crate) fn check_keyword(&self, word: &str) -> bool {
        self.peek().is_some_and(|s| s.is_keyword(word))
    }

    pub(crate) fn check_identifier(&self) -> bool {
        self.peek().is_some_and(Symbol::is_identifier)
    }

    pub(crate) fn match_token(&mut self, text: &str) -> bool {
        if self.check(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn match_keyword(&mut self, word: &str) -> bool {
        if self.check_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek()
            .or_else(|| self.symbols.last())
            .map(|s| s.location)
            .unwrap_or_default()
    }

    pub(crate) fn current_offset(&self) -> usize {
        self.peek()
            .or_else(|| self.symbols.last())
            .map(|s| s.offset)
            .unwrap_or(0)
    }

    /// Describe the current symbol for an error message.
    pub(crate) fn found(&self) -> String {
        match self.peek() {
            Some(symbol) => symbol.to_string(),
            None => "end of input".to_string(),
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            location: self.current_location(),
            offset: self.current_offset(),
        }
    }

    pub(crate) fn error_at(&self, symbol: usize, message: impl Into<String>) -> ParseError {
        let (location, offset) = self
            .symbols
            .get(symbol)
            .map(|s| (s.location, s.offset))
            .unwrap_or_default();
        ParseError {
            message: message.into(),
            location,
            offset,
        }
    }

    /// Consume `text` or fail; returns the consumed symbol's index.
    pub(crate) fn expect_token(&mut self, text: &str, ctx: &str) -> Result<usize, ParseError> {
        if self.check(text) {
            let index = self.position;
            self.advance();
            Ok(index)
        } else {
            Err(self.error(format!("Expected '{text}' {ctx}, found {}", self.found())))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<usize, ParseError> {
        self.expect_token("(", ctx)
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<usize, ParseError> {
        self.expect_token("{", ctx)
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<usize, ParseError> {
        self.expect_token("}", ctx)
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<usize, ParseError> {
        self.expect_token(";", ctx)
    }

    /// Consume an identifier; returns its text and symbol index.
    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<(String, usize), ParseError> {
        match self.peek() {
            Some(symbol) if symbol.is_identifier() => {
                let name = symbol.text.clone();
                let index = self.position;
                self.advance();
                Ok((name, index))
            }
            _ => Err(self.error(format!("Expected identifier {ctx}, found {}", self.found()))),
        }
    }

    /// With the cursor on an opening bracket, consume through its matching
    /// close.
    pub(crate) fn skip_balanced(&mut self, open: &str, close: &str) -> Result<(), ParseError> {
        let start = self.position;
        self.expect_token(open, "to open block")?;
        let mut depth = 1usize;

        while depth > 0 {
            if self.is_at_end() {
                return Err(self.error_at(start, format!("Unmatched '{open}'")));
            }
            if self.check(open) {
                depth += 1;
            } else if self.check(close) {
                depth -= 1;
            }
            self.advance();
        }
        Ok(())
    }

    /// Skip an initializer or default argument up to (not including) the
    /// first of `stops` at bracket depth zero.
    pub(crate) fn skip_until_any(&mut self, stops: &[&str]) -> Result<(), ParseError> {
        let start = self.position;
        let mut depth = 0usize;

        loop {
            let Some(symbol) = self.peek() else {
                return Err(self.error_at(start, "Unexpected end of input in initializer"));
            };
            let kind = symbol.kind;
            if depth == 0 && stops.iter().any(|stop| self.check(stop)) {
                return Ok(());
            }
            match kind {
                SymbolKind::Grouper(GrouperSide::Open) => depth += 1,
                SymbolKind::Grouper(GrouperSide::Close) => {
                    if depth == 0 {
                        return Err(self.error(format!("Unexpected {}", self.found())));
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }
}
