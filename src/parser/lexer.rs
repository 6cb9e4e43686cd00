//! Table-driven lexer
//!
//! Converts raw source text into a flat [`Symbol`] sequence consumed by the
//! parser. The lexer hard-codes no character classes: delimiters, comment and
//! preprocessor markers, brackets, quotes, punctuators, operators and keywords
//! all come from [`LexerTables`], filled once through the `register_*` calls
//! before [`Lexer::execute`] runs. [`Grammar`](super::grammar::Grammar) holds the
//! stock configuration.
//!
//! # Scan order
//!
//! At every position the rules are tried in a fixed priority:
//!
//! ```text
//! line-skipper → delimiter → grouper → quote → punctuator → terminator → operator
//! ```
//!
//! A position no rule claims extends the current character run. The run is
//! emitted when the next rule fires, as a number literal, keyword or
//! identifier.

use super::tree::SourceLocation;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;

/// Sub-kind attached to every registered operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Assignment,
    Relational,
    Arithmetic,
    Logical,
    Bitwise,
    MemberAccess,
    TernaryCandidate,
}

/// Which half of a bracket pair a grouper character is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrouperSide {
    Open,
    Close,
}

/// Punctuator classifiers a grammar can bind strings to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punctuator {
    ScopeResolution, // ::
    Colon,           // :
    Comma,           // ,
    Ellipsis,        // ...
}

/// Classifier of an emitted symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Identifier,
    Keyword,
    NumberLiteral,
    StringLiteral,
    /// A lone quote character; rewritten to `StringLiteral` once its closing
    /// quote is found.
    Quote,
    Operator(OperatorKind),
    Grouper(GrouperSide),
    Punctuator(Punctuator),
    StatementTerminator,
}

/// One classified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub text: String,
    /// Byte offset of the first character in the source text.
    pub offset: usize,
    pub location: SourceLocation,
    /// Position of this symbol in the sequence.
    pub index: usize,
}

impl Symbol {
    pub fn is_text(&self, text: &str) -> bool {
        self.text == text
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == SymbolKind::Keyword && self.text == word
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == SymbolKind::Identifier
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SymbolKind::Identifier => write!(f, "identifier '{}'", self.text),
            SymbolKind::Keyword => write!(f, "'{}'", self.text),
            SymbolKind::NumberLiteral => write!(f, "number literal {}", self.text),
            SymbolKind::StringLiteral => write!(f, "string literal \"{}\"", self.text),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

/// Pairing id shared by the open and close halves of a block marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkipperGroup(u32);

/// How a line-skipper marker behaves when the scan reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipperKind {
    /// Skips to the end of the line (`//`, `#`).
    Single,
    /// Opens a block that ends at the matching `Close` of the same group.
    Open(SkipperGroup),
    Close(SkipperGroup),
    /// Symmetric marker: opens a block, or closes the innermost block of the
    /// same group.
    OpenClose(SkipperGroup),
}

/// Lexer error type
#[derive(Debug)]
pub struct LexError {
    pub message: String,
    pub location: SourceLocation,
    pub offset: usize,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Lexer error at line {}, column {}: {}",
            self.location.line, self.location.column, self.message
        )
    }
}

impl std::error::Error for LexError {}

/// Parse-time configuration. Filled once, never touched by a scan.
#[derive(Debug, Clone, Default)]
pub struct LexerTables {
    delimiters: FxHashSet<char>,
    skippers: FxHashMap<String, SkipperKind>,
    groupers: FxHashMap<char, GrouperSide>,
    quotes: FxHashSet<char>,
    punctuators: FxHashMap<String, Punctuator>,
    operators: FxHashMap<String, OperatorKind>,
    keywords: FxHashSet<String>,
    terminator: Option<char>,
    next_group: u32,
}

impl LexerTables {
    pub fn delimiter_count(&self) -> usize {
        self.delimiters.len()
    }

    pub fn skipper_count(&self) -> usize {
        self.skippers.len()
    }

    /// Number of grouper characters (two per registered pair).
    pub fn grouper_count(&self) -> usize {
        self.groupers.len()
    }

    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    pub fn punctuator_count(&self) -> usize {
        self.punctuators.len()
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    pub fn keyword_count(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains(word)
    }

    pub fn punctuators(&self) -> impl Iterator<Item = (&str, Punctuator)> {
        self.punctuators.iter().map(|(text, kind)| (text.as_str(), *kind))
    }

    pub fn operators(&self) -> impl Iterator<Item = (&str, OperatorKind)> {
        self.operators.iter().map(|(text, kind)| (text.as_str(), *kind))
    }
}

/// Inserts `value` under `key` unless the key is already bound. A rebinding
/// to a different value is dropped with a warning.
fn insert_once<K, V>(map: &mut FxHashMap<K, V>, key: K, value: V, table: &str)
where
    K: std::hash::Hash + Eq + fmt::Debug,
    V: PartialEq + Copy + fmt::Debug,
{
    match map.get(&key) {
        Some(existing) if *existing != value => {
            tracing::warn!(
                "{table} {:?} already registered as {:?}, ignoring {:?}",
                key,
                existing,
                value
            );
        }
        Some(_) => {}
        None => {
            map.insert(key, value);
        }
    }
}

fn single_char(text: &str) -> Option<char> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn is_number(text: &str) -> bool {
    let mut digits = 0;
    let mut periods = 0;
    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => periods += 1,
            _ => return false,
        }
    }
    digits > 0 && periods <= 1
}

/// Lexer driven by [`LexerTables`]
#[derive(Debug, Default)]
pub struct Lexer {
    tables: LexerTables,
    source: String,
    input: Vec<(usize, char)>,
    position: usize,
    line: usize,
    column: usize,
    symbols: Vec<Symbol>,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source text and drop any previously produced symbols.
    pub fn set_source(&mut self, text: &str) {
        self.source = text.to_string();
        self.symbols.clear();
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tables(&self) -> &LexerTables {
        &self.tables
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }

    // ===== Configuration =====

    /// Allocate a fresh id for pairing an `Open` marker with its `Close`.
    pub fn allocate_skipper_group(&mut self) -> SkipperGroup {
        let group = SkipperGroup(self.tables.next_group);
        self.tables.next_group += 1;
        group
    }

    pub fn register_delimiter(&mut self, delimiter: &str) {
        match single_char(delimiter) {
            Some(c) => {
                self.tables.delimiters.insert(c);
            }
            None => tracing::warn!("delimiter {:?} must be a single character", delimiter),
        }
    }

    pub fn register_line_skipper(&mut self, marker: &str, kind: SkipperKind) {
        let len = marker.chars().count();
        if !(1..=2).contains(&len) {
            tracing::warn!("line skipper {:?} must be one or two characters", marker);
            return;
        }
        insert_once(&mut self.tables.skippers, marker.to_string(), kind, "line skipper");
    }

    /// Register a bracket pair given as a two-character string, e.g. `"()"`.
    pub fn register_grouper(&mut self, pair: &str) {
        let chars: Vec<char> = pair.chars().collect();
        let &[open, close] = chars.as_slice() else {
            tracing::warn!("grouper {:?} must be an open/close character pair", pair);
            return;
        };
        insert_once(&mut self.tables.groupers, open, GrouperSide::Open, "grouper");
        insert_once(&mut self.tables.groupers, close, GrouperSide::Close, "grouper");
    }

    pub fn register_string_quote(&mut self, quote: &str) {
        match single_char(quote) {
            Some(c) => {
                self.tables.quotes.insert(c);
            }
            None => tracing::warn!("string quote {:?} must be a single character", quote),
        }
    }

    pub fn register_punctuator(&mut self, text: &str, kind: Punctuator) {
        let len = text.chars().count();
        if !(1..=3).contains(&len) {
            tracing::warn!("punctuator {:?} must be one to three characters", text);
            return;
        }
        insert_once(&mut self.tables.punctuators, text.to_string(), kind, "punctuator");
    }

    pub fn register_operator(&mut self, text: &str, kind: OperatorKind) {
        let len = text.chars().count();
        if !(1..=2).contains(&len) {
            tracing::warn!("operator {:?} must be one or two characters", text);
            return;
        }
        insert_once(&mut self.tables.operators, text.to_string(), kind, "operator");
    }

    pub fn register_keyword(&mut self, word: &str) {
        if word.is_empty() || word.chars().any(char::is_whitespace) {
            tracing::warn!("keyword {:?} must be a non-empty word", word);
            return;
        }
        self.tables.keywords.insert(word.to_string());
    }

    pub fn set_statement_terminator(&mut self, terminator: &str) {
        match single_char(terminator) {
            Some(c) => self.tables.terminator = Some(c),
            None => tracing::warn!(
                "statement terminator {:?} must be a single character",
                terminator
            ),
        }
    }

    // ===== Scan =====

    /// Tokenize the whole source into the symbol table.
    pub fn execute(&mut self) -> Result<(), LexError> {
        self.input = self.source.char_indices().collect();
        self.position = 0;
        self.line = 1;
        self.column = 1;
        self.symbols.clear();

        let mut run: Option<(usize, SourceLocation)> = None;

        while !self.is_at_end() {
            if let Some((len, kind)) = self.match_skipper() {
                self.flush_run(&mut run);
                match kind {
                    SkipperKind::Single => self.skip_line(),
                    SkipperKind::Open(group) | SkipperKind::OpenClose(group) => {
                        self.skip_block(len, group)?
                    }
                    SkipperKind::Close(_) => {
                        return Err(self.error_here(format!(
                            "Unmatched block close marker '{}'",
                            self.peek_str(len).unwrap_or_default()
                        )));
                    }
                }
                continue;
            }

            let Some(ch) = self.peek() else { break };

            if self.tables.delimiters.contains(&ch) {
                self.flush_run(&mut run);
                self.advance(1);
                continue;
            }

            if let Some(side) = self.tables.groupers.get(&ch).copied() {
                self.flush_run(&mut run);
                self.emit(SymbolKind::Grouper(side), 1);
                continue;
            }

            if self.tables.quotes.contains(&ch) {
                self.flush_run(&mut run);
                self.emit(SymbolKind::Quote, 1);
                continue;
            }

            if let Some((len, kind)) = self.match_punctuator() {
                self.flush_run(&mut run);
                self.emit(SymbolKind::Punctuator(kind), len);
                continue;
            }

            if self.tables.terminator == Some(ch) {
                self.flush_run(&mut run);
                self.emit(SymbolKind::StatementTerminator, 1);
                continue;
            }

            if let Some((len, kind)) = self.match_operator() {
                if !self.is_decimal_point(&run) {
                    self.flush_run(&mut run);
                    self.emit(SymbolKind::Operator(kind), len);
                    continue;
                }
            }

            // No rule matched: grow the current run
            if run.is_none() {
                run = Some((self.position, self.current_location()));
            }
            self.advance(1);
        }

        self.flush_run(&mut run);
        self.stitch_strings();

        for (index, symbol) in self.symbols.iter_mut().enumerate() {
            symbol.index = index;
        }

        tracing::debug!("lexed {} symbols", self.symbols.len());
        Ok(())
    }

    /// Longest line-skipper marker at the current position (two characters,
    /// then one).
    fn match_skipper(&self) -> Option<(usize, SkipperKind)> {
        (1..=2).rev().find_map(|len| {
            let text = self.peek_str(len)?;
            self.tables.skippers.get(text).map(|kind| (len, *kind))
        })
    }

    fn match_punctuator(&self) -> Option<(usize, Punctuator)> {
        (1..=3).rev().find_map(|len| {
            let text = self.peek_str(len)?;
            self.tables.punctuators.get(text).map(|kind| (len, *kind))
        })
    }

    fn match_operator(&self) -> Option<(usize, OperatorKind)> {
        (1..=2).rev().find_map(|len| {
            let text = self.peek_str(len)?;
            self.tables.operators.get(text).map(|kind| (len, *kind))
        })
    }

    /// A `.` between digits belongs to the number run (`1.5`), not to the
    /// member-access operator.
    fn is_decimal_point(&self, run: &Option<(usize, SourceLocation)>) -> bool {
        if self.peek() != Some('.') || !self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) {
            return false;
        }
        match run {
            None => true,
            Some((start, _)) => {
                let text = &self.source[self.byte_offset(*start)..self.byte_offset(self.position)];
                text.chars().all(|c| c.is_ascii_digit())
            }
        }
    }

    /// Skip a single-line marker through the end of the line.
    fn skip_line(&mut self) {
        while let Some(ch) = self.peek() {
            self.advance(1);
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skip a balanced block opened by the `marker_len` characters at the
    /// current position. Inner opens of any group nest; a close must match
    /// the innermost open.
    fn skip_block(&mut self, marker_len: usize, group: SkipperGroup) -> Result<(), LexError> {
        let start_loc = self.current_location();
        let start_offset = self.byte_offset(self.position);
        let mut stack = vec![group];
        self.advance(marker_len);

        while !stack.is_empty() {
            if self.is_at_end() {
                return Err(LexError {
                    message: "Unterminated block comment".to_string(),
                    location: start_loc,
                    offset: start_offset,
                });
            }

            match self.match_skipper() {
                Some((len, SkipperKind::Open(inner))) => {
                    stack.push(inner);
                    self.advance(len);
                }
                Some((len, SkipperKind::Close(inner))) => {
                    if stack.last() != Some(&inner) {
                        return Err(self.error_here(format!(
                            "Unmatched block close marker '{}'",
                            self.peek_str(len).unwrap_or_default()
                        )));
                    }
                    stack.pop();
                    self.advance(len);
                }
                Some((len, SkipperKind::OpenClose(inner))) => {
                    if stack.last() == Some(&inner) {
                        stack.pop();
                    } else {
                        stack.push(inner);
                    }
                    self.advance(len);
                }
                Some((_, SkipperKind::Single)) | None => self.advance(1),
            }
        }

        Ok(())
    }

    /// Emit the pending character run, if any, as a number, keyword or
    /// identifier.
    fn flush_run(&mut self, run: &mut Option<(usize, SourceLocation)>) {
        let Some((start, location)) = run.take() else {
            return;
        };
        let offset = self.byte_offset(start);
        let text = self.source[offset..self.byte_offset(self.position)].to_string();
        let kind = if is_number(&text) {
            SymbolKind::NumberLiteral
        } else if self.tables.keywords.contains(&text) {
            SymbolKind::Keyword
        } else {
            SymbolKind::Identifier
        };
        self.symbols.push(Symbol {
            kind,
            text,
            offset,
            location,
            index: 0,
        });
    }

    /// Emit the next `len` characters as one symbol and advance past them.
    fn emit(&mut self, kind: SymbolKind, len: usize) {
        let offset = self.byte_offset(self.position);
        let location = self.current_location();
        let text = self.peek_str(len).unwrap_or_default().to_string();
        self.symbols.push(Symbol {
            kind,
            text,
            offset,
            location,
            index: 0,
        });
        self.advance(len);
    }

    /// Collapse every `Quote … Quote` run with matching quote characters into
    /// one `StringLiteral` holding the raw text between the quotes.
    fn stitch_strings(&mut self) {
        // Index of the next quote symbol with the same text, built back to front.
        let mut next_same: Vec<Option<usize>> = vec![None; self.symbols.len()];
        {
            let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
            for (j, symbol) in self.symbols.iter().enumerate().rev() {
                if symbol.kind == SymbolKind::Quote {
                    next_same[j] = seen.insert(symbol.text.as_str(), j);
                }
            }
        }
        let offsets: Vec<usize> = self.symbols.iter().map(|s| s.offset).collect();

        let symbols = std::mem::take(&mut self.symbols);
        let mut stitched = Vec::with_capacity(symbols.len());
        let mut skip_to = 0;
        for (i, symbol) in symbols.into_iter().enumerate() {
            if i < skip_to {
                continue;
            }
            let close = match next_same[i] {
                Some(close) if symbol.kind == SymbolKind::Quote => close,
                _ => {
                    stitched.push(symbol);
                    continue;
                }
            };
            let start = symbol.offset + symbol.text.len();
            stitched.push(Symbol {
                kind: SymbolKind::StringLiteral,
                text: self.source[start..offsets[close]].to_string(),
                offset: symbol.offset,
                location: symbol.location,
                index: 0,
            });
            skip_to = close + 1;
        }
        self.symbols = stitched;
    }

    // ===== Cursor helpers =====

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).map(|(_, c)| *c)
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.input.get(self.position + n).map(|(_, c)| *c)
    }

    /// The next `len` characters as a source slice, if that many remain.
    fn peek_str(&self, len: usize) -> Option<&str> {
        if self.position + len > self.input.len() {
            return None;
        }
        let start = self.byte_offset(self.position);
        let end = self.byte_offset(self.position + len);
        Some(&self.source[start..end])
    }

    fn byte_offset(&self, position: usize) -> usize {
        self.input
            .get(position)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source.len())
    }

    fn advance(&mut self, n: usize) {
        for _ in 0..n {
            let Some(ch) = self.peek() else { return };
            self.position += 1;
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn error_here(&self, message: String) -> LexError {
        LexError {
            message,
            location: self.current_location(),
            offset: self.byte_offset(self.position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::grammar::Grammar;

    fn lex(source: &str) -> Vec<Symbol> {
        let mut lexer = Grammar::Cpp.lexer();
        lexer.set_source(source);
        lexer.execute().unwrap();
        lexer.into_symbols()
    }

    fn texts(symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_simple_tokens() {
        let symbols = lex("struct Foo { float x; };");

        assert_eq!(texts(&symbols), ["struct", "Foo", "{", "float", "x", ";", "}", ";"]);
        assert_eq!(symbols[0].kind, SymbolKind::Keyword);
        assert_eq!(symbols[1].kind, SymbolKind::Identifier);
        assert_eq!(symbols[2].kind, SymbolKind::Grouper(GrouperSide::Open));
        assert_eq!(symbols[5].kind, SymbolKind::StatementTerminator);
        assert_eq!(symbols[6].kind, SymbolKind::Grouper(GrouperSide::Close));
        assert!(symbols.iter().enumerate().all(|(i, s)| s.index == i));
    }

    #[test]
    fn test_operators_longest_match() {
        let symbols = lex("a += b && c -> d");

        assert_eq!(texts(&symbols), ["a", "+=", "b", "&&", "c", "->", "d"]);
        assert_eq!(symbols[1].kind, SymbolKind::Operator(OperatorKind::Assignment));
        assert_eq!(symbols[3].kind, SymbolKind::Operator(OperatorKind::Logical));
        assert_eq!(symbols[5].kind, SymbolKind::Operator(OperatorKind::MemberAccess));
    }

    #[test]
    fn test_punctuators_longest_match() {
        let symbols = lex("N::S a, b: ...");

        assert_eq!(texts(&symbols), ["N", "::", "S", "a", ",", "b", ":", "..."]);
        assert_eq!(
            symbols[1].kind,
            SymbolKind::Punctuator(Punctuator::ScopeResolution)
        );
        assert_eq!(symbols[7].kind, SymbolKind::Punctuator(Punctuator::Ellipsis));
    }

    #[test]
    fn test_numbers() {
        let symbols = lex("1 2.5 .5 a.b 3f");

        assert_eq!(texts(&symbols), ["1", "2.5", ".5", "a", ".", "b", "3f"]);
        assert_eq!(symbols[0].kind, SymbolKind::NumberLiteral);
        assert_eq!(symbols[1].kind, SymbolKind::NumberLiteral);
        assert_eq!(symbols[2].kind, SymbolKind::NumberLiteral);
        assert_eq!(symbols[4].kind, SymbolKind::Operator(OperatorKind::MemberAccess));
        assert_eq!(symbols[6].kind, SymbolKind::Identifier);
    }

    #[test]
    fn test_comments() {
        let symbols = lex("int x; // comment\nint y; /* block\ncomment */ int z;");

        assert_eq!(texts(&symbols), ["int", "x", ";", "int", "y", ";", "int", "z", ";"]);
        assert_eq!(symbols[3].location, SourceLocation::new(2, 1));
    }

    #[test]
    fn test_nested_block_comment() {
        let symbols = lex("/* outer /* inner */ still outer */ int a;");
        assert_eq!(texts(&symbols), ["int", "a", ";"]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut lexer = Grammar::Cpp.lexer();
        lexer.set_source("int a; /* never closed");
        let err = lexer.execute().unwrap_err();
        assert!(err.message.contains("Unterminated"));
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn test_stray_block_close() {
        let mut lexer = Grammar::Cpp.lexer();
        lexer.set_source("int a; */ int b;");
        assert!(lexer.execute().is_err());
    }

    #[test]
    fn test_preprocessor_skip() {
        let symbols = lex("#pragma once\n#include <x.h>\nint x;");
        assert_eq!(texts(&symbols), ["int", "x", ";"]);
    }

    #[test]
    fn test_string_literal() {
        let symbols = lex(r#"a = "hello world"; b = "x";"#);

        assert_eq!(symbols[2].kind, SymbolKind::StringLiteral);
        assert_eq!(symbols[2].text, "hello world");
        assert_eq!(symbols[2].offset, 4);
        assert_eq!(symbols[6].text, "x");
        assert_eq!(symbols.len(), 8);
    }

    #[test]
    fn test_unmatched_quote_left_alone() {
        let symbols = lex(r#"a = 'x; b = "y";"#);

        assert_eq!(texts(&symbols), ["a", "=", "'", "x", ";", "b", "=", "y", ";"]);
        assert_eq!(symbols[2].kind, SymbolKind::Quote);
        assert_eq!(symbols[7].kind, SymbolKind::StringLiteral);
        assert_eq!(symbols[7].offset, 12);
        assert!(symbols.iter().enumerate().all(|(i, s)| s.index == i));
    }

    #[test]
    fn test_symmetric_block_marker() {
        let mut lexer = Lexer::new();
        lexer.register_delimiter(" ");
        lexer.set_statement_terminator(";");
        let group = lexer.allocate_skipper_group();
        lexer.register_line_skipper("%%", SkipperKind::OpenClose(group));

        lexer.set_source("%% hidden ; %% visible");
        lexer.execute().unwrap();
        assert_eq!(texts(lexer.symbols()), ["visible"]);

        lexer.set_source("%% hidden visible");
        let err = lexer.execute().unwrap_err();
        assert!(err.message.contains("Unterminated"));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_symmetric_marker_around_nested_block() {
        let mut lexer = Grammar::Cpp.lexer();
        let group = lexer.allocate_skipper_group();
        lexer.register_line_skipper("%%", SkipperKind::OpenClose(group));

        lexer.set_source("%% /* x */ %% int y;");
        lexer.execute().unwrap();
        assert_eq!(texts(lexer.symbols()), ["int", "y", ";"]);
    }

    #[test]
    fn test_malformed_registration_is_dropped() {
        let mut lexer = Lexer::new();
        lexer.register_operator("<<=", OperatorKind::Assignment);
        lexer.register_punctuator("....", Punctuator::Ellipsis);
        lexer.register_grouper("(");
        lexer.register_delimiter("ab");

        let tables = lexer.tables();
        assert_eq!(tables.operator_count(), 0);
        assert_eq!(tables.punctuator_count(), 0);
        assert_eq!(tables.grouper_count(), 0);
        assert_eq!(tables.delimiter_count(), 0);
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let mut lexer = Grammar::Cpp.lexer();
        let before = lexer.tables().clone();

        lexer.register_keyword("struct");
        lexer.register_operator("+=", OperatorKind::Assignment);
        lexer.register_punctuator("::", Punctuator::ScopeResolution);
        lexer.register_line_skipper("//", SkipperKind::Single);

        let after = lexer.tables();
        assert_eq!(before.keyword_count(), after.keyword_count());
        assert_eq!(before.operator_count(), after.operator_count());
        assert_eq!(before.punctuator_count(), after.punctuator_count());
        assert_eq!(before.skipper_count(), after.skipper_count());
    }

    #[test]
    fn test_offsets_non_decreasing() {
        let symbols = lex("namespace N { struct S { int v; }; } // tail");
        assert!(symbols.windows(2).all(|w| w[0].offset <= w[1].offset));
    }
}
