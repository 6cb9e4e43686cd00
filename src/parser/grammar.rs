//! Declarative grammar descriptions
//!
//! Each supported input grammar is plain configuration: the lexer tables it
//! registers and the built-in types it pre-declares. One engine
//! ([`Lexer`] + [`Parser`](super::parse::Parser)) runs every grammar.

use super::lexer::{Lexer, OperatorKind, Punctuator, SkipperKind};
use std::ffi::{c_char, c_int, c_long, c_longlong, c_short, c_uchar, c_uint, c_ulong, c_ulonglong, c_ushort};
use std::mem::size_of;

/// A type known before any declaration is parsed, with its exact host size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinType {
    pub name: &'static str,
    pub size: usize,
}

const fn builtin(name: &'static str, size: usize) -> BuiltinType {
    BuiltinType { name, size }
}

/// `long double` has no Rust counterpart; this is the C ABI size on the
/// usual targets (x87 80-bit padded to 16, IEEE quad on AArch64 Linux,
/// plain `double` on MSVC and Apple).
const LONG_DOUBLE_SIZE: usize = if cfg!(any(target_env = "msvc", target_vendor = "apple")) {
    size_of::<f64>()
} else if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
    16
} else if cfg!(target_arch = "x86") {
    12
} else {
    size_of::<f64>()
};

/// Supported input grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Grammar {
    /// Class/struct/namespace/function subset of C++ headers.
    #[default]
    Cpp,
}

const CPP_KEYWORDS: &[&str] = &[
    "namespace", "using", "typedef", "struct", "class", "enum", "union",
    "public", "private", "protected",
    "const", "constexpr", "mutable", "static", "thread_local", "volatile", "extern",
    "signed", "unsigned", "short", "long",
    "virtual", "inline", "explicit", "friend", "operator",
    "noexcept", "override", "final", "abstract", "default", "delete",
    "alignas", "template", "typename",
    "return", "true", "false", "nullptr",
];

const CPP_OPERATORS: &[(&str, OperatorKind)] = &[
    ("=", OperatorKind::Assignment),
    ("+=", OperatorKind::Assignment),
    ("-=", OperatorKind::Assignment),
    ("*=", OperatorKind::Assignment),
    ("/=", OperatorKind::Assignment),
    ("%=", OperatorKind::Assignment),
    ("&=", OperatorKind::Assignment),
    ("|=", OperatorKind::Assignment),
    ("^=", OperatorKind::Assignment),
    ("==", OperatorKind::Relational),
    ("!=", OperatorKind::Relational),
    ("<", OperatorKind::Relational),
    (">", OperatorKind::Relational),
    ("<=", OperatorKind::Relational),
    (">=", OperatorKind::Relational),
    ("+", OperatorKind::Arithmetic),
    ("-", OperatorKind::Arithmetic),
    ("*", OperatorKind::Arithmetic),
    ("/", OperatorKind::Arithmetic),
    ("%", OperatorKind::Arithmetic),
    ("++", OperatorKind::Arithmetic),
    ("--", OperatorKind::Arithmetic),
    ("&&", OperatorKind::Logical),
    ("||", OperatorKind::Logical),
    ("!", OperatorKind::Logical),
    ("&", OperatorKind::Bitwise),
    ("|", OperatorKind::Bitwise),
    ("^", OperatorKind::Bitwise),
    ("~", OperatorKind::Bitwise),
    ("<<", OperatorKind::Bitwise),
    (">>", OperatorKind::Bitwise),
    (".", OperatorKind::MemberAccess),
    ("->", OperatorKind::MemberAccess),
    ("?", OperatorKind::TernaryCandidate),
];

const CPP_PUNCTUATORS: &[(&str, Punctuator)] = &[
    ("::", Punctuator::ScopeResolution),
    (":", Punctuator::Colon),
    (",", Punctuator::Comma),
    ("...", Punctuator::Ellipsis),
];

impl Grammar {
    /// Run the one-time `register_*` sequence for this grammar.
    pub fn configure(self, lexer: &mut Lexer) {
        match self {
            Grammar::Cpp => {
                for delimiter in [" ", "\t", "\r", "\n"] {
                    lexer.register_delimiter(delimiter);
                }

                lexer.register_line_skipper("//", SkipperKind::Single);
                lexer.register_line_skipper("#", SkipperKind::Single);
                let block = lexer.allocate_skipper_group();
                lexer.register_line_skipper("/*", SkipperKind::Open(block));
                lexer.register_line_skipper("*/", SkipperKind::Close(block));

                for pair in ["()", "{}", "[]"] {
                    lexer.register_grouper(pair);
                }
                for quote in ["\"", "'"] {
                    lexer.register_string_quote(quote);
                }
                for (text, kind) in CPP_PUNCTUATORS {
                    lexer.register_punctuator(text, *kind);
                }
                lexer.set_statement_terminator(";");
                for (text, kind) in CPP_OPERATORS {
                    lexer.register_operator(text, *kind);
                }
                for keyword in CPP_KEYWORDS {
                    lexer.register_keyword(keyword);
                }
            }
        }
    }

    /// A fresh lexer with this grammar's tables registered.
    pub fn lexer(self) -> Lexer {
        let mut lexer = Lexer::new();
        self.configure(&mut lexer);
        lexer
    }

    /// Built-in types with their host sizes. Multi-word names are the
    /// canonical spelling the type resolver builds from a modifier prefix.
    pub fn builtin_types(self) -> Vec<BuiltinType> {
        match self {
            Grammar::Cpp => vec![
                builtin("void", 0),
                builtin("bool", size_of::<bool>()),
                builtin("char", size_of::<c_char>()),
                builtin("signed char", size_of::<c_char>()),
                builtin("unsigned char", size_of::<c_uchar>()),
                builtin("short", size_of::<c_short>()),
                builtin("unsigned short", size_of::<c_ushort>()),
                builtin("int", size_of::<c_int>()),
                builtin("unsigned int", size_of::<c_uint>()),
                builtin("long", size_of::<c_long>()),
                builtin("unsigned long", size_of::<c_ulong>()),
                builtin("long long", size_of::<c_longlong>()),
                builtin("unsigned long long", size_of::<c_ulonglong>()),
                builtin("float", size_of::<f32>()),
                builtin("double", size_of::<f64>()),
                builtin("long double", LONG_DOUBLE_SIZE),
                builtin("int8_t", size_of::<i8>()),
                builtin("uint8_t", size_of::<u8>()),
                builtin("int16_t", size_of::<i16>()),
                builtin("uint16_t", size_of::<u16>()),
                builtin("int32_t", size_of::<i32>()),
                builtin("uint32_t", size_of::<u32>()),
                builtin("int64_t", size_of::<i64>()),
                builtin("uint64_t", size_of::<u64>()),
                builtin("size_t", size_of::<usize>()),
                builtin("Vector2", size_of::<[f32; 2]>()),
                builtin("Vector3", size_of::<[f32; 3]>()),
                builtin("Vector4", size_of::<[f32; 4]>()),
                builtin("Matrix3", size_of::<[f32; 9]>()),
                builtin("Matrix4", size_of::<[f32; 16]>()),
            ],
        }
    }
}
