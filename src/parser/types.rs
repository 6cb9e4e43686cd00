//! Type model: modifier flags, the type table, aliases and resolved layouts
//!
//! - [`TypeModifierSet`]: transient prefix state while a type node is parsed
//! - [`TypeTable`]: every known type name, built-in or user-defined
//! - [`AliasTable`]: `using`/`typedef` names mapped onto type table indices
//! - [`TypeInfo`] / [`TypeInfoTable`]: finished layouts (size, offset, members)
//!
//! Type names are fully qualified with `.` between scopes (`Render.Vertex`).

use rustc_hash::FxHashMap;
use std::fmt;

/// Packed form of a [`TypeModifierSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeFlags(u16);

impl TypeFlags {
    pub const CONST: TypeFlags = TypeFlags(1 << 0);
    pub const CONSTEXPR: TypeFlags = TypeFlags(1 << 1);
    pub const MUTABLE: TypeFlags = TypeFlags(1 << 2);
    pub const STATIC: TypeFlags = TypeFlags(1 << 3);
    pub const THREAD_LOCAL: TypeFlags = TypeFlags(1 << 4);
    pub const SHORT: TypeFlags = TypeFlags(1 << 5);
    pub const LONG: TypeFlags = TypeFlags(1 << 6);
    pub const LONG_LONG: TypeFlags = TypeFlags(1 << 7);
    pub const UNSIGNED: TypeFlags = TypeFlags(1 << 8);
    /// Sign was spelled out explicitly (`signed` or `unsigned`).
    pub const EXPLICIT_SIGN: TypeFlags = TypeFlags(1 << 9);

    pub const fn empty() -> Self {
        TypeFlags(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: TypeFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: TypeFlags) {
        self.0 |= other.0;
    }

    pub const fn union(self, other: TypeFlags) -> Self {
        TypeFlags(self.0 | other.0)
    }

    /// Flags implied by a canonical built-in name such as `unsigned long long`.
    pub fn from_builtin_name(name: &str) -> Self {
        let mut flags = TypeFlags::empty();
        let words: Vec<&str> = name.split(' ').collect();
        if words.contains(&"unsigned") {
            flags.insert(TypeFlags::UNSIGNED.union(TypeFlags::EXPLICIT_SIGN));
        }
        if words.contains(&"signed") {
            flags.insert(TypeFlags::EXPLICIT_SIGN);
        }
        if words.contains(&"short") {
            flags.insert(TypeFlags::SHORT);
        }
        match words.iter().filter(|w| **w == "long").count() {
            0 => {}
            1 => flags.insert(TypeFlags::LONG),
            _ => flags.insert(TypeFlags::LONG_LONG),
        }
        flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Signed,
    Unsigned,
}

/// Modifier keywords collected from a declaration's type prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeModifierSet {
    pub is_const: bool,
    pub is_constexpr: bool,
    pub is_mutable: bool,
    pub is_static: bool,
    pub is_thread_local: bool,
    pub is_short: bool,
    pub long_count: u8,
    pub sign: Option<Sign>,
}

impl TypeModifierSet {
    pub const KEYWORDS: &'static [&'static str] = &[
        "const", "constexpr", "mutable", "static", "thread_local",
        "short", "long", "signed", "unsigned",
    ];

    pub fn is_modifier(word: &str) -> bool {
        Self::KEYWORDS.contains(&word)
    }

    /// Fold one modifier keyword into the set, rejecting combinations that
    /// cannot appear together.
    pub fn apply(&mut self, word: &str) -> Result<(), String> {
        let duplicate = || format!("Duplicate '{word}' in type");
        match word {
            "const" => {
                if self.is_const {
                    return Err(duplicate());
                }
                if self.is_mutable {
                    return Err("'const' conflicts with 'mutable'".to_string());
                }
                self.is_const = true;
            }
            "constexpr" => {
                if self.is_constexpr {
                    return Err(duplicate());
                }
                if self.is_mutable {
                    return Err("'constexpr' conflicts with 'mutable'".to_string());
                }
                self.is_constexpr = true;
            }
            "mutable" => {
                if self.is_mutable {
                    return Err(duplicate());
                }
                if self.is_const || self.is_constexpr || self.is_static {
                    return Err("'mutable' cannot be combined with const or static".to_string());
                }
                self.is_mutable = true;
            }
            "static" => {
                if self.is_static {
                    return Err(duplicate());
                }
                if self.is_mutable {
                    return Err("'static' conflicts with 'mutable'".to_string());
                }
                self.is_static = true;
            }
            "thread_local" => {
                if self.is_thread_local {
                    return Err(duplicate());
                }
                self.is_thread_local = true;
            }
            "short" => {
                if self.is_short {
                    return Err(duplicate());
                }
                if self.long_count > 0 {
                    return Err("'short' conflicts with 'long'".to_string());
                }
                self.is_short = true;
            }
            "long" => {
                if self.is_short {
                    return Err("'long' conflicts with 'short'".to_string());
                }
                if self.long_count >= 2 {
                    return Err("'long long long' is too long".to_string());
                }
                self.long_count += 1;
            }
            "signed" | "unsigned" => {
                let sign = if word == "signed" {
                    Sign::Signed
                } else {
                    Sign::Unsigned
                };
                match self.sign {
                    Some(existing) if existing == sign => return Err(duplicate()),
                    Some(_) => return Err("'signed' conflicts with 'unsigned'".to_string()),
                    None => self.sign = Some(sign),
                }
            }
            _ => return Err(format!("'{word}' is not a type modifier")),
        }
        Ok(())
    }

    /// True when a sign or size keyword was given; those imply `int` when no
    /// base type follows.
    pub fn has_sign_or_size(&self) -> bool {
        self.sign.is_some() || self.is_short || self.long_count > 0
    }

    pub fn to_flags(&self) -> TypeFlags {
        let mut flags = TypeFlags::empty();
        let pairs = [
            (self.is_const, TypeFlags::CONST),
            (self.is_constexpr, TypeFlags::CONSTEXPR),
            (self.is_mutable, TypeFlags::MUTABLE),
            (self.is_static, TypeFlags::STATIC),
            (self.is_thread_local, TypeFlags::THREAD_LOCAL),
            (self.is_short, TypeFlags::SHORT),
            (self.long_count == 1, TypeFlags::LONG),
            (self.long_count == 2, TypeFlags::LONG_LONG),
            (self.sign == Some(Sign::Unsigned), TypeFlags::UNSIGNED),
            (self.sign.is_some(), TypeFlags::EXPLICIT_SIGN),
        ];
        for (set, flag) in pairs {
            if set {
                flags.insert(flag);
            }
        }
        flags
    }

    /// Canonical built-in name for `base` under the sign/size modifiers, e.g.
    /// `unsigned` + `long` + `long` + `int` → `unsigned long long`.
    ///
    /// Returns `base` unchanged when no sign/size keyword is present.
    pub fn canonical_name(&self, base: Option<&str>) -> Result<String, String> {
        if !self.has_sign_or_size() {
            return base
                .map(str::to_string)
                .ok_or_else(|| "Expected type name".to_string());
        }

        let base = base.unwrap_or("int");
        let width = match (self.is_short, self.long_count) {
            (true, _) => Some("short"),
            (false, 1) => Some("long"),
            (false, 2) => Some("long long"),
            _ => None,
        };

        let core = match (base, width) {
            ("int", Some(width)) => width.to_string(),
            ("int", None) => "int".to_string(),
            ("char", None) => "char".to_string(),
            ("double", Some("long")) if self.sign.is_none() => "long double".to_string(),
            (base, Some(width)) => {
                return Err(format!("'{width}' cannot be applied to '{base}'"));
            }
            (base, None) => {
                return Err(format!("Sign modifier cannot be applied to '{base}'"));
            }
        };

        Ok(match (self.sign, core.as_str()) {
            (Some(Sign::Unsigned), _) => format!("unsigned {core}"),
            (Some(Sign::Signed), "char") => "signed char".to_string(),
            _ => core,
        })
    }
}

/// Pointer/reference suffix of a type node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indirection {
    #[default]
    Value,
    Pointer,
    Reference,
    RValueReference,
}

/// A resolved type node: type table index plus its modifiers and suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRef {
    pub index: usize,
    pub flags: TypeFlags,
    pub indirection: Indirection,
}

impl TypeRef {
    /// Static and constexpr data members take no room in an instance.
    pub fn is_instance_storage(&self) -> bool {
        !self.flags.contains(TypeFlags::STATIC) && !self.flags.contains(TypeFlags::CONSTEXPR)
    }
}

/// How a user-defined class relates to others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserCategory {
    #[default]
    Default,
    Abstract,
    Derived,
    DerivedFinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Builtin { flags: TypeFlags, size: usize },
    UserDefined(UserCategory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTableEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl TypeTableEntry {
    pub fn is_builtin(&self) -> bool {
        matches!(self.kind, EntryKind::Builtin { .. })
    }
}

/// Append-only registry of every known type, unique by qualified name.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    entries: Vec<TypeTableEntry>,
    by_name: FxHashMap<String, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, or return the existing index untouched.
    pub fn register(&mut self, name: &str, kind: EntryKind) -> usize {
        if let Some(&index) = self.by_name.get(name) {
            return index;
        }
        let index = self.entries.len();
        self.entries.push(TypeTableEntry {
            name: name.to_string(),
            kind,
        });
        self.by_name.insert(name.to_string(), index);
        index
    }

    pub fn set_category(&mut self, index: usize, category: UserCategory) {
        if let Some(entry) = self.entries.get_mut(index) {
            if let EntryKind::UserDefined(current) = &mut entry.kind {
                *current = category;
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, index: usize) -> Option<&TypeTableEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeTableEntry> {
        self.entries.iter()
    }
}

/// Alias name → type table index.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    by_name: FxHashMap<String, usize>,
}

impl AliasTable {
    pub fn insert(&mut self, name: &str, target: usize) {
        self.by_name.insert(name.to_string(), target);
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Layout-complete description of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub is_builtin: bool,
    /// Fully qualified type name.
    pub name: String,
    /// Name of the declaration: the type's own name at top level, the member
    /// name once placed inside a container.
    pub decl_name: String,
    /// Bytes occupied, array extent included.
    pub size: usize,
    /// Byte offset within the containing type.
    pub offset: usize,
    pub array_len: Option<usize>,
    pub alignment: Option<usize>,
    /// Underlying built-in of an enum.
    pub underlying: Option<String>,
    pub members: Vec<TypeInfo>,
}

impl TypeInfo {
    pub fn leaf(name: &str, size: usize) -> Self {
        TypeInfo {
            is_builtin: true,
            name: name.to_string(),
            decl_name: name.to_string(),
            size,
            offset: 0,
            array_len: None,
            alignment: None,
            underlying: None,
            members: Vec::new(),
        }
    }

    /// Size of a single element when this is an array member.
    pub fn element_size(&self) -> usize {
        match self.array_len {
            Some(len) if len > 0 => self.size / len,
            _ => self.size,
        }
    }

    pub fn member(&self, decl_name: &str) -> Option<&TypeInfo> {
        self.members.iter().find(|m| m.decl_name == decl_name)
    }

    pub fn members_size(&self) -> usize {
        self.members.iter().map(|m| m.size).sum()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.decl_name)?;
        if let Some(len) = self.array_len {
            write!(f, "[{len}]")?;
        }
        write!(f, " (size {}, offset {})", self.size, self.offset)
    }
}

/// Append-only list of finished layouts, indexed by position and name.
#[derive(Debug, Clone, Default)]
pub struct TypeInfoTable {
    infos: Vec<TypeInfo>,
    by_name: FxHashMap<String, usize>,
}

impl TypeInfoTable {
    pub fn push(&mut self, info: TypeInfo) -> usize {
        let index = self.infos.len();
        self.by_name.insert(info.name.clone(), index);
        self.infos.push(info);
        index
    }

    pub fn get(&self, index: usize) -> Option<&TypeInfo> {
        self.infos.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&TypeInfo> {
        self.by_name.get(name).and_then(|&i| self.infos.get(i))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.infos.iter()
    }

    /// User-defined layouts only, in declaration order.
    pub fn user_types(&self) -> impl Iterator<Item = &TypeInfo> {
        self.infos.iter().filter(|info| !info.is_builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifiers(words: &[&str]) -> Result<TypeModifierSet, String> {
        let mut set = TypeModifierSet::default();
        for word in words {
            set.apply(word)?;
        }
        Ok(set)
    }

    #[test]
    fn test_long_long_tracked() {
        let set = modifiers(&["unsigned", "long", "long"]).unwrap();
        assert!(set.to_flags().contains(TypeFlags::LONG_LONG));
        assert!(set.to_flags().contains(TypeFlags::UNSIGNED));
        assert_eq!(set.canonical_name(None).unwrap(), "unsigned long long");
        assert_eq!(set.canonical_name(Some("int")).unwrap(), "unsigned long long");
    }

    #[test]
    fn test_conflicting_modifiers() {
        assert!(modifiers(&["signed", "unsigned"]).is_err());
        assert!(modifiers(&["short", "long"]).is_err());
        assert!(modifiers(&["long", "long", "long"]).is_err());
        assert!(modifiers(&["const", "const"]).is_err());
        assert!(modifiers(&["const", "mutable"]).is_err());
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(modifiers(&["unsigned"]).unwrap().canonical_name(None).unwrap(), "unsigned int");
        assert_eq!(modifiers(&["short"]).unwrap().canonical_name(Some("int")).unwrap(), "short");
        assert_eq!(modifiers(&["signed"]).unwrap().canonical_name(Some("char")).unwrap(), "signed char");
        assert_eq!(modifiers(&["signed"]).unwrap().canonical_name(Some("int")).unwrap(), "int");
        assert_eq!(modifiers(&["const"]).unwrap().canonical_name(Some("float")).unwrap(), "float");
        assert!(modifiers(&["unsigned"]).unwrap().canonical_name(Some("float")).is_err());
    }

    #[test]
    fn test_type_table_register_is_idempotent() {
        let mut table = TypeTable::new();
        let kind = EntryKind::Builtin { flags: TypeFlags::empty(), size: 4 };
        let first = table.register("float", kind);
        let second = table.register("float", EntryKind::UserDefined(UserCategory::Default));

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert!(table.get(first).unwrap().is_builtin());
    }

    #[test]
    fn test_flags_from_builtin_name() {
        let flags = TypeFlags::from_builtin_name("unsigned long long");
        assert!(flags.contains(TypeFlags::LONG_LONG));
        assert!(flags.contains(TypeFlags::UNSIGNED));
        assert!(!flags.contains(TypeFlags::LONG));
        assert_eq!(TypeFlags::from_builtin_name("float"), TypeFlags::empty());
    }
}
