//! Declaration parsing implementation
//!
//! This module handles every declaration form the parser understands:
//!
//! - Namespaces, including nested (`A::B`) and anonymous ones
//! - Aliases: `using A = T;`, `typedef T A;`, `using N::S;`
//! - Class/struct definitions and forward declarations
//! - Enums, scoped or not, with an optional underlying type
//! - Member functions, constructors, destructors and operators
//! - Free functions and variables
//!
//! # Grammar
//!
//! ```text
//! declaration ::= ";" | namespace | using | typedef | class | enum | function | variable
//! namespace   ::= "namespace" [ident {"::" ident}] "{" declaration* "}"
//! class       ::= ("struct" | "class") [alignas] ident [final|abstract]
//!                 [":" base {"," base}] "{" member* "}" ";"
//! member      ::= access ":" | declaration | ctor | dtor | function | data_members
//! data_members::= type_node declarator {"," declarator} ";"
//! declarator  ::= ident {"[" number "]"} [initializer]
//! ```
//!
//! Function bodies, initializers and default arguments are skipped without
//! being parsed. All parsing methods are implemented as `pub(crate)` methods
//! on the [`Parser`] struct.

use crate::parser::lexer::SymbolKind;
use crate::parser::parse::{ParseError, Parser, Scope};
use crate::parser::resolve::simple_name;
use crate::parser::tree::{Access, FunctionBody, FunctionQualifiers, NodeId, NodeKind};
use crate::parser::type_node::TypeContext;
use crate::parser::types::{EntryKind, Indirection, TypeFlags, TypeRef, UserCategory};
use tracing::debug;

/// State threaded through one class body.
struct ClassContext {
    node: NodeId,
    name: String,
    access: Access,
    has_pure_virtual: bool,
}

impl Parser {
    /// Parse one declaration in the current scope.
    pub(crate) fn parse_declaration(&mut self) -> Result<(), ParseError> {
        if self.match_token(";") {
            return Ok(());
        }

        match self.current_keyword().as_deref() {
            Some("namespace") => return self.parse_namespace(),
            Some("using") => return self.parse_using(),
            Some("typedef") => return self.parse_typedef(),
            Some("struct") | Some("class") => {
                if self.parse_class()? {
                    return Ok(());
                }
            }
            Some("enum") => return self.parse_enum(),
            Some("union") => return Err(self.error("Unions are not supported")),
            Some("template") => return Err(self.error("Templates are not supported")),
            _ => {}
        }

        self.parse_function_or_variable()
    }

    fn current_keyword(&self) -> Option<String> {
        self.peek()
            .filter(|s| s.kind == SymbolKind::Keyword)
            .map(|s| s.text.clone())
    }

    fn current_access_keyword(&self) -> Option<Access> {
        match self.current_keyword().as_deref() {
            Some("public") => Some(Access::Public),
            Some("protected") => Some(Access::Protected),
            Some("private") => Some(Access::Private),
            _ => None,
        }
    }

    // ===== Namespaces and aliases =====

    fn parse_namespace(&mut self) -> Result<(), ParseError> {
        let keyword = self.position;
        self.advance(); // consume 'namespace'

        let mut names = Vec::new();
        if self.check_identifier() {
            loop {
                names.push(self.expect_identifier("in namespace name")?);
                if !self.match_token("::") {
                    break;
                }
            }
        }
        let brace = self.expect_lbrace("after namespace name")?;

        // One scope per component; an anonymous namespace shares its parent's name.
        let depth = self.scopes.len();
        if names.is_empty() {
            let full_name = self.scope().full_name.clone();
            self.push_namespace(full_name, keyword);
        }
        for (name, symbol) in names {
            let full_name = self.scope().qualify(&name);
            self.push_namespace(full_name, symbol);
        }

        while !self.check("}") {
            if self.is_at_end() {
                return Err(self.error_at(brace, "Unmatched '{' in namespace"));
            }
            self.parse_declaration()?;
        }
        self.expect_rbrace("to close namespace")?;
        self.match_token(";");
        self.scopes.truncate(depth);
        Ok(())
    }

    fn push_namespace(&mut self, full_name: String, symbol: usize) {
        let node = self.tree.add_child(
            self.scope().node,
            NodeKind::Namespace {
                full_name: full_name.clone(),
            },
            Some(symbol),
        );
        self.scopes.push(Scope { node, full_name });
    }

    fn parse_using(&mut self) -> Result<(), ParseError> {
        self.advance(); // consume 'using'

        if self.match_keyword("namespace") {
            let name = self.parse_qualified_name()?;
            self.expect_semicolon("after using-directive")?;
            debug!("ignoring using-directive for {name}");
            return Ok(());
        }

        let (name, symbol) = self.expect_identifier("after 'using'")?;
        if self.match_token("=") {
            let type_ref = self.parse_type_node(TypeContext::FreeExpression)?;
            self.expect_semicolon("after alias declaration")?;
            return self.declare_alias(&name, type_ref, symbol);
        }

        // using-declaration: `using N::S;`
        let mut parts = vec![name];
        while self.match_token("::") {
            parts.push(self.expect_identifier("in using-declaration")?.0);
        }
        self.expect_semicolon("after using-declaration")?;

        let qualified = parts.join(".");
        let Some(target) = self.resolve_type_name(&qualified) else {
            // Names a function or value, which carries no layout.
            debug!("ignoring using-declaration for {}", parts.join("::"));
            return Ok(());
        };
        let type_ref = TypeRef {
            index: target,
            flags: TypeFlags::empty(),
            indirection: Indirection::Value,
        };
        self.declare_alias(simple_name(&qualified), type_ref, symbol)
    }

    fn parse_typedef(&mut self) -> Result<(), ParseError> {
        self.advance(); // consume 'typedef'
        let type_ref = self.parse_type_node(TypeContext::FreeExpression)?;
        let (name, symbol) = self.expect_identifier("in typedef")?;
        self.expect_semicolon("after typedef")?;
        self.declare_alias(&name, type_ref, symbol)
    }

    fn declare_alias(&mut self, name: &str, type_ref: TypeRef, symbol: usize) -> Result<(), ParseError> {
        if type_ref.indirection != Indirection::Value {
            return Err(self.error_at(
                symbol,
                format!("Alias '{name}' to a pointer or reference type is not supported"),
            ));
        }

        let qualified = self.scope().qualify(name);
        self.aliases.insert(&qualified, type_ref.index);
        let node = self.tree.add_child(
            self.scope().node,
            NodeKind::AliasDecl {
                name: qualified,
                target: type_ref.index,
            },
            Some(symbol),
        );
        self.tree.add_child(node, NodeKind::TypeNode(type_ref), Some(symbol));
        Ok(())
    }

    // ===== Classes =====

    /// Parse a class definition or forward declaration.
    ///
    /// Returns `Ok(false)` with the cursor restored when the `struct`/`class`
    /// keyword is only an elaborated type specifier (`struct S s;`).
    pub(crate) fn parse_class(&mut self) -> Result<bool, ParseError> {
        let start = self.position;
        let is_class = self.check_keyword("class");
        self.advance(); // consume 'struct' / 'class'

        let alignment = if self.match_keyword("alignas") {
            Some(self.parse_alignment()?)
        } else {
            None
        };

        if !self.check_identifier() {
            if self.check("{") {
                return Err(self.error("Anonymous classes are not supported"));
            }
            return Err(self.error(format!(
                "Expected identifier after '{}', found {}",
                if is_class { "class" } else { "struct" },
                self.found()
            )));
        }

        let is_definition = self.check_ahead(1, "{")
            || self.check_ahead(1, ":")
            || self.peek_ahead(1).is_some_and(|s| s.is_keyword("final") || s.is_keyword("abstract"));
        if self.check_ahead(1, ";") && alignment.is_none() {
            return self.parse_forward_declaration().map(|()| true);
        }
        if !is_definition {
            self.position = start;
            return Ok(false);
        }

        let (name, name_symbol) = self.expect_identifier("after 'struct'")?;
        let qualified = self.scope().qualify(&name);
        if self.type_infos.contains(&qualified) {
            return Err(self.error_at(name_symbol, format!("Redefinition of '{name}'")));
        }

        let mut is_final = false;
        let mut is_abstract = false;
        loop {
            if self.match_keyword("final") {
                is_final = true;
            } else if self.match_keyword("abstract") {
                is_abstract = true;
            } else {
                break;
            }
        }

        let type_index = self
            .type_table
            .register(&qualified, EntryKind::UserDefined(UserCategory::Default));
        if self.type_table.get(type_index).is_some_and(|e| e.is_builtin()) {
            return Err(self.error_at(name_symbol, format!("Cannot redefine built-in type '{name}'")));
        }

        let node = self.tree.add_child(
            self.scope().node,
            NodeKind::ClassDecl {
                qualified_name: qualified.clone(),
                category: UserCategory::Default,
                alignment,
            },
            Some(name_symbol),
        );

        let default_access = if is_class { Access::Private } else { Access::Public };
        let mut base_count = 0;
        if self.match_token(":") {
            loop {
                self.parse_base_class(node, default_access)?;
                base_count += 1;
                if !self.match_token(",") {
                    break;
                }
            }
        }

        let brace = self.expect_lbrace("to open class body")?;
        self.scopes.push(Scope {
            node,
            full_name: qualified.clone(),
        });
        let mut ctx = ClassContext {
            node,
            name: name.clone(),
            access: default_access,
            has_pure_virtual: false,
        };
        while !self.check("}") {
            if self.is_at_end() {
                return Err(self.error_at(brace, format!("Unmatched '{{' in body of '{name}'")));
            }
            self.parse_class_member(&mut ctx)?;
        }
        self.expect_rbrace("to close class body")?;
        self.expect_semicolon("after class definition")?;
        self.scopes.pop();

        let category = if is_abstract || ctx.has_pure_virtual {
            UserCategory::Abstract
        } else if base_count > 0 && is_final {
            UserCategory::DerivedFinal
        } else if base_count > 0 {
            UserCategory::Derived
        } else {
            UserCategory::Default
        };
        self.type_table.set_category(type_index, category);
        if let NodeKind::ClassDecl { category: slot, .. } = self.tree.kind_mut(node) {
            *slot = category;
        }

        self.build_class_layout(node, &qualified, &name, alignment, name_symbol)?;
        Ok(true)
    }

    fn parse_forward_declaration(&mut self) -> Result<(), ParseError> {
        let (name, symbol) = self.expect_identifier("in forward declaration")?;
        self.expect_semicolon("after forward declaration")?;

        let qualified = self.scope().qualify(&name);
        self.type_table
            .register(&qualified, EntryKind::UserDefined(UserCategory::Default));
        self.tree.add_child(
            self.scope().node,
            NodeKind::ForwardDecl {
                qualified_name: qualified,
            },
            Some(symbol),
        );
        Ok(())
    }

    /// `alignas ( number )`
    fn parse_alignment(&mut self) -> Result<usize, ParseError> {
        self.expect_lparen("after 'alignas'")?;
        let value = self.expect_integer("as alignas argument")?;
        self.expect_token(")", "to close alignas")?;
        if value == 0 || !value.is_power_of_two() {
            return Err(self.error(format!("alignas({value}) is not a power of two")));
        }
        Ok(value)
    }

    fn expect_integer(&mut self, ctx: &str) -> Result<usize, ParseError> {
        let value = match self.peek() {
            Some(symbol) if symbol.kind == SymbolKind::NumberLiteral => symbol.text.parse::<usize>().ok(),
            _ => None,
        };
        match value {
            Some(value) => {
                self.advance();
                Ok(value)
            }
            None => Err(self.error(format!("Expected integer literal {ctx}, found {}", self.found()))),
        }
    }

    /// `[virtual] [access] [virtual] qualified_name`
    fn parse_base_class(&mut self, class_node: NodeId, default_access: Access) -> Result<(), ParseError> {
        let mut access = default_access;
        self.match_keyword("virtual");
        if let Some(explicit) = self.current_access_keyword() {
            self.advance();
            access = explicit;
        }
        self.match_keyword("virtual");

        let symbol = self.position;
        let name = self.parse_qualified_name()?;
        let display = name.replace('.', "::");
        let index = self
            .resolve_type_name(&name)
            .ok_or_else(|| self.error_at(symbol, format!("Unknown base class '{display}'")))?;
        let Some(entry) = self.type_table.get(index) else {
            return Err(self.error_at(symbol, format!("Unknown base class '{display}'")));
        };
        if entry.is_builtin() {
            return Err(self.error_at(symbol, format!("Cannot derive from built-in type '{display}'")));
        }
        if !self.type_infos.contains(&entry.name) {
            return Err(self.error_at(symbol, format!("Base class '{display}' is incomplete")));
        }

        let node = self
            .tree
            .add_child(class_node, NodeKind::BaseClass { access }, Some(symbol));
        let type_ref = TypeRef {
            index,
            flags: TypeFlags::empty(),
            indirection: Indirection::Value,
        };
        self.tree.add_child(node, NodeKind::TypeNode(type_ref), Some(symbol));
        Ok(())
    }

    fn parse_class_member(&mut self, ctx: &mut ClassContext) -> Result<(), ParseError> {
        if self.match_token(";") {
            return Ok(());
        }

        if let Some(access) = self.current_access_keyword() {
            let symbol = self.position;
            self.advance();
            if !self.match_token(":") {
                return Err(self.error(format!(
                    "Expected ':' after access specifier, found {}",
                    self.found()
                )));
            }
            ctx.access = access;
            self.tree
                .add_child(ctx.node, NodeKind::AccessSpecifier(access), Some(symbol));
            return Ok(());
        }

        match self.current_keyword().as_deref() {
            Some("struct") | Some("class") => {
                if self.parse_class()? {
                    return Ok(());
                }
            }
            Some("enum") => return self.parse_enum(),
            Some("using") => return self.parse_using(),
            Some("typedef") => return self.parse_typedef(),
            Some("friend") => {
                self.advance();
                return self.skip_declaration();
            }
            Some("union") => return Err(self.error("Unions are not supported")),
            Some("template") => return Err(self.error("Templates are not supported")),
            _ => {}
        }

        if self.check("static_assert") {
            self.advance();
            self.skip_balanced("(", ")")?;
            self.expect_semicolon("after static_assert")?;
            return Ok(());
        }

        self.parse_member_declaration(ctx)
    }

    /// Skip a declaration whose content carries no layout: through the next
    /// top-level `;` or a braced body.
    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let start = self.position;
        loop {
            if self.is_at_end() {
                return Err(self.error_at(start, "Unexpected end of input in declaration"));
            }
            if self.check("{") {
                self.skip_balanced("{", "}")?;
                self.match_token(";");
                return Ok(());
            }
            if self.check("(") {
                self.skip_balanced("(", ")")?;
                continue;
            }
            if self.match_token(";") {
                return Ok(());
            }
            self.advance();
        }
    }

    fn parse_member_declaration(&mut self, ctx: &mut ClassContext) -> Result<(), ParseError> {
        let mut qualifiers = FunctionQualifiers::default();
        loop {
            if self.match_keyword("virtual") {
                qualifiers.is_virtual = true;
            } else if self.match_keyword("inline") {
                qualifiers.is_inline = true;
            } else if self.match_keyword("explicit") {
                qualifiers.is_explicit = true;
            } else if self.check_keyword("constexpr")
                && self.check_ahead(1, &ctx.name)
                && self.check_ahead(2, "(")
            {
                self.advance();
            } else {
                break;
            }
        }

        // Destructor
        if self.check("~") {
            let symbol = self.position;
            self.advance();
            let (name, _) = self.expect_identifier("after '~'")?;
            if name != ctx.name {
                return Err(self.error_at(
                    symbol,
                    format!("Destructor '~{name}' does not match class '{}'", ctx.name),
                ));
            }
            let node = self.tree.add_child(
                ctx.node,
                NodeKind::Destructor {
                    access: ctx.access,
                    qualifiers,
                },
                Some(symbol),
            );
            return self.parse_function_rest(node, qualifiers, false, ctx);
        }

        // Constructor
        if self.check(&ctx.name) && self.check_ahead(1, "(") {
            let symbol = self.position;
            self.advance();
            let node = self.tree.add_child(
                ctx.node,
                NodeKind::Constructor {
                    access: ctx.access,
                    qualifiers,
                },
                Some(symbol),
            );
            return self.parse_function_rest(node, qualifiers, true, ctx);
        }

        // Conversion operator: no return type
        if self.check_keyword("operator") {
            let symbol = self.position;
            let name = self.parse_operator_name()?;
            let node = self.tree.add_child(
                ctx.node,
                NodeKind::Function {
                    name,
                    access: Some(ctx.access),
                    qualifiers,
                },
                Some(symbol),
            );
            return self.parse_function_rest(node, qualifiers, false, ctx);
        }

        let type_ref = self.parse_type_node(TypeContext::AggregateMember)?;
        qualifiers.is_static = type_ref.flags.contains(TypeFlags::STATIC);

        let symbol = self.position;
        let name = if self.check_keyword("operator") {
            self.parse_operator_name()?
        } else {
            self.expect_identifier("in member declaration")?.0
        };

        if self.check("(") {
            let node = self.tree.add_child(
                ctx.node,
                NodeKind::Function {
                    name,
                    access: Some(ctx.access),
                    qualifiers,
                },
                Some(symbol),
            );
            self.tree
                .add_child(node, NodeKind::TypeNode(type_ref), Some(symbol));
            return self.parse_function_rest(node, qualifiers, false, ctx);
        }

        if qualifiers.is_virtual || qualifiers.is_explicit {
            return Err(self.error_at(symbol, format!("Data member '{name}' cannot be virtual or explicit")));
        }
        self.parse_member_variables(ctx, type_ref, name, symbol)
    }

    /// Declarator list after the first member name.
    fn parse_member_variables(
        &mut self,
        ctx: &ClassContext,
        type_ref: TypeRef,
        mut name: String,
        mut symbol: usize,
    ) -> Result<(), ParseError> {
        loop {
            let array_len = self.parse_array_extent()?;
            self.skip_initializer()?;
            if self.check(":") {
                return Err(self.error(format!("Bit-field '{name}' is not supported")));
            }

            let node = self.tree.add_child(
                ctx.node,
                NodeKind::MemberVariable {
                    name,
                    access: ctx.access,
                    array_len,
                },
                Some(symbol),
            );
            self.tree
                .add_child(node, NodeKind::TypeNode(type_ref), Some(symbol));

            if self.match_token(",") {
                (name, symbol) = self.expect_identifier("after ','")?;
                continue;
            }
            self.expect_semicolon("after member declaration")?;
            return Ok(());
        }
    }

    /// Zero or more `[N]`; multiple extents multiply into one element count.
    fn parse_array_extent(&mut self) -> Result<Option<usize>, ParseError> {
        let mut extent: Option<usize> = None;
        while self.check("[") {
            let open = self.position;
            self.advance();
            let len = self.expect_integer("as array extent")?;
            self.expect_token("]", "to close array extent")?;
            let total = extent
                .unwrap_or(1)
                .checked_mul(len)
                .ok_or_else(|| self.error_at(open, "Array extent too large"))?;
            extent = Some(total);
        }
        Ok(extent)
    }

    /// `= expr` or `{ ... }` after a declarator.
    fn skip_initializer(&mut self) -> Result<(), ParseError> {
        if self.match_token("=") {
            self.skip_until_any(&[",", ";"])
        } else if self.check("{") {
            self.skip_balanced("{", "}")
        } else {
            Ok(())
        }
    }

    // ===== Functions =====

    /// `operator` followed by the operator spelling, up to the parameter list.
    fn parse_operator_name(&mut self) -> Result<String, ParseError> {
        let start = self.position;
        self.advance(); // consume 'operator'
        let mut name = String::from("operator");

        if self.check("(") && self.check_ahead(1, ")") {
            self.advance();
            self.advance();
            name.push_str("()");
            return Ok(name);
        }

        while !self.check("(") {
            let Some(symbol) = self.peek() else {
                return Err(self.error_at(start, "Unexpected end of input in operator name"));
            };
            if matches!(symbol.kind, SymbolKind::Identifier | SymbolKind::Keyword) {
                name.push(' ');
            }
            name.push_str(&symbol.text);
            self.advance();
        }
        if name == "operator" {
            return Err(self.error_at(start, "Expected operator after 'operator'"));
        }
        Ok(name)
    }

    /// Parameters, trailing qualifiers and body of a function whose name has
    /// been consumed.
    fn parse_function_rest(
        &mut self,
        node: NodeId,
        mut qualifiers: FunctionQualifiers,
        is_constructor: bool,
        ctx: &mut ClassContext,
    ) -> Result<(), ParseError> {
        qualifiers = self.parse_function_tail(node, qualifiers, is_constructor)?;
        if qualifiers.body == FunctionBody::PureVirtual {
            ctx.has_pure_virtual = true;
        }
        Ok(())
    }

    fn parse_function_tail(
        &mut self,
        node: NodeId,
        mut qualifiers: FunctionQualifiers,
        is_constructor: bool,
    ) -> Result<FunctionQualifiers, ParseError> {
        self.parse_parameter_list(node)?;

        loop {
            if self.match_keyword("const") {
                qualifiers.is_const = true;
            } else if self.match_keyword("noexcept") {
                qualifiers.is_noexcept = true;
                if self.check("(") {
                    self.skip_balanced("(", ")")?;
                }
            } else if self.match_keyword("override") {
                qualifiers.is_override = true;
            } else if self.match_keyword("final") {
                qualifiers.is_final = true;
            } else if self.match_token("&") || self.match_token("&&") {
                // ref-qualifier
            } else if self.match_token("->") {
                self.parse_type_node(TypeContext::FreeExpression)?;
            } else {
                break;
            }
        }

        if self.match_token("=") {
            qualifiers.body = if self.match_keyword("default") {
                FunctionBody::Defaulted
            } else if self.match_keyword("delete") {
                FunctionBody::Deleted
            } else if self.check("0") {
                self.advance();
                FunctionBody::PureVirtual
            } else {
                return Err(self.error(format!(
                    "Expected 'default', 'delete' or '0' after '=', found {}",
                    self.found()
                )));
            };
            self.expect_semicolon("after function declaration")?;
        } else if is_constructor && self.match_token(":") {
            self.parse_member_initializers()?;
            self.skip_balanced("{", "}")?;
            self.match_token(";");
            qualifiers.body = FunctionBody::Defined;
        } else if self.check("{") {
            self.skip_balanced("{", "}")?;
            self.match_token(";");
            qualifiers.body = FunctionBody::Defined;
        } else {
            self.expect_semicolon("after function declaration")?;
            qualifiers.body = FunctionBody::Declared;
        }

        match self.tree.kind_mut(node) {
            NodeKind::Function { qualifiers: slot, .. }
            | NodeKind::Constructor { qualifiers: slot, .. }
            | NodeKind::Destructor { qualifiers: slot, .. } => *slot = qualifiers,
            _ => {}
        }
        Ok(qualifiers)
    }

    /// `( [param {, param}] [...] )`, also `( void )`.
    fn parse_parameter_list(&mut self, function: NodeId) -> Result<(), ParseError> {
        self.expect_lparen("to open parameter list")?;
        if self.match_token(")") {
            return Ok(());
        }
        if self.check("void") && self.check_ahead(1, ")") {
            self.advance();
            self.advance();
            return Ok(());
        }

        loop {
            if self.match_token("...") {
                self.expect_token(")", "after '...'")?;
                return Ok(());
            }

            let symbol = self.position;
            let type_ref = self.parse_type_node(TypeContext::FunctionParameter)?;
            let name = if self.check_identifier() {
                Some(self.expect_identifier("as parameter name")?.0)
            } else {
                None
            };
            self.parse_array_extent()?;
            if self.match_token("=") {
                self.skip_until_any(&[",", ")"])?;
            }

            let param = self
                .tree
                .add_child(function, NodeKind::FunctionParameter { name }, Some(symbol));
            self.tree
                .add_child(param, NodeKind::TypeNode(type_ref), Some(symbol));

            if !self.match_token(",") {
                self.expect_token(")", "to close parameter list")?;
                return Ok(());
            }
        }
    }

    /// `name (args) {, name (args)}` or with braces.
    fn parse_member_initializers(&mut self) -> Result<(), ParseError> {
        loop {
            self.parse_qualified_name()?;
            if self.check("(") {
                self.skip_balanced("(", ")")?;
            } else if self.check("{") {
                self.skip_balanced("{", "}")?;
            } else {
                return Err(self.error(format!(
                    "Expected '(' or '{{' in member initializer, found {}",
                    self.found()
                )));
            }
            if !self.match_token(",") {
                return Ok(());
            }
        }
    }

    /// A free function or variable at namespace scope.
    fn parse_function_or_variable(&mut self) -> Result<(), ParseError> {
        let mut qualifiers = FunctionQualifiers::default();
        loop {
            if self.match_keyword("inline") {
                qualifiers.is_inline = true;
            } else if self.match_keyword("extern") {
                // linkage carries no layout
            } else {
                break;
            }
        }

        if let Some(is_destructor) = self.special_member_ahead() {
            return self.parse_out_of_line_special_member(qualifiers, is_destructor);
        }

        let type_ref = self.parse_type_node(TypeContext::FreeExpression)?;
        qualifiers.is_static = type_ref.flags.contains(TypeFlags::STATIC);

        let symbol = self.position;
        let name = if self.check_keyword("operator") {
            self.parse_operator_name()?
        } else {
            self.parse_qualified_name()?
        };

        if self.check("(") {
            let node = self.tree.add_child(
                self.scope().node,
                NodeKind::Function {
                    name,
                    access: None,
                    qualifiers,
                },
                Some(symbol),
            );
            self.tree
                .add_child(node, NodeKind::TypeNode(type_ref), Some(symbol));
            self.parse_function_tail(node, qualifiers, false)?;
            return Ok(());
        }

        let mut name = name;
        let mut symbol = symbol;
        loop {
            self.parse_array_extent()?;
            self.skip_initializer()?;
            let node = self
                .tree
                .add_child(self.scope().node, NodeKind::Variable { name }, Some(symbol));
            self.tree
                .add_child(node, NodeKind::TypeNode(type_ref), Some(symbol));

            if self.match_token(",") {
                (name, symbol) = self.expect_identifier("after ','")?;
                continue;
            }
            self.expect_semicolon("after variable declaration")?;
            return Ok(());
        }
    }

    /// Looks for `[::] A :: ... :: X :: X (` or `... X :: ~ X (` without
    /// consuming anything. `Some(true)` is a destructor.
    fn special_member_ahead(&self) -> Option<bool> {
        let ident_at = |n: usize| self.peek_ahead(n).filter(|s| s.is_identifier()).map(|s| s.text.as_str());

        let mut n = usize::from(self.check("::"));
        let mut previous = ident_at(n)?;
        n += 1;
        while self.check_ahead(n, "::") {
            n += 1;
            if self.check_ahead(n, "~") {
                let name = ident_at(n + 1)?;
                return (name == previous && self.check_ahead(n + 2, "(")).then_some(true);
            }
            let name = ident_at(n)?;
            if name == previous && self.check_ahead(n + 1, "(") {
                return Some(false);
            }
            previous = name;
            n += 1;
        }
        None
    }

    /// `Foo::Foo(...)` or `Foo::~Foo()` defined outside its class.
    fn parse_out_of_line_special_member(
        &mut self,
        qualifiers: FunctionQualifiers,
        is_destructor: bool,
    ) -> Result<(), ParseError> {
        let symbol = self.position;
        self.match_token("::");
        let mut parts = vec![self.expect_identifier("in qualified name")?.0];
        while self.match_token("::") {
            if self.match_token("~") {
                let (name, _) = self.expect_identifier("after '~'")?;
                parts.push(format!("~{name}"));
                break;
            }
            parts.push(self.expect_identifier("after '::'")?.0);
            if self.check("(") {
                break;
            }
        }

        let node = self.tree.add_child(
            self.scope().node,
            NodeKind::Function {
                name: parts.join("."),
                access: None,
                qualifiers,
            },
            Some(symbol),
        );
        self.parse_function_tail(node, qualifiers, !is_destructor)?;
        Ok(())
    }

    // ===== Enums =====

    fn parse_enum(&mut self) -> Result<(), ParseError> {
        self.advance(); // consume 'enum'
        if !self.match_keyword("class") {
            self.match_keyword("struct");
        }

        let (name, symbol) = self.expect_identifier("after 'enum'")?;
        let qualified = self.scope().qualify(&name);

        let underlying = if self.match_token(":") {
            self.parse_type_node(TypeContext::FreeExpression)?
        } else {
            let index = self
                .type_table
                .find("int")
                .ok_or_else(|| self.error_at(symbol, "Built-in 'int' is not registered"))?;
            TypeRef {
                index,
                flags: TypeFlags::empty(),
                indirection: Indirection::Value,
            }
        };

        if self.check("{") {
            self.skip_balanced("{", "}")?;
        }
        self.expect_semicolon("after enum declaration")?;

        self.type_table
            .register(&qualified, EntryKind::UserDefined(UserCategory::Default));
        let node = self.tree.add_child(
            self.scope().node,
            NodeKind::EnumDecl {
                qualified_name: qualified.clone(),
            },
            Some(symbol),
        );
        self.tree
            .add_child(node, NodeKind::TypeNode(underlying), Some(symbol));

        // An opaque declaration followed by the full one lays out once.
        if self.type_infos.contains(&qualified) {
            return Ok(());
        }
        self.build_enum_layout(&qualified, &name, &underlying, symbol)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::grammar::Grammar;
    use crate::parser::parse::Parser;
    use crate::parser::tree::{Access, FunctionBody, NodeKind, SyntaxTree};
    use crate::parser::types::{EntryKind, UserCategory};

    fn parse(source: &str) -> Parser {
        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse(source).unwrap();
        parser
    }

    fn category(parser: &Parser, name: &str) -> UserCategory {
        let index = parser.resolve_type_name(name).unwrap();
        match parser.type_table().get(index).unwrap().kind {
            EntryKind::UserDefined(category) => category,
            EntryKind::Builtin { .. } => panic!("{name} is built-in"),
        }
    }

    #[test]
    fn test_nested_namespace() {
        let parser = parse("namespace A::B { struct S { int i; }; } namespace { struct H { float f; }; }");
        assert!(parser.type_info_by_name("A::B::S").is_some());
        assert!(parser.type_info_by_name("H").is_some());

        let namespaces: Vec<_> = parser
            .tree()
            .iter()
            .filter_map(|(_, node)| match &node.kind {
                NodeKind::Namespace { full_name } => Some(full_name.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(namespaces, vec!["", "A", "A.B", ""]);
    }

    #[test]
    fn test_using_declaration_aliases() {
        let parser = parse("namespace N { struct S { double d; }; } using N::S; struct T { S s; };");
        assert_eq!(parser.resolve_type_name("S"), parser.resolve_type_name("N::S"));
        assert_eq!(parser.type_info_by_name("T").unwrap().size, 8);
    }

    #[test]
    fn test_using_namespace_is_ignored() {
        let parser = parse("namespace N { struct S { int i; }; } using namespace N;");
        assert!(parser.resolve_type_name("S").is_none());
    }

    #[test]
    fn test_class_categories() {
        let parser = parse(
            "struct Base { virtual void f() = 0; };
             class Mid : public Base { public: void f() override {} int m; };
             struct Leaf final : Mid { float x; };
             struct Plain { int p; };",
        );
        assert_eq!(category(&parser, "Base"), UserCategory::Abstract);
        assert_eq!(category(&parser, "Mid"), UserCategory::Derived);
        assert_eq!(category(&parser, "Leaf"), UserCategory::DerivedFinal);
        assert_eq!(category(&parser, "Plain"), UserCategory::Default);
    }

    #[test]
    fn test_base_classes_laid_out_first() {
        let parser = parse("struct A { float a; }; struct B : A { int b; };");
        let info = parser.type_info_by_name("B").unwrap();

        assert_eq!(info.size, 8);
        assert_eq!(info.members[0].name, "A");
        assert_eq!(info.members[0].decl_name, "A");
        assert_eq!(info.members[0].members.len(), 1);
        assert_eq!(info.member("b").unwrap().offset, 4);
    }

    #[test]
    fn test_incomplete_base_is_error() {
        let mut parser = Parser::new(Grammar::Cpp);
        let err = parser.parse("struct A; struct B : A { int b; };").unwrap_err();
        assert!(err.message.contains("incomplete"));
    }

    #[test]
    fn test_member_functions_skipped_in_layout() {
        let parser = parse(
            "class Camera {
             public:
                 Camera() : fov(60.0f), near{0.1f} {}
                 explicit Camera(float f);
                 ~Camera() = default;
                 Camera& operator=(const Camera& other) = delete;
                 bool operator==(const Camera&) const;
                 float operator()(int, ...) const noexcept;
                 operator bool() const { return true; }
                 static Camera make(float fov = 45.0f, int n = 0);
                 float fov;
             private:
                 float near;
             };",
        );
        let info = parser.type_info_by_name("Camera").unwrap();
        assert_eq!(info.size, 8);
        assert_eq!(info.members.len(), 2);

        let tree = parser.tree();
        let class = tree.find_class("Camera").unwrap();
        let kinds: Vec<_> = tree.children(class).iter().map(|&id| &tree.node(id).kind).collect();

        let constructors = kinds.iter().filter(|k| matches!(k, NodeKind::Constructor { .. })).count();
        assert_eq!(constructors, 2);
        assert!(kinds.iter().any(|k| matches!(
            k,
            NodeKind::Destructor { qualifiers, .. } if qualifiers.body == FunctionBody::Defaulted
        )));
        assert!(kinds.iter().any(|k| matches!(
            k,
            NodeKind::Function { name, .. } if name == "operator()"
        )));
        assert!(kinds.iter().any(|k| matches!(
            k,
            NodeKind::Function { name, .. } if name == "operator bool"
        )));
        assert!(kinds.iter().any(|k| matches!(
            k,
            NodeKind::MemberVariable { name, access: Access::Private, .. } if name == "near"
        )));
    }

    #[test]
    fn test_class_default_access_is_private() {
        let parser = parse("class C { int hidden; public: int shown; };");
        let tree = parser.tree();
        let class = tree.find_class("C").unwrap();
        let access: Vec<_> = tree
            .children(class)
            .iter()
            .filter_map(|&id| match &tree.node(id).kind {
                NodeKind::MemberVariable { access, .. } => Some(*access),
                _ => None,
            })
            .collect();
        assert_eq!(access, vec![Access::Private, Access::Public]);
    }

    #[test]
    fn test_missing_colon_after_access_specifier() {
        let mut parser = Parser::new(Grammar::Cpp);
        let err = parser.parse("class C { public int x; };").unwrap_err();
        assert!(err.message.contains("Expected ':'"));
    }

    #[test]
    fn test_declarator_lists_and_initializers() {
        let parser = parse("struct S { float a = 1.0f, b{2.0f}, c[2]; int d = (1 + 2) * 3; };");
        let info = parser.type_info_by_name("S").unwrap();
        assert_eq!(info.members.len(), 4);
        assert_eq!(info.member("c").unwrap().offset, 8);
        assert_eq!(info.member("d").unwrap().offset, 16);
        assert_eq!(info.size, 20);
    }

    #[test]
    fn test_enums() {
        let parser = parse(
            "enum Color { Red, Green = 2 };
             enum class Mode : uint8_t { A, B };
             struct S { Color c; Mode m; };",
        );
        let info = parser.type_info_by_name("S").unwrap();
        assert_eq!(info.member("c").unwrap().size, 4);
        assert_eq!(info.member("m").unwrap().size, 1);
        assert_eq!(info.member("m").unwrap().underlying.as_deref(), Some("uint8_t"));
        assert_eq!(info.size, 5);
    }

    #[test]
    fn test_nested_class_scope() {
        let parser = parse("struct Outer { struct Inner { int i; }; Inner a; Inner b; };");
        assert_eq!(parser.type_info_by_name("Outer::Inner").unwrap().size, 4);
        assert_eq!(parser.type_info_by_name("Outer").unwrap().size, 8);
        assert!(parser.type_info_by_name("Inner").is_none());
    }

    #[test]
    fn test_elaborated_member_type() {
        let parser = parse("struct A { int i; }; struct B { struct A a; };");
        assert_eq!(parser.type_info_by_name("B").unwrap().size, 4);
    }

    #[test]
    fn test_alignas_recorded() {
        let parser = parse("struct alignas(16) Light { float color[3]; float intensity; };");
        let info = parser.type_info_by_name("Light").unwrap();
        assert_eq!(info.alignment, Some(16));
        assert_eq!(info.size, 16);
    }

    #[test]
    fn test_free_functions_and_variables() {
        let parser = parse(
            "namespace math { float dot(const float* a, const float* b); }
             static const int kCount = 4, kOther[2] = {1, 2};
             void Foo::bar() const {}",
        );
        let tree = parser.tree();
        let functions = tree
            .iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Function { access: None, .. }))
            .count();
        let variables = tree
            .iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Variable { .. }))
            .count();
        assert_eq!(functions, 2);
        assert_eq!(variables, 2);
        assert_eq!(tree.children(SyntaxTree::ROOT).len(), 4);
    }

    #[test]
    fn test_out_of_line_special_members() {
        let parser = parse(
            "struct Foo { Foo(); ~Foo(); int v; };
             inline Foo::Foo() : v(0) {}
             Foo::~Foo() {}
             namespace n { struct Bar { Bar(int); }; }
             n::Bar::Bar(int x) {}",
        );

        let names: Vec<_> = parser
            .tree()
            .iter()
            .filter_map(|(_, node)| match &node.kind {
                NodeKind::Function { name, access: None, qualifiers } => {
                    Some((name.as_str(), qualifiers.body, qualifiers.is_inline))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("Foo.Foo", FunctionBody::Defined, true),
                ("Foo.~Foo", FunctionBody::Defined, false),
                ("n.Bar.Bar", FunctionBody::Defined, false),
            ]
        );
        assert_eq!(parser.type_info_by_name("Foo").unwrap().size, 4);
    }

    #[test]
    fn test_redefinition_is_error() {
        let mut parser = Parser::new(Grammar::Cpp);
        parser.parse("struct A { int i; };").unwrap();
        let err = parser.parse("struct A { float f; };").unwrap_err();
        assert!(err.message.contains("Redefinition"));
    }

    #[test]
    fn test_unsupported_constructs() {
        for source in ["template <typename T> struct V { T t; };", "union U { int i; float f; };"] {
            let mut parser = Parser::new(Grammar::Cpp);
            assert!(parser.parse(source).unwrap_err().message.contains("not supported"));
        }
    }
}
