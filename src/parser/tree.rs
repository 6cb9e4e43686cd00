//! Syntax tree for parsed declarations
//!
//! Nodes live in one arena owned by [`SyntaxTree`]; parent and child links
//! are [`NodeId`] indices into it. Node 0 is the synthetic global namespace
//! and the only node without a parent.

use super::types::{TypeRef, UserCategory};

/// Index of a node in its [`SyntaxTree`].
pub type NodeId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Member access level, switched by `public:` / `protected:` / `private:`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected,
    Private,
}

/// What follows a function's parameter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionBody {
    /// `;`
    #[default]
    Declared,
    /// `{ ... }`, skipped without parsing.
    Defined,
    Defaulted,
    Deleted,
    /// `= 0`
    PureVirtual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionQualifiers {
    pub is_virtual: bool,
    pub is_static: bool,
    pub is_inline: bool,
    pub is_explicit: bool,
    pub is_const: bool,
    pub is_noexcept: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub body: FunctionBody,
}

/// Syntax classifier carried by every node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Namespace {
        full_name: String,
    },
    AliasDecl {
        name: String,
        target: usize,
    },
    ForwardDecl {
        qualified_name: String,
    },
    ClassDecl {
        qualified_name: String,
        category: UserCategory,
        alignment: Option<usize>,
    },
    EnumDecl {
        qualified_name: String,
    },
    BaseClass {
        access: Access,
    },
    AccessSpecifier(Access),
    MemberVariable {
        name: String,
        access: Access,
        array_len: Option<usize>,
    },
    /// Variable declared outside any class.
    Variable {
        name: String,
    },
    TypeNode(TypeRef),
    Constructor {
        access: Access,
        qualifiers: FunctionQualifiers,
    },
    Destructor {
        access: Access,
        qualifiers: FunctionQualifiers,
    },
    Function {
        name: String,
        access: Option<Access>,
        qualifiers: FunctionQualifiers,
    },
    FunctionParameter {
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    /// Index of the symbol this node was created from.
    pub symbol: Option<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
}

impl Default for SyntaxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        SyntaxTree {
            nodes: vec![Node {
                kind: NodeKind::Namespace {
                    full_name: String::new(),
                },
                symbol: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Append a node under `parent` and return its id.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind, symbol: Option<usize>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            symbol,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id].kind
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// First `TypeNode` child of `id`.
    pub fn type_of(&self, id: NodeId) -> Option<TypeRef> {
        self.children(id).iter().find_map(|&child| match self.nodes[child].kind {
            NodeKind::TypeNode(type_ref) => Some(type_ref),
            _ => None,
        })
    }

    /// Walk from `id` up to the root, `id` first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&current| self.parent(current))
    }

    pub fn find_class(&self, qualified: &str) -> Option<NodeId> {
        self.iter().find_map(|(id, node)| match &node.kind {
            NodeKind::ClassDecl { qualified_name, .. } if qualified_name == qualified => Some(id),
            _ => None,
        })
    }
}
