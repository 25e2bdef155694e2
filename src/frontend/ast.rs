// src/frontend/ast.rs
//! The Marten AST: an arena of tagged nodes produced by the parser and
//! annotated by semantic analysis.
//!
//! Nodes are addressed by [`NodeId`]; identity checks compare ids, never
//! addresses. Every node keeps a weak back-link to its parent so scope
//! resolution can walk outward without ownership cycles.

use crate::frontend::Span;
use bitflags::bitflags;

/// Unique identifier for symbols (interned strings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub u32);

/// Stable identity of a node within its [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

bitflags! {
    /// Source-derived modifiers. These are permanent node metadata;
    /// transient analysis state lives in side tables, not here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const STATIC  = 1 << 0;
        const EXPORT  = 1 << 1;
        const PROTECT = 1 << 2;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::empty()
    }
}

/// A single AST node.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub span: Span,
    pub modifiers: Modifiers,
}

/// Tagged payload of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // Primary expressions
    Ident(Symbol),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Null,
    Array(Vec<NodeId>),
    Dict(Vec<(NodeId, NodeId)>),

    // Module structure
    Module(ModuleDecl),
    Using(UsingDecl),
    Package(PackageDecl),

    // Declarations
    Class(ClassDecl),
    Enum(EnumDecl),
    Variant(VariantDecl),
    Function(FunctionDecl),
    Property(PropertyDecl),
    Generics(Vec<NodeId>),
    Generic(GenericDecl),
    Parameters(Vec<NodeId>),
    Parameter(ParameterDecl),
    Heritages(Vec<NodeId>),
    Heritage(HeritageDecl),
    Annotations(Vec<NodeId>),
    Annotation(AnnotationDecl),

    // Statements
    Body(Vec<NodeId>),
    Var(VarDecl),
    Entity(Symbol),
    For(ForStmt),
    ForIn(ForInStmt),
    Try(TryStmt),
    Catch(CatchClause),

    // Postfix expressions
    Call(CallExpr),
    Index(IndexExpr),
    Attribute(AttributeExpr),
    Pseudonym(PseudonymExpr),
    Arguments(Vec<NodeId>),
    Argument(ArgumentExpr),
    Fields(Vec<NodeId>),
    Field(FieldExpr),
}

/// A module: one source file's worth of top-level items (Using, Class, Enum).
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub path: String,
    pub items: Vec<NodeId>,
}

/// A `using "path"` import, optionally binding a package alias.
#[derive(Debug, Clone)]
pub struct UsingDecl {
    pub path: String,
    /// The bound [`PackageDecl`] node when the import carries an alias.
    pub package: Option<NodeId>,
}

/// A package alias bound by a `using` import.
#[derive(Debug, Clone)]
pub struct PackageDecl {
    pub name: Symbol,
    pub generics: Option<NodeId>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Symbol,
    pub generics: Option<NodeId>,
    pub heritages: Option<NodeId>,
    /// Ordered class block: Class, Enum, Function, and Property members.
    pub members: Vec<NodeId>,
    pub annotations: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Symbol,
    pub variants: Vec<NodeId>,
    pub annotations: Option<NodeId>,
}

/// One enum member.
#[derive(Debug, Clone)]
pub struct VariantDecl {
    pub name: Symbol,
    pub value: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub generics: Option<NodeId>,
    pub params: Option<NodeId>,
    /// Declared result type expression.
    pub result: Option<NodeId>,
    pub body: Option<NodeId>,
    pub annotations: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct PropertyDecl {
    pub name: Symbol,
    pub ty: Option<NodeId>,
    pub value: Option<NodeId>,
    pub annotations: Option<NodeId>,
}

/// One generic parameter: `T`, `T : Bound`, or `T = Default`.
#[derive(Debug, Clone)]
pub struct GenericDecl {
    pub name: Symbol,
    pub bound: Option<NodeId>,
    pub default: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ParameterDecl {
    pub name: Symbol,
    pub ty: Option<NodeId>,
    pub default: Option<NodeId>,
}

/// One inheritance clause entry: `: Base` or `: alias = Base`.
#[derive(Debug, Clone)]
pub struct HeritageDecl {
    pub alias: Option<Symbol>,
    /// Type expression naming the base class.
    pub ty: NodeId,
}

#[derive(Debug, Clone)]
pub struct AnnotationDecl {
    pub key: Symbol,
    pub value: Option<NodeId>,
}

/// A `var` statement; the key is a single name or a destructuring
/// list of [`NodeKind::Entity`] bindings.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub keys: VarKeys,
    pub ty: Option<NodeId>,
    pub init: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub enum VarKeys {
    Name(Symbol),
    Entities(Vec<NodeId>),
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub label: Option<Symbol>,
    /// Loop variable declaration (a Var node), when present.
    pub init: Option<NodeId>,
    pub cond: Option<NodeId>,
    pub step: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct ForInStmt {
    pub label: Option<Symbol>,
    /// The iteration binding (a Var node).
    pub binding: NodeId,
    pub iterable: NodeId,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct TryStmt {
    pub body: NodeId,
    pub catches: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub params: Option<NodeId>,
    pub body: NodeId,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: NodeId,
    /// An Arguments node.
    pub args: NodeId,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub base: NodeId,
    pub args: NodeId,
}

#[derive(Debug, Clone)]
pub struct AttributeExpr {
    pub base: NodeId,
    pub name: Symbol,
}

/// Generic instantiation: `Box<Int>` — a base expression plus a Fields list.
#[derive(Debug, Clone)]
pub struct PseudonymExpr {
    pub base: NodeId,
    pub fields: NodeId,
}

#[derive(Debug, Clone)]
pub struct ArgumentExpr {
    pub key: Option<Symbol>,
    pub value: NodeId,
}

#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub key: Option<Symbol>,
    pub value: NodeId,
}

/// Arena owning every node of a program (all modules share one arena, so a
/// resolution target may point into any loaded module).
#[derive(Debug, Default)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            parent: None,
            span,
            modifiers: Modifiers::empty(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.node(id).span
    }

    pub fn modifiers(&self, id: NodeId) -> Modifiers {
        self.node(id).modifiers
    }

    pub fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.node_mut(child).parent = Some(parent);
    }

    pub fn set_modifiers(&mut self, id: NodeId, modifiers: Modifiers) {
        self.node_mut(id).modifiers = modifiers;
    }

    /// Elements of a list-shaped node (Generics, Parameters, Heritages,
    /// Annotations, Arguments, Fields, Body). `None` and non-list nodes
    /// yield an empty slice.
    pub fn list(&self, id: Option<NodeId>) -> &[NodeId] {
        let Some(id) = id else { return &[] };
        match self.kind(id) {
            NodeKind::Generics(items)
            | NodeKind::Parameters(items)
            | NodeKind::Heritages(items)
            | NodeKind::Annotations(items)
            | NodeKind::Arguments(items)
            | NodeKind::Fields(items)
            | NodeKind::Body(items) => items,
            _ => &[],
        }
    }

    /// Declared name of a declaration node, if it has one.
    pub fn decl_name(&self, id: NodeId) -> Option<Symbol> {
        match self.kind(id) {
            NodeKind::Class(c) => Some(c.name),
            NodeKind::Enum(e) => Some(e.name),
            NodeKind::Variant(v) => Some(v.name),
            NodeKind::Function(f) => Some(f.name),
            NodeKind::Property(p) => Some(p.name),
            NodeKind::Generic(g) => Some(g.name),
            NodeKind::Parameter(p) => Some(p.name),
            NodeKind::Package(p) => Some(p.name),
            NodeKind::Entity(name) => Some(*name),
            NodeKind::Heritage(h) => h.alias,
            NodeKind::Var(v) => match &v.keys {
                VarKeys::Name(name) => Some(*name),
                VarKeys::Entities(_) => None,
            },
            _ => None,
        }
    }

    pub fn as_class(&self, id: NodeId) -> Option<&ClassDecl> {
        match self.kind(id) {
            NodeKind::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_enum(&self, id: NodeId) -> Option<&EnumDecl> {
        match self.kind(id) {
            NodeKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_function(&self, id: NodeId) -> Option<&FunctionDecl> {
        match self.kind(id) {
            NodeKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_module(&self, id: NodeId) -> Option<&ModuleDecl> {
        match self.kind(id) {
            NodeKind::Module(m) => Some(m),
            _ => None,
        }
    }

    /// Deep-clone a declaration subtree under a new parent. Child links in
    /// the cloned payloads are remapped to the fresh nodes.
    pub fn clone_subtree(&mut self, node: NodeId, parent: Option<NodeId>) -> NodeId {
        let copy = self.clone_node(node);
        if let Some(parent) = parent {
            self.set_parent(copy, parent);
        }
        copy
    }

    fn clone_node(&mut self, node: NodeId) -> NodeId {
        let Node {
            kind,
            span,
            modifiers,
            ..
        } = self.node(node).clone();

        let kind = match kind {
            NodeKind::Array(items) => NodeKind::Array(self.clone_all(&items)),
            NodeKind::Dict(pairs) => NodeKind::Dict(
                pairs
                    .into_iter()
                    .map(|(k, v)| (self.clone_node(k), self.clone_node(v)))
                    .collect(),
            ),
            NodeKind::Module(m) => NodeKind::Module(ModuleDecl {
                items: self.clone_all(&m.items),
                ..m
            }),
            NodeKind::Using(u) => NodeKind::Using(UsingDecl {
                package: self.clone_opt(u.package),
                ..u
            }),
            NodeKind::Package(p) => NodeKind::Package(PackageDecl {
                generics: self.clone_opt(p.generics),
                ..p
            }),
            NodeKind::Class(c) => NodeKind::Class(ClassDecl {
                generics: self.clone_opt(c.generics),
                heritages: self.clone_opt(c.heritages),
                members: self.clone_all(&c.members),
                annotations: self.clone_opt(c.annotations),
                ..c
            }),
            NodeKind::Enum(e) => NodeKind::Enum(EnumDecl {
                variants: self.clone_all(&e.variants),
                annotations: self.clone_opt(e.annotations),
                ..e
            }),
            NodeKind::Variant(v) => NodeKind::Variant(VariantDecl {
                value: self.clone_opt(v.value),
                ..v
            }),
            NodeKind::Function(f) => NodeKind::Function(FunctionDecl {
                generics: self.clone_opt(f.generics),
                params: self.clone_opt(f.params),
                result: self.clone_opt(f.result),
                body: self.clone_opt(f.body),
                annotations: self.clone_opt(f.annotations),
                ..f
            }),
            NodeKind::Property(p) => NodeKind::Property(PropertyDecl {
                ty: self.clone_opt(p.ty),
                value: self.clone_opt(p.value),
                annotations: self.clone_opt(p.annotations),
                ..p
            }),
            NodeKind::Generics(items) => NodeKind::Generics(self.clone_all(&items)),
            NodeKind::Generic(g) => NodeKind::Generic(GenericDecl {
                bound: self.clone_opt(g.bound),
                default: self.clone_opt(g.default),
                ..g
            }),
            NodeKind::Parameters(items) => NodeKind::Parameters(self.clone_all(&items)),
            NodeKind::Parameter(p) => NodeKind::Parameter(ParameterDecl {
                ty: self.clone_opt(p.ty),
                default: self.clone_opt(p.default),
                ..p
            }),
            NodeKind::Heritages(items) => NodeKind::Heritages(self.clone_all(&items)),
            NodeKind::Heritage(h) => NodeKind::Heritage(HeritageDecl {
                ty: self.clone_node(h.ty),
                ..h
            }),
            NodeKind::Annotations(items) => NodeKind::Annotations(self.clone_all(&items)),
            NodeKind::Annotation(a) => NodeKind::Annotation(AnnotationDecl {
                value: self.clone_opt(a.value),
                ..a
            }),
            NodeKind::Body(items) => NodeKind::Body(self.clone_all(&items)),
            NodeKind::Var(v) => NodeKind::Var(VarDecl {
                keys: match v.keys {
                    VarKeys::Name(name) => VarKeys::Name(name),
                    VarKeys::Entities(items) => VarKeys::Entities(self.clone_all(&items)),
                },
                ty: self.clone_opt(v.ty),
                init: self.clone_opt(v.init),
            }),
            NodeKind::For(f) => NodeKind::For(ForStmt {
                init: self.clone_opt(f.init),
                cond: self.clone_opt(f.cond),
                step: self.clone_opt(f.step),
                body: self.clone_node(f.body),
                ..f
            }),
            NodeKind::ForIn(f) => NodeKind::ForIn(ForInStmt {
                binding: self.clone_node(f.binding),
                iterable: self.clone_node(f.iterable),
                body: self.clone_node(f.body),
                ..f
            }),
            NodeKind::Try(t) => NodeKind::Try(TryStmt {
                body: self.clone_node(t.body),
                catches: self.clone_all(&t.catches),
            }),
            NodeKind::Catch(c) => NodeKind::Catch(CatchClause {
                params: self.clone_opt(c.params),
                body: self.clone_node(c.body),
            }),
            NodeKind::Call(c) => NodeKind::Call(CallExpr {
                callee: self.clone_node(c.callee),
                args: self.clone_node(c.args),
            }),
            NodeKind::Index(i) => NodeKind::Index(IndexExpr {
                base: self.clone_node(i.base),
                args: self.clone_node(i.args),
            }),
            NodeKind::Attribute(a) => NodeKind::Attribute(AttributeExpr {
                base: self.clone_node(a.base),
                ..a
            }),
            NodeKind::Pseudonym(p) => NodeKind::Pseudonym(PseudonymExpr {
                base: self.clone_node(p.base),
                fields: self.clone_node(p.fields),
            }),
            NodeKind::Arguments(items) => NodeKind::Arguments(self.clone_all(&items)),
            NodeKind::Argument(a) => NodeKind::Argument(ArgumentExpr {
                value: self.clone_node(a.value),
                ..a
            }),
            NodeKind::Fields(items) => NodeKind::Fields(self.clone_all(&items)),
            NodeKind::Field(f) => NodeKind::Field(FieldExpr {
                value: self.clone_node(f.value),
                ..f
            }),
            leaf @ (NodeKind::Ident(_)
            | NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Char(_)
            | NodeKind::Str(_)
            | NodeKind::Null
            | NodeKind::Entity(_)) => leaf,
        };

        let copy = self.alloc(kind, span);
        self.node_mut(copy).modifiers = modifiers;
        self.reparent_children(copy);
        copy
    }

    fn clone_all(&mut self, items: &[NodeId]) -> Vec<NodeId> {
        items.iter().map(|&id| self.clone_node(id)).collect()
    }

    fn clone_opt(&mut self, item: Option<NodeId>) -> Option<NodeId> {
        item.map(|id| self.clone_node(id))
    }

    /// Point every direct child of `parent` back at it.
    pub fn reparent_children(&mut self, parent: NodeId) {
        let children = self.direct_children(parent);
        for child in children {
            self.set_parent(child, parent);
        }
    }

    fn direct_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self.kind(id) {
            NodeKind::Array(items)
            | NodeKind::Generics(items)
            | NodeKind::Parameters(items)
            | NodeKind::Heritages(items)
            | NodeKind::Annotations(items)
            | NodeKind::Body(items)
            | NodeKind::Arguments(items)
            | NodeKind::Fields(items) => out.extend_from_slice(items),
            NodeKind::Dict(pairs) => {
                for (k, v) in pairs {
                    out.push(*k);
                    out.push(*v);
                }
            }
            NodeKind::Module(m) => out.extend_from_slice(&m.items),
            NodeKind::Using(u) => out.extend(u.package),
            NodeKind::Package(p) => out.extend(p.generics),
            NodeKind::Class(c) => {
                out.extend(c.generics);
                out.extend(c.heritages);
                out.extend_from_slice(&c.members);
                out.extend(c.annotations);
            }
            NodeKind::Enum(e) => {
                out.extend_from_slice(&e.variants);
                out.extend(e.annotations);
            }
            NodeKind::Variant(v) => out.extend(v.value),
            NodeKind::Function(f) => {
                out.extend(f.generics);
                out.extend(f.params);
                out.extend(f.result);
                out.extend(f.body);
                out.extend(f.annotations);
            }
            NodeKind::Property(p) => {
                out.extend(p.ty);
                out.extend(p.value);
                out.extend(p.annotations);
            }
            NodeKind::Generic(g) => {
                out.extend(g.bound);
                out.extend(g.default);
            }
            NodeKind::Parameter(p) => {
                out.extend(p.ty);
                out.extend(p.default);
            }
            NodeKind::Heritage(h) => out.push(h.ty),
            NodeKind::Annotation(a) => out.extend(a.value),
            NodeKind::Var(v) => {
                if let VarKeys::Entities(items) = &v.keys {
                    out.extend_from_slice(items);
                }
                out.extend(v.ty);
                out.extend(v.init);
            }
            NodeKind::For(f) => {
                out.extend(f.init);
                out.extend(f.cond);
                out.extend(f.step);
                out.push(f.body);
            }
            NodeKind::ForIn(f) => {
                out.push(f.binding);
                out.push(f.iterable);
                out.push(f.body);
            }
            NodeKind::Try(t) => {
                out.push(t.body);
                out.extend_from_slice(&t.catches);
            }
            NodeKind::Catch(c) => {
                out.extend(c.params);
                out.push(c.body);
            }
            NodeKind::Call(c) => {
                out.push(c.callee);
                out.push(c.args);
            }
            NodeKind::Index(i) => {
                out.push(i.base);
                out.push(i.args);
            }
            NodeKind::Attribute(a) => out.push(a.base),
            NodeKind::Pseudonym(p) => {
                out.push(p.base);
                out.push(p.fields);
            }
            NodeKind::Argument(a) => out.push(a.value),
            NodeKind::Field(f) => out.push(f.value),
            NodeKind::Ident(_)
            | NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Char(_)
            | NodeKind::Str(_)
            | NodeKind::Null
            | NodeKind::Entity(_) => {}
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_assigns_sequential_ids() {
        let mut ast = Ast::new();
        let a = ast.alloc(NodeKind::Null, Span::default());
        let b = ast.alloc(NodeKind::Int(1), Span::default());
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
    }

    #[test]
    fn clone_subtree_remaps_children_and_parents() {
        let mut ast = Ast::new();
        let value = ast.alloc(NodeKind::Int(3), Span::default());
        let prop = ast.alloc(
            NodeKind::Property(PropertyDecl {
                name: Symbol(0),
                ty: None,
                value: Some(value),
                annotations: None,
            }),
            Span::default(),
        );
        ast.set_parent(value, prop);

        let copy = ast.clone_subtree(prop, None);
        assert_ne!(copy, prop);
        let copied_value = match ast.kind(copy) {
            NodeKind::Property(p) => p.value.unwrap(),
            other => panic!("unexpected kind: {:?}", other),
        };
        assert_ne!(copied_value, value);
        assert_eq!(ast.parent(copied_value), Some(copy));
        assert!(matches!(ast.kind(copied_value), NodeKind::Int(3)));
    }
}
