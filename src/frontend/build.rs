// src/frontend/build.rs
//! Node allocation helpers.
//!
//! The parser drives these to materialize a module; tests use them to build
//! trees directly. Every helper allocates into the shared arena and wires
//! parent back-links, so the result is ready for scope walking.

use crate::frontend::ast::*;
use crate::frontend::{Interner, Span};

/// Convenience bundle for the optional parts of a class declaration.
#[derive(Default)]
pub struct ClassParts {
    pub generics: Option<NodeId>,
    pub heritages: Option<NodeId>,
    pub members: Vec<NodeId>,
    pub annotations: Option<NodeId>,
    pub modifiers: Modifiers,
}

/// Convenience bundle for the optional parts of a function declaration.
#[derive(Default)]
pub struct FunctionParts {
    pub generics: Option<NodeId>,
    pub params: Option<NodeId>,
    pub result: Option<NodeId>,
    pub body: Option<NodeId>,
    pub annotations: Option<NodeId>,
    pub modifiers: Modifiers,
}

/// Builds AST nodes into an owned arena + interner pair.
pub struct AstBuilder {
    pub ast: Ast,
    pub interner: Interner,
    cursor: u32,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            ast: Ast::new(),
            interner: Interner::new(),
            cursor: 0,
        }
    }

    pub fn sym(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Surrender the built arena and interner.
    pub fn into_parts(self) -> (Ast, Interner) {
        (self.ast, self.interner)
    }

    /// Fresh synthetic span; positions advance monotonically so every node
    /// gets a distinct, ordered location.
    fn next_span(&mut self) -> Span {
        self.cursor += 1;
        Span::new(self.cursor * 8, 4, self.cursor, 1)
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let span = self.next_span();
        let id = self.ast.alloc(kind, span);
        self.ast.reparent_children(id);
        id
    }

    fn alloc_with(&mut self, kind: NodeKind, modifiers: Modifiers) -> NodeId {
        let id = self.alloc(kind);
        self.ast.set_modifiers(id, modifiers);
        id
    }

    // --- module structure ---

    pub fn module(&mut self, path: &str, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Module(ModuleDecl {
            path: path.to_string(),
            items,
        }))
    }

    pub fn using(&mut self, path: &str) -> NodeId {
        self.alloc(NodeKind::Using(UsingDecl {
            path: path.to_string(),
            package: None,
        }))
    }

    pub fn using_as(&mut self, path: &str, alias: &str, generics: Option<NodeId>) -> NodeId {
        let name = self.sym(alias);
        let package = self.alloc(NodeKind::Package(PackageDecl {
            name,
            generics,
            path: path.to_string(),
        }));
        self.alloc(NodeKind::Using(UsingDecl {
            path: path.to_string(),
            package: Some(package),
        }))
    }

    // --- declarations ---

    pub fn class(&mut self, name: &str, parts: ClassParts) -> NodeId {
        let name = self.sym(name);
        self.alloc_with(
            NodeKind::Class(ClassDecl {
                name,
                generics: parts.generics,
                heritages: parts.heritages,
                members: parts.members,
                annotations: parts.annotations,
            }),
            parts.modifiers,
        )
    }

    pub fn enum_(&mut self, name: &str, variants: &[&str]) -> NodeId {
        let name = self.sym(name);
        let variants = variants
            .iter()
            .map(|v| {
                let name = self.sym(v);
                self.alloc(NodeKind::Variant(VariantDecl { name, value: None }))
            })
            .collect();
        self.alloc(NodeKind::Enum(EnumDecl {
            name,
            variants,
            annotations: None,
        }))
    }

    pub fn function(&mut self, name: &str, parts: FunctionParts) -> NodeId {
        let name = self.sym(name);
        self.alloc_with(
            NodeKind::Function(FunctionDecl {
                name,
                generics: parts.generics,
                params: parts.params,
                result: parts.result,
                body: parts.body,
                annotations: parts.annotations,
            }),
            parts.modifiers,
        )
    }

    pub fn property(&mut self, name: &str, ty: Option<NodeId>, value: Option<NodeId>) -> NodeId {
        let name = self.sym(name);
        self.alloc(NodeKind::Property(PropertyDecl {
            name,
            ty,
            value,
            annotations: None,
        }))
    }

    pub fn generics(&mut self, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Generics(items))
    }

    pub fn generic(&mut self, name: &str, bound: Option<NodeId>, default: Option<NodeId>) -> NodeId {
        let name = self.sym(name);
        self.alloc(NodeKind::Generic(GenericDecl {
            name,
            bound,
            default,
        }))
    }

    pub fn params(&mut self, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Parameters(items))
    }

    pub fn param(&mut self, name: &str, ty: Option<NodeId>, default: Option<NodeId>) -> NodeId {
        let name = self.sym(name);
        self.alloc(NodeKind::Parameter(ParameterDecl { name, ty, default }))
    }

    pub fn heritages(&mut self, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Heritages(items))
    }

    pub fn heritage(&mut self, alias: Option<&str>, ty: NodeId) -> NodeId {
        let alias = alias.map(|a| self.sym(a));
        self.alloc(NodeKind::Heritage(HeritageDecl { alias, ty }))
    }

    pub fn annotations(&mut self, items: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Annotations(items))
    }

    pub fn annotation(&mut self, key: &str) -> NodeId {
        let key = self.sym(key);
        self.alloc(NodeKind::Annotation(AnnotationDecl { key, value: None }))
    }

    // --- statements ---

    pub fn body(&mut self, stmts: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Body(stmts))
    }

    pub fn var(&mut self, name: &str, ty: Option<NodeId>, init: Option<NodeId>) -> NodeId {
        let name = self.sym(name);
        self.alloc(NodeKind::Var(VarDecl {
            keys: VarKeys::Name(name),
            ty,
            init,
        }))
    }

    pub fn var_entities(&mut self, names: &[&str], init: Option<NodeId>) -> NodeId {
        let entities = names
            .iter()
            .map(|n| {
                let name = self.sym(n);
                self.alloc(NodeKind::Entity(name))
            })
            .collect();
        self.alloc(NodeKind::Var(VarDecl {
            keys: VarKeys::Entities(entities),
            ty: None,
            init,
        }))
    }

    pub fn for_(
        &mut self,
        label: Option<&str>,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        step: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        let label = label.map(|l| self.sym(l));
        self.alloc(NodeKind::For(ForStmt {
            label,
            init,
            cond,
            step,
            body,
        }))
    }

    pub fn for_in(
        &mut self,
        label: Option<&str>,
        binding: NodeId,
        iterable: NodeId,
        body: NodeId,
    ) -> NodeId {
        let label = label.map(|l| self.sym(l));
        self.alloc(NodeKind::ForIn(ForInStmt {
            label,
            binding,
            iterable,
            body,
        }))
    }

    pub fn try_(&mut self, body: NodeId, catches: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Try(TryStmt { body, catches }))
    }

    pub fn catch(&mut self, params: Option<NodeId>, body: NodeId) -> NodeId {
        self.alloc(NodeKind::Catch(CatchClause { params, body }))
    }

    // --- expressions ---

    pub fn ident(&mut self, name: &str) -> NodeId {
        let name = self.sym(name);
        self.alloc(NodeKind::Ident(name))
    }

    pub fn int(&mut self, value: i64) -> NodeId {
        self.alloc(NodeKind::Int(value))
    }

    pub fn str_(&mut self, value: &str) -> NodeId {
        self.alloc(NodeKind::Str(value.to_string()))
    }

    pub fn null(&mut self) -> NodeId {
        self.alloc(NodeKind::Null)
    }

    pub fn attr(&mut self, base: NodeId, name: &str) -> NodeId {
        let name = self.sym(name);
        self.alloc(NodeKind::Attribute(AttributeExpr { base, name }))
    }

    pub fn call(&mut self, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let args = self.alloc(NodeKind::Arguments(args));
        self.alloc(NodeKind::Call(CallExpr { callee, args }))
    }

    pub fn index(&mut self, base: NodeId, args: Vec<NodeId>) -> NodeId {
        let args = self.alloc(NodeKind::Arguments(args));
        self.alloc(NodeKind::Index(IndexExpr { base, args }))
    }

    pub fn arg(&mut self, key: Option<&str>, value: NodeId) -> NodeId {
        let key = key.map(|k| self.sym(k));
        self.alloc(NodeKind::Argument(ArgumentExpr { key, value }))
    }

    pub fn pseudonym(&mut self, base: NodeId, fields: Vec<NodeId>) -> NodeId {
        let fields = self.alloc(NodeKind::Fields(fields));
        self.alloc(NodeKind::Pseudonym(PseudonymExpr { base, fields }))
    }

    pub fn field(&mut self, key: Option<&str>, value: NodeId) -> NodeId {
        let key = key.map(|k| self.sym(k));
        self.alloc(NodeKind::Field(FieldExpr { key, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_wires_parents() {
        let mut b = AstBuilder::new();
        let greet = b.function("Greet", FunctionParts::default());
        let class = b.class(
            "Base",
            ClassParts {
                members: vec![greet],
                ..Default::default()
            },
        );
        let module = b.module("main", vec![class]);

        assert_eq!(b.ast.parent(greet), Some(class));
        assert_eq!(b.ast.parent(class), Some(module));
        assert_eq!(b.ast.parent(module), None);
    }

    #[test]
    fn spans_are_distinct_and_ordered() {
        let mut b = AstBuilder::new();
        let first = b.ident("a");
        let second = b.ident("b");
        assert!(b.ast.span(first).offset < b.ast.span(second).offset);
    }
}
