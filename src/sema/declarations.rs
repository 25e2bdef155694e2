// src/sema/declarations.rs
//! Declaration validation: the top-down walk that runs before resolution.
//!
//! Every declaration is checked against the siblings declared before it in
//! its uniqueness scope; classes, functions, and packages escape a name
//! collision only when their generic (and, for functions, parameter) lists
//! differ. Modifier rules are enforced here too: static classes, annotation
//! keys, and the single `Main` entry point.

use crate::errors::SemanticError;
use crate::frontend::{Modifiers, NodeId, NodeKind, Span, Symbol, VarKeys};
use crate::sema::analyzer::{Analyzer, SemaResult};
use smallvec::SmallVec;

impl<'a> Analyzer<'a> {
    pub(crate) fn validate_item(&mut self, item: NodeId) -> SemaResult<()> {
        match self.ast.kind(item) {
            NodeKind::Using(_) => self.validate_using(item),
            NodeKind::Class(_) => self.validate_class(item),
            NodeKind::Enum(_) => self.validate_enum(item),
            _ => Ok(()),
        }
    }

    // --- imports ---

    fn validate_using(&mut self, using: NodeId) -> SemaResult<()> {
        let (path, package) = match self.ast.kind(using) {
            NodeKind::Using(u) => (u.path.clone(), u.package),
            _ => return Ok(()),
        };
        let span = self.ast.span(using);
        self.load_module(&path, span)?;

        if let Some(package) = package {
            let siblings = self.sibling_scope(using);
            self.check_sibling_duplicates(&siblings, using, package)?;
        }
        Ok(())
    }

    // --- classes ---

    fn validate_class(&mut self, class: NodeId) -> SemaResult<()> {
        let siblings = self.sibling_scope(class);
        self.check_sibling_duplicates(&siblings, class, class)?;
        self.check_import_collisions(class)?;

        let (generics, heritages, members, annotations) = {
            let c = self.ast.as_class(class).expect("class node");
            (c.generics, c.heritages, c.members.clone(), c.annotations)
        };

        self.check_annotation_keys(annotations)?;
        self.check_unique_names(generics)?;
        self.check_heritage_aliases(heritages)?;

        if self.ast.modifiers(class).contains(Modifiers::STATIC) {
            self.enforce_static_class(class, generics, heritages, &members)?;
        }

        for &member in &members {
            match self.ast.kind(member) {
                NodeKind::Class(_) => self.validate_class(member)?,
                NodeKind::Enum(_) => self.validate_enum(member)?,
                NodeKind::Function(_) => self.validate_function(member)?,
                NodeKind::Property(_) => self.validate_property(member)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// A static class carries no generics or heritages and forces the
    /// static modifier onto every member; nested classes repeat the check
    /// through their own validation.
    fn enforce_static_class(
        &mut self,
        _class: NodeId,
        generics: Option<NodeId>,
        heritages: Option<NodeId>,
        members: &[NodeId],
    ) -> SemaResult<()> {
        if let Some(generics) = generics {
            let span = self.ast.span(generics);
            return Err(self.report(SemanticError::StaticClassGenerics { span: span.into() }, span));
        }
        if let Some(heritages) = heritages {
            let span = self.ast.span(heritages);
            return Err(self.report(SemanticError::StaticClassHeritage { span: span.into() }, span));
        }
        for &member in members {
            if self.ast.decl_name(member).is_none() {
                continue;
            }
            if !self.ast.modifiers(member).contains(Modifiers::STATIC) {
                let span = self.ast.span(member);
                let name = self.decl_name_str(member);
                return Err(self.report(
                    SemanticError::StaticClassMember {
                        name,
                        span: span.into(),
                    },
                    span,
                ));
            }
        }
        Ok(())
    }

    // --- enums ---

    fn validate_enum(&mut self, decl: NodeId) -> SemaResult<()> {
        let siblings = self.sibling_scope(decl);
        self.check_sibling_duplicates(&siblings, decl, decl)?;
        self.check_import_collisions(decl)?;

        let (variants, annotations) = {
            let e = self.ast.as_enum(decl).expect("enum node");
            (e.variants.clone(), e.annotations)
        };
        self.check_annotation_keys(annotations)?;
        for &variant in &variants {
            self.check_sibling_duplicates(&variants, variant, variant)?;
        }
        Ok(())
    }

    // --- functions ---

    fn validate_function(&mut self, func: NodeId) -> SemaResult<()> {
        let siblings = self.sibling_scope(func);
        self.check_sibling_duplicates(&siblings, func, func)?;

        let (generics, params, body, annotations) = {
            let f = self.ast.as_function(func).expect("function node");
            (f.generics, f.params, f.body, f.annotations)
        };
        self.check_annotation_keys(annotations)?;
        self.check_unique_names(generics)?;
        self.check_unique_names(params)?;
        self.check_main_annotation(func, annotations)?;

        if let Some(body) = body {
            self.validate_body(body)?;
        }
        Ok(())
    }

    /// The `Main` annotation marks the program entry point: static only,
    /// and at most one across the whole program.
    fn check_main_annotation(&mut self, func: NodeId, annotations: Option<NodeId>) -> SemaResult<()> {
        let has_main = self
            .ast
            .list(annotations)
            .iter()
            .any(|&a| self.annotation_key(a) == Some(self.known.main));
        if !has_main {
            return Ok(());
        }

        let span = self.ast.span(func);
        if !self.ast.modifiers(func).contains(Modifiers::STATIC) {
            return Err(self.report(SemanticError::MainNotStatic { span: span.into() }, span));
        }
        if let Some(previous) = self.resolutions.main_function {
            let prev_span = self.ast.span(previous);
            return Err(self.report(
                SemanticError::MainAlreadyDefined {
                    span: span.into(),
                    previous: prev_span.into(),
                },
                span,
            ));
        }
        self.resolutions.main_function = Some(func);
        Ok(())
    }

    // --- properties ---

    fn validate_property(&mut self, prop: NodeId) -> SemaResult<()> {
        let siblings = self.sibling_scope(prop);
        self.check_sibling_duplicates(&siblings, prop, prop)?;
        let annotations = match self.ast.kind(prop) {
            NodeKind::Property(p) => p.annotations,
            _ => None,
        };
        self.check_annotation_keys(annotations)
    }

    // --- statement blocks ---

    pub(crate) fn validate_body(&mut self, body: NodeId) -> SemaResult<()> {
        let stmts: Vec<NodeId> = self.ast.list(Some(body)).to_vec();
        for &stmt in &stmts {
            match self.ast.kind(stmt) {
                NodeKind::Var(_) => self.check_block_duplicates(&stmts, stmt)?,
                NodeKind::For(f) => {
                    let body = f.body;
                    self.check_block_duplicates(&stmts, stmt)?;
                    self.validate_body(body)?;
                }
                NodeKind::ForIn(f) => {
                    let body = f.body;
                    self.check_block_duplicates(&stmts, stmt)?;
                    self.validate_body(body)?;
                }
                NodeKind::Try(t) => {
                    let (body, catches) = (t.body, t.catches.clone());
                    self.validate_body(body)?;
                    for catch in catches {
                        let (params, body) = match self.ast.kind(catch) {
                            NodeKind::Catch(c) => (c.params, c.body),
                            _ => continue,
                        };
                        self.check_unique_names(params)?;
                        self.validate_body(body)?;
                    }
                }
                NodeKind::Body(_) => self.validate_body(stmt)?,
                _ => {}
            }
        }
        Ok(())
    }

    // --- shared scans ---

    /// The sibling list forming a declaration's uniqueness scope: the
    /// member/item list of the nearest enclosing class or module.
    fn sibling_scope(&self, node: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.ast.parent(node) else {
            return Vec::new();
        };
        match self.ast.kind(parent) {
            NodeKind::Class(c) => c.members.clone(),
            NodeKind::Module(m) => m.items.clone(),
            NodeKind::Enum(e) => e.variants.clone(),
            _ => Vec::new(),
        }
    }

    /// Scan siblings declared earlier for a colliding name, stopping at the
    /// node itself. `named` is the node carrying the name being declared
    /// (for a `using` import, the bound package rather than the import).
    fn check_sibling_duplicates(
        &mut self,
        siblings: &[NodeId],
        node: NodeId,
        named: NodeId,
    ) -> SemaResult<()> {
        let Some(name) = self.ast.decl_name(named) else {
            return Ok(());
        };
        for &sibling in siblings {
            if sibling == node {
                break;
            }
            let sibling_named = self.named_decl_of(sibling);
            if self.ast.decl_name(sibling_named) != Some(name) {
                continue;
            }
            if self.distinct_overloads(sibling_named, named)? {
                continue;
            }
            return Err(self.duplicate_error(name, named, sibling_named));
        }
        Ok(())
    }

    /// For a top-level declaration, also scan the exported top-levels of
    /// every used module; imported symbols share the module's namespace.
    fn check_import_collisions(&mut self, decl: NodeId) -> SemaResult<()> {
        let Some(parent) = self.ast.parent(decl) else {
            return Ok(());
        };
        let items = match self.ast.kind(parent) {
            NodeKind::Module(m) => m.items.clone(),
            _ => return Ok(()),
        };
        let Some(name) = self.ast.decl_name(decl) else {
            return Ok(());
        };

        for item in items {
            let path = match self.ast.kind(item) {
                NodeKind::Using(u) => u.path.clone(),
                _ => continue,
            };
            // A broken import is the using item's own diagnostic.
            let Some(imported) = self.try_load_module(&path) else {
                continue;
            };
            let exported: Vec<NodeId> = self
                .ast
                .as_module(imported)
                .map(|m| m.items.clone())
                .unwrap_or_default()
                .into_iter()
                .filter(|&i| self.is_exported(i))
                .collect();

            for foreign in exported {
                if self.ast.decl_name(foreign) != Some(name) {
                    continue;
                }
                if self.distinct_overloads(foreign, decl)? {
                    continue;
                }
                return Err(self.duplicate_error(name, decl, foreign));
            }
        }
        Ok(())
    }

    /// Two same-named declarations may coexist only as overloads: classes
    /// and packages by generic shape, functions by generic shape or
    /// parameter signature. Everything else collides.
    fn distinct_overloads(&mut self, a: NodeId, b: NodeId) -> SemaResult<bool> {
        enum Shape {
            Class(Option<NodeId>),
            Function(Option<NodeId>, Option<NodeId>),
            Package(Option<NodeId>),
            Other,
        }
        let shape_of = |ast: &crate::frontend::Ast, id: NodeId| match ast.kind(id) {
            NodeKind::Class(c) => Shape::Class(c.generics),
            NodeKind::Function(f) => Shape::Function(f.generics, f.params),
            NodeKind::Package(p) => Shape::Package(p.generics),
            _ => Shape::Other,
        };

        match (shape_of(self.ast, a), shape_of(self.ast, b)) {
            (Shape::Class(ga), Shape::Class(gb)) | (Shape::Package(ga), Shape::Package(gb)) => {
                Ok(!self.generics_equal_generics(ga, gb)?)
            }
            (Shape::Function(ga, pa), Shape::Function(gb, pb)) => {
                if !self.generics_equal_generics(ga, gb)? {
                    return Ok(true);
                }
                Ok(!self.params_equal_params(pa, pb)?)
            }
            _ => Ok(false),
        }
    }

    /// Duplicate scan inside a statement block: var bindings (simple or
    /// destructured) and loop labels, among earlier statements only.
    fn check_block_duplicates(&mut self, stmts: &[NodeId], node: NodeId) -> SemaResult<()> {
        let names = self.block_decl_names(node);
        if names.is_empty() {
            return Ok(());
        }
        for &stmt in stmts {
            if stmt == node {
                break;
            }
            let earlier = self.block_decl_names(stmt);
            if let Some(&name) = names.iter().find(|n| earlier.contains(n)) {
                return Err(self.duplicate_error(name, node, stmt));
            }
        }
        Ok(())
    }

    fn block_decl_names(&self, stmt: NodeId) -> SmallVec<[Symbol; 2]> {
        let mut names = SmallVec::new();
        match self.ast.kind(stmt) {
            NodeKind::Var(v) => match &v.keys {
                VarKeys::Name(name) => names.push(*name),
                VarKeys::Entities(entities) => {
                    for &e in entities {
                        if let Some(name) = self.ast.decl_name(e) {
                            names.push(name);
                        }
                    }
                }
            },
            NodeKind::For(f) => names.extend(f.label),
            NodeKind::ForIn(f) => names.extend(f.label),
            _ => {}
        }
        names
    }

    /// Reject repeated annotation keys on one declaration.
    fn check_annotation_keys(&mut self, annotations: Option<NodeId>) -> SemaResult<()> {
        let items: Vec<NodeId> = self.ast.list(annotations).to_vec();
        for (i, &a) in items.iter().enumerate() {
            let Some(key) = self.annotation_key(a) else {
                continue;
            };
            for &earlier in &items[..i] {
                if self.annotation_key(earlier) == Some(key) {
                    let span = self.ast.span(a);
                    let prev_span = self.ast.span(earlier);
                    let key = self.name_str(key);
                    return Err(self.report(
                        SemanticError::DuplicateAnnotation {
                            key,
                            span: span.into(),
                            previous: prev_span.into(),
                        },
                        span,
                    ));
                }
            }
        }
        Ok(())
    }

    /// Reject repeated names within one Generics or Parameters list.
    fn check_unique_names(&mut self, list: Option<NodeId>) -> SemaResult<()> {
        let items: Vec<NodeId> = self.ast.list(list).to_vec();
        for (i, &item) in items.iter().enumerate() {
            let Some(name) = self.ast.decl_name(item) else {
                continue;
            };
            for &earlier in &items[..i] {
                if self.ast.decl_name(earlier) == Some(name) {
                    return Err(self.duplicate_error(name, item, earlier));
                }
            }
        }
        Ok(())
    }

    /// Reject repeated heritage aliases within one inheritance clause.
    fn check_heritage_aliases(&mut self, heritages: Option<NodeId>) -> SemaResult<()> {
        self.check_unique_names(heritages)
    }

    fn annotation_key(&self, node: NodeId) -> Option<Symbol> {
        match self.ast.kind(node) {
            NodeKind::Annotation(a) => Some(a.key),
            _ => None,
        }
    }

    /// The declaration a sibling contributes to the namespace: a `using`
    /// import contributes its bound package alias.
    fn named_decl_of(&self, node: NodeId) -> NodeId {
        match self.ast.kind(node) {
            NodeKind::Using(u) => u.package.unwrap_or(node),
            _ => node,
        }
    }

    fn decl_name_str(&self, node: NodeId) -> String {
        self.ast
            .decl_name(node)
            .map(|s| self.name_str(s))
            .unwrap_or_default()
    }

    fn duplicate_error(
        &mut self,
        name: Symbol,
        node: NodeId,
        previous: NodeId,
    ) -> crate::sema::analyzer::Reported {
        let span: Span = self.ast.span(node);
        let prev_span = self.ast.span(previous);
        let name = self.name_str(name);
        self.report(
            SemanticError::DuplicateDeclaration {
                name,
                span: span.into(),
                previous: prev_span.into(),
            },
            span,
        )
    }
}
