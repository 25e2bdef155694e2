// src/sema/resolve.rs
//! Identifier resolution: the outward lexical scope walk.
//!
//! From an origin node, enclosing scopes are searched one level at a time —
//! catch clauses, loop initializers, statement blocks, functions, packages,
//! classes, modules — until a level yields at least one declaration with the
//! requested name. A level that yields candidates ends the walk; an empty
//! result at the arena root means the reference is unresolved.

use crate::frontend::{Modifiers, NodeId, NodeKind, Symbol, VarKeys};
use crate::sema::analyzer::{Analyzer, SemaResult};
use crate::sema::member::Visibility;
use crate::sema::output::{Candidates, Resolved};
use smallvec::SmallVec;

/// Cheap per-level extraction of the ids a scope search needs, so the walk
/// never holds a node borrow across a mutable call.
enum Level {
    Catch { params: Option<NodeId> },
    For { init: Option<NodeId> },
    ForIn { binding: NodeId },
    Body { stmts: SmallVec<[NodeId; 8]> },
    Function { generics: Option<NodeId>, params: Option<NodeId> },
    Package { generics: Option<NodeId> },
    Class,
    Module,
    Other,
}

impl<'a> Analyzer<'a> {
    /// Resolve `name` lexically outward from `origin`.
    ///
    /// Returns every declaration the name can denote at that point; more
    /// than one entry is an overload set (functions/classes/packages only).
    pub fn resolve_name(&mut self, origin: NodeId, name: Symbol) -> SemaResult<Candidates> {
        let mut cursor = origin;
        // The node we ascended from; drives declare-before-use in blocks
        // and suppresses base-class search while resolving a class's own
        // heritage clause.
        let mut child: Option<NodeId> = None;

        loop {
            let level = self.level_of(cursor);
            let mut found = Candidates::new();

            match level {
                Level::Catch { params } => self.search_params(params, name, &mut found),
                Level::For { init } => {
                    if let Some(init) = init {
                        self.search_binding(init, name, &mut found);
                    }
                }
                Level::ForIn { binding } => self.search_binding(binding, name, &mut found),
                Level::Body { stmts } => self.search_block(&stmts, child, name, &mut found),
                Level::Function { generics, params } => {
                    self.search_generics(generics, name, &mut found);
                    if found.is_empty() {
                        self.search_params(params, name, &mut found);
                    }
                }
                Level::Package { generics } => self.search_generics(generics, name, &mut found),
                Level::Class => self.class_scope_lookup(cursor, name, child, &mut found)?,
                Level::Module => self.module_scope_lookup(cursor, name, &mut found)?,
                Level::Other => {}
            }

            if !found.is_empty() {
                tracing::debug!(?cursor, candidates = found.len(), "name resolved");
                return Ok(found);
            }

            child = Some(cursor);
            match self.ast.parent(cursor) {
                Some(parent) => cursor = parent,
                None => return Ok(Candidates::new()),
            }
        }
    }

    fn level_of(&self, node: NodeId) -> Level {
        match self.ast.kind(node) {
            NodeKind::Catch(c) => Level::Catch { params: c.params },
            NodeKind::For(f) => Level::For { init: f.init },
            NodeKind::ForIn(f) => Level::ForIn { binding: f.binding },
            NodeKind::Body(stmts) => Level::Body {
                stmts: stmts.iter().copied().collect(),
            },
            NodeKind::Function(f) => Level::Function {
                generics: f.generics,
                params: f.params,
            },
            NodeKind::Package(p) => Level::Package {
                generics: p.generics,
            },
            NodeKind::Class(_) => Level::Class,
            NodeKind::Module(_) => Level::Module,
            _ => Level::Other,
        }
    }

    /// Match against a Parameters list. Parameter names are unique within a
    /// list, so the first hit is the only hit.
    pub(crate) fn search_params(
        &self,
        params: Option<NodeId>,
        name: Symbol,
        out: &mut Candidates,
    ) {
        for &p in self.ast.list(params) {
            if self.ast.decl_name(p) == Some(name) {
                out.push(Resolved::instance(p));
                return;
            }
        }
    }

    pub(crate) fn search_generics(
        &self,
        generics: Option<NodeId>,
        name: Symbol,
        out: &mut Candidates,
    ) {
        for &g in self.ast.list(generics) {
            if self.ast.decl_name(g) == Some(name) {
                out.push(Resolved::decl(g));
                return;
            }
        }
    }

    /// Match a Var statement's binding(s): a simple key or each entity of a
    /// destructuring list.
    fn search_binding(&self, var: NodeId, name: Symbol, out: &mut Candidates) {
        let NodeKind::Var(v) = self.ast.kind(var) else {
            return;
        };
        match &v.keys {
            VarKeys::Name(key) => {
                if *key == name {
                    out.push(Resolved::instance(var));
                }
            }
            VarKeys::Entities(entities) => {
                for &e in entities {
                    if self.ast.decl_name(e) == Some(name) {
                        out.push(Resolved::instance(e));
                        return;
                    }
                }
            }
        }
    }

    /// Match the declarations of a statement block that precede the
    /// statement the walk ascended from. Plain locals are not visible to
    /// earlier siblings; only hoisted containers (classes, modules) grant
    /// forward visibility.
    fn search_block(
        &self,
        stmts: &[NodeId],
        from_child: Option<NodeId>,
        name: Symbol,
        out: &mut Candidates,
    ) {
        for &stmt in stmts {
            if Some(stmt) == from_child {
                break;
            }
            match self.ast.kind(stmt) {
                NodeKind::Var(_) => {
                    self.search_binding(stmt, name, out);
                    if !out.is_empty() {
                        return;
                    }
                }
                NodeKind::For(f) => {
                    if f.label == Some(name) {
                        out.push(Resolved::decl(stmt));
                        return;
                    }
                }
                NodeKind::ForIn(f) => {
                    if f.label == Some(name) {
                        out.push(Resolved::decl(stmt));
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Search a class scope from inside it: generics, heritage aliases, all
    /// block members (forward-visible), then inherited members — unless the
    /// walk came from the class's own heritage clause, which must resolve
    /// against the enclosing scope only.
    fn class_scope_lookup(
        &mut self,
        class: NodeId,
        name: Symbol,
        from_child: Option<NodeId>,
        out: &mut Candidates,
    ) -> SemaResult<()> {
        let (generics, heritages, members) = {
            let c = self.ast.as_class(class).expect("class node");
            (c.generics, c.heritages, c.members.clone())
        };

        self.search_generics(generics, name, out);
        if !out.is_empty() {
            return Ok(());
        }

        for &h in self.ast.list(heritages) {
            if self.ast.decl_name(h) == Some(name) {
                out.push(Resolved::decl(h));
            }
        }
        if !out.is_empty() {
            return Ok(());
        }

        // Lexical lookups see every member, protected ones included.
        let vis = Visibility {
            inside: true,
            instance: true,
        };
        self.search_members(&members, name, vis, out);
        if !out.is_empty() {
            return Ok(());
        }

        if heritages.is_some() && from_child != heritages {
            self.search_inherited(class, name, vis, out)?;
        }
        Ok(())
    }

    /// Search a module scope: using-bound package aliases, the module's own
    /// top-level classes/enums (forward-visible), then the exported
    /// top-levels of every used module.
    fn module_scope_lookup(
        &mut self,
        module: NodeId,
        name: Symbol,
        out: &mut Candidates,
    ) -> SemaResult<()> {
        let items: Vec<NodeId> = self
            .ast
            .as_module(module)
            .map(|m| m.items.clone())
            .unwrap_or_default();

        for &item in &items {
            if let NodeKind::Using(u) = self.ast.kind(item) {
                let Some(package) = u.package else { continue };
                if self.ast.decl_name(package) == Some(name) {
                    out.push(Resolved::decl(package));
                }
            }
        }
        if !out.is_empty() {
            return Ok(());
        }

        let vis = Visibility {
            inside: true,
            instance: true,
        };
        self.search_members(&items, name, vis, out);
        if !out.is_empty() {
            return Ok(());
        }

        for &item in &items {
            let path = match self.ast.kind(item) {
                NodeKind::Using(u) => u.path.clone(),
                _ => continue,
            };
            // Load failures were reported while validating the Using item;
            // here only the cached tree is consulted.
            let Some(imported) = self.modules.get(&path) else {
                continue;
            };
            self.search_exports(imported, name, out);
            if !out.is_empty() {
                return Ok(());
            }
        }
        Ok(())
    }

    /// Match the exported (non-protected) top-level classes/enums of an
    /// imported module.
    pub(crate) fn search_exports(&self, module: NodeId, name: Symbol, out: &mut Candidates) {
        let Some(m) = self.ast.as_module(module) else {
            return;
        };
        for &item in &m.items {
            if !self.is_exported(item) {
                continue;
            }
            if self.ast.decl_name(item) != Some(name) {
                continue;
            }
            match self.ast.kind(item) {
                NodeKind::Class(_) => out.push(Resolved::decl(item)),
                NodeKind::Enum(_) => {
                    out.push(Resolved::decl(item));
                    return;
                }
                _ => {}
            }
        }
    }

    pub(crate) fn is_exported(&self, item: NodeId) -> bool {
        let mods = self.ast.modifiers(item);
        mods.contains(Modifiers::EXPORT) && !mods.contains(Modifiers::PROTECT)
    }
}
