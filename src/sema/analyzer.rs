// src/sema/analyzer.rs
//! The analyzer: validates declarations, resolves every reference, and
//! records results in side tables.
//!
//! One `Analyzer` is one isolated analysis run: it owns the error list, the
//! resolution tables, and the module registry, so concurrent runs over
//! separate arenas cannot contaminate each other.

use crate::errors::SemanticError;
use crate::frontend::{Ast, Interner, NodeId, NodeKind, Span, Symbol};
use crate::module::{ModuleMap, ModuleSource};
use crate::sema::output::Resolutions;
use crate::sema::well_known::WellKnown;

/// An error with the node position it was reported at.
#[derive(Debug, Clone, PartialEq)]
pub struct SemaError {
    pub error: SemanticError,
    pub span: Span,
}

impl SemaError {
    pub fn new(error: SemanticError, span: Span) -> Self {
        Self { error, span }
    }
}

/// Witness that a diagnostic has already been pushed; carries no payload.
/// Callers propagate it with `?` and add nothing on the way up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reported;

pub type SemaResult<T> = Result<T, Reported>;

/// Entry handle located by [`Analyzer::finalize`], passed on to emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPoint {
    pub class: NodeId,
    pub constructor: NodeId,
}

pub struct Analyzer<'a> {
    pub(crate) ast: &'a mut Ast,
    pub(crate) interner: &'a mut Interner,
    source: &'a mut dyn ModuleSource,
    pub(crate) modules: ModuleMap,
    errors: Vec<SemaError>,
    pub(crate) resolutions: Resolutions,
    pub(crate) known: WellKnown,
    /// Value declarations whose type is being derived right now; a
    /// re-entrant request is an initializer cycle and types as nothing.
    pub(crate) value_type_stack: Vec<NodeId>,
    /// Heritage nodes being resolved right now; re-entry is a cycle.
    pub(crate) heritage_stack: Vec<NodeId>,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        ast: &'a mut Ast,
        interner: &'a mut Interner,
        source: &'a mut dyn ModuleSource,
    ) -> Self {
        let known = WellKnown::intern(interner);
        Self {
            ast,
            interner,
            source,
            modules: ModuleMap::new(),
            errors: Vec::new(),
            resolutions: Resolutions::new(),
            known,
            value_type_stack: Vec::new(),
            heritage_stack: Vec::new(),
        }
    }

    /// Push a diagnostic and hand back the witness for `?`-propagation.
    pub(crate) fn report(&mut self, error: SemanticError, span: Span) -> Reported {
        self.errors.push(SemaError::new(error, span));
        Reported
    }

    pub fn errors(&self) -> &[SemaError] {
        &self.errors
    }

    pub fn resolutions(&self) -> &Resolutions {
        &self.resolutions
    }

    /// Validate and resolve every declaration in a module.
    ///
    /// Top-level items are analyzed independently: a fault inside one item
    /// abandons that item's subtree but the walk continues, so the returned
    /// error list covers the whole module.
    #[tracing::instrument(skip(self))]
    pub fn analyze_module(&mut self, module: NodeId) -> Result<(), Vec<SemaError>> {
        if let Some(m) = self.ast.as_module(module) {
            let path = m.path.clone();
            self.modules.insert(&path, module);
        }

        let items: Vec<NodeId> = self
            .ast
            .as_module(module)
            .map(|m| m.items.clone())
            .unwrap_or_default();

        for &item in &items {
            let _ = self.validate_item(item);
        }
        for &item in &items {
            let _ = self.resolve_item(item);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.errors))
        }
    }

    /// Locate the designated entry point: a class named `System` with a
    /// member function named `Constructor`.
    pub fn finalize(&mut self, module: NodeId) -> SemaResult<EntryPoint> {
        let items: Vec<NodeId> = self
            .ast
            .as_module(module)
            .map(|m| m.items.clone())
            .unwrap_or_default();

        let class = items.iter().copied().find(|&item| {
            self.ast.as_class(item).is_some() && self.ast.decl_name(item) == Some(self.known.system)
        });
        let Some(class) = class else {
            let span = self.ast.span(module);
            return Err(self.report(SemanticError::EntryClassMissing { span: span.into() }, span));
        };

        let members = self.ast.as_class(class).map(|c| c.members.clone()).unwrap_or_default();
        let constructor = members.iter().copied().find(|&m| {
            self.ast.as_function(m).is_some()
                && self.ast.decl_name(m) == Some(self.known.constructor)
        });
        let Some(constructor) = constructor else {
            let span = self.ast.span(class);
            let name = self.name_str(self.known.system);
            return Err(self.report(
                SemanticError::EntryConstructorMissing {
                    name,
                    span: span.into(),
                },
                span,
            ));
        };

        Ok(EntryPoint { class, constructor })
    }

    /// Hand the side tables (and any errors reported after `analyze_module`
    /// drained the list) to the next phase.
    pub fn into_output(self) -> (Resolutions, Vec<SemaError>) {
        (self.resolutions, self.errors)
    }

    // --- shared helpers ---

    pub(crate) fn name_str(&self, sym: Symbol) -> String {
        self.interner.resolve(sym).to_string()
    }

    /// Load a module through the registry, reporting failures at `span`.
    pub(crate) fn load_module(&mut self, path: &str, span: Span) -> SemaResult<NodeId> {
        match self
            .modules
            .load(&mut *self.source, path, self.ast, self.interner)
        {
            Ok(module) => Ok(module),
            Err(err) => Err(self.report(
                SemanticError::ModuleLoad {
                    path: path.to_string(),
                    detail: err.to_string(),
                    span: span.into(),
                },
                span,
            )),
        }
    }

    /// Load a module without reporting: used where the owning `using` item
    /// already carries the diagnostic for a broken import.
    pub(crate) fn try_load_module(&mut self, path: &str) -> Option<NodeId> {
        self.modules
            .load(&mut *self.source, path, self.ast, self.interner)
            .ok()
    }

    /// Human-readable rendering of a reference expression for diagnostics.
    pub(crate) fn describe(&self, node: NodeId) -> String {
        match self.ast.kind(node) {
            NodeKind::Ident(sym) => self.interner.resolve(*sym).to_string(),
            NodeKind::Attribute(a) => {
                format!("{}.{}", self.describe(a.base), self.interner.resolve(a.name))
            }
            NodeKind::Call(c) => format!("{}(...)", self.describe(c.callee)),
            NodeKind::Index(i) => format!("{}[...]", self.describe(i.base)),
            NodeKind::Pseudonym(p) => format!("{}<...>", self.describe(p.base)),
            NodeKind::Str(_) => "string literal".to_string(),
            NodeKind::Int(_) | NodeKind::Float(_) => "number literal".to_string(),
            _ => "<expression>".to_string(),
        }
    }

    // --- resolution pass (pass 2) ---

    pub(crate) fn resolve_item(&mut self, item: NodeId) -> SemaResult<()> {
        match self.ast.kind(item) {
            NodeKind::Class(_) => self.resolve_class(item),
            _ => Ok(()),
        }
    }

    fn resolve_class(&mut self, class: NodeId) -> SemaResult<()> {
        self.check_heritage_chain(class)?;

        let (generics, members) = {
            let c = self.ast.as_class(class).expect("class node");
            (c.generics, c.members.clone())
        };
        self.resolve_generics(generics)?;

        for member in members {
            match self.ast.kind(member) {
                NodeKind::Function(_) => self.resolve_function(member)?,
                NodeKind::Property(_) => self.resolve_property(member)?,
                NodeKind::Class(_) => self.resolve_class(member)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn resolve_generics(&mut self, generics: Option<NodeId>) -> SemaResult<()> {
        let items: Vec<NodeId> = self.ast.list(generics).to_vec();
        for g in items {
            let (bound, default) = match self.ast.kind(g) {
                NodeKind::Generic(g) => (g.bound, g.default),
                _ => (None, None),
            };
            if let Some(bound) = bound {
                self.check_type_expr(bound)?;
            }
            if let Some(default) = default {
                self.check_type_expr(default)?;
            }
        }
        Ok(())
    }

    fn resolve_params(&mut self, params: Option<NodeId>) -> SemaResult<()> {
        let items: Vec<NodeId> = self.ast.list(params).to_vec();
        for p in items {
            let (ty, default) = match self.ast.kind(p) {
                NodeKind::Parameter(p) => (p.ty, p.default),
                _ => (None, None),
            };
            if let Some(ty) = ty {
                self.check_type_expr(ty)?;
            }
            if let Some(default) = default {
                self.check_expr(default)?;
            }
        }
        Ok(())
    }

    fn resolve_function(&mut self, func: NodeId) -> SemaResult<()> {
        let (generics, params, result, body) = {
            let f = self.ast.as_function(func).expect("function node");
            (f.generics, f.params, f.result, f.body)
        };
        self.resolve_generics(generics)?;
        self.resolve_params(params)?;
        if let Some(result) = result {
            self.check_type_expr(result)?;
        }
        if let Some(body) = body {
            self.check_body(body)?;
        }
        Ok(())
    }

    fn resolve_property(&mut self, prop: NodeId) -> SemaResult<()> {
        let (ty, value) = match self.ast.kind(prop) {
            NodeKind::Property(p) => (p.ty, p.value),
            _ => (None, None),
        };
        if let Some(ty) = ty {
            self.check_type_expr(ty)?;
        }
        if let Some(value) = value {
            self.check_expr(value)?;
        }
        self.value_type(prop)?;
        Ok(())
    }

    pub(crate) fn check_body(&mut self, body: NodeId) -> SemaResult<()> {
        let stmts: Vec<NodeId> = self.ast.list(Some(body)).to_vec();
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        Ok(())
    }

    fn check_stmt(&mut self, stmt: NodeId) -> SemaResult<()> {
        match self.ast.kind(stmt) {
            NodeKind::Var(v) => {
                let (ty, init) = (v.ty, v.init);
                if let Some(ty) = ty {
                    self.check_type_expr(ty)?;
                }
                if let Some(init) = init {
                    self.check_expr(init)?;
                }
                self.value_type(stmt)?;
                Ok(())
            }
            NodeKind::For(f) => {
                let (init, cond, step, body) = (f.init, f.cond, f.step, f.body);
                if let Some(init) = init {
                    self.check_stmt(init)?;
                }
                if let Some(cond) = cond {
                    self.check_expr(cond)?;
                }
                if let Some(step) = step {
                    self.check_expr(step)?;
                }
                self.check_body(body)
            }
            NodeKind::ForIn(f) => {
                let (binding, iterable, body) = (f.binding, f.iterable, f.body);
                self.check_stmt(binding)?;
                self.check_expr(iterable)?;
                self.check_body(body)
            }
            NodeKind::Try(t) => {
                let (body, catches) = (t.body, t.catches.clone());
                self.check_body(body)?;
                for catch in catches {
                    let (params, body) = match self.ast.kind(catch) {
                        NodeKind::Catch(c) => (c.params, c.body),
                        _ => continue,
                    };
                    self.resolve_params(params)?;
                    self.check_body(body)?;
                }
                Ok(())
            }
            NodeKind::Body(_) => self.check_body(stmt),
            _ => self.check_expr(stmt),
        }
    }

    /// Resolve an expression and require at least one candidate.
    pub(crate) fn check_expr(&mut self, node: NodeId) -> SemaResult<()> {
        let candidates = self.resolve_expr(node)?;
        if candidates.is_empty() {
            let span = self.ast.span(node);
            let name = self.describe(node);
            return Err(self.report(
                SemanticError::ReferenceNotFound {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }
        Ok(())
    }

    /// Resolve a type expression and require it to denote something.
    pub(crate) fn check_type_expr(&mut self, ty: NodeId) -> SemaResult<()> {
        self.check_expr(ty)
    }
}
