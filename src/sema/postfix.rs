// src/sema/postfix.rs
//! Postfix chain resolution: attribute access, calls, indexing, and generic
//! instantiation.
//!
//! A compound reference resolves its base first, then projects into each
//! base candidate according to what it declared. Results are recorded in
//! the side tables as they are produced, so repeated resolution of the same
//! node is cheap and deterministic.

use crate::errors::SemanticError;
use crate::frontend::{NodeId, NodeKind, Symbol};
use crate::sema::analyzer::{Analyzer, SemaResult};
use crate::sema::member::Visibility;
use crate::sema::output::{Candidates, Resolved};
use smallvec::smallvec;

impl<'a> Analyzer<'a> {
    /// Resolve a reference expression to the set of declarations it denotes.
    ///
    /// An empty set is "not found" and is reported by the caller; a fault in
    /// a sub-expression has already been reported and propagates as `Err`.
    pub fn resolve_expr(&mut self, node: NodeId) -> SemaResult<Candidates> {
        let candidates = self.resolve_expr_inner(node)?;
        if !candidates.is_empty() {
            self.resolutions.targets.insert(node, candidates.clone());
        }
        Ok(candidates)
    }

    fn resolve_expr_inner(&mut self, node: NodeId) -> SemaResult<Candidates> {
        match self.ast.kind(node) {
            NodeKind::Ident(sym) => {
                let name = *sym;
                self.resolve_name(node, name)
            }
            // Literals denote themselves; their structure is not this
            // phase's concern.
            NodeKind::Int(_)
            | NodeKind::Float(_)
            | NodeKind::Char(_)
            | NodeKind::Str(_)
            | NodeKind::Null
            | NodeKind::Array(_)
            | NodeKind::Dict(_) => Ok(smallvec![Resolved::instance(node)]),
            NodeKind::Attribute(a) => {
                let (base, name) = (a.base, a.name);
                self.resolve_attribute(base, name)
            }
            NodeKind::Call(c) => {
                let (callee, args) = (c.callee, c.args);
                self.resolve_call(node, callee, args)
            }
            NodeKind::Index(i) => {
                let (base, args) = (i.base, i.args);
                self.resolve_index(base, args)
            }
            NodeKind::Pseudonym(p) => {
                let (base, fields) = (p.base, p.fields);
                self.resolve_pseudonym(base, fields)
            }
            _ => Ok(Candidates::new()),
        }
    }

    /// Resolve the base of a compound expression, reporting when it denotes
    /// nothing — a dead base makes the whole chain unresolvable.
    fn resolve_base(&mut self, base: NodeId) -> SemaResult<Candidates> {
        let candidates = self.resolve_expr(base)?;
        if candidates.is_empty() {
            let span = self.ast.span(base);
            let name = self.describe(base);
            return Err(self.report(
                SemanticError::ReferenceNotFound {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }
        Ok(candidates)
    }

    // --- attribute access ---

    fn resolve_attribute(&mut self, base: NodeId, name: Symbol) -> SemaResult<Candidates> {
        let base_candidates = self.resolve_base(base)?;
        let mut out = Candidates::new();

        for cand in base_candidates {
            match self.ast.kind(cand.decl) {
                NodeKind::Enum(_) => {
                    // Attribute access into an enum never falls through to
                    // outer scope: a miss is simply no candidate.
                    let variants = self
                        .ast
                        .as_enum(cand.decl)
                        .map(|e| e.variants.clone())
                        .unwrap_or_default();
                    for v in variants {
                        if self.ast.decl_name(v) == Some(name) {
                            out.push(Resolved::instance(v));
                            break;
                        }
                    }
                }
                NodeKind::Class(_) => {
                    let vis = Visibility {
                        inside: false,
                        instance: cand.instance,
                    };
                    self.project_member(cand.decl, name, vis, &mut out)?;
                }
                NodeKind::Heritage(_) => {
                    let target = self.heritage_target(cand.decl)?;
                    let vis = Visibility {
                        inside: true,
                        instance: cand.instance,
                    };
                    self.project_member(target, name, vis, &mut out)?;
                }
                NodeKind::Var(_)
                | NodeKind::Entity(_)
                | NodeKind::Parameter(_)
                | NodeKind::Property(_) => {
                    // The value's resolved type stands in for the base.
                    if let Some(ty) = self.value_type(cand.decl)? {
                        match self.ast.kind(ty.decl) {
                            NodeKind::Class(_) => {
                                let vis = Visibility {
                                    inside: false,
                                    instance: true,
                                };
                                self.project_member(ty.decl, name, vis, &mut out)?;
                            }
                            NodeKind::Enum(_) => {
                                let variants = self
                                    .ast
                                    .as_enum(ty.decl)
                                    .map(|e| e.variants.clone())
                                    .unwrap_or_default();
                                for v in variants {
                                    if self.ast.decl_name(v) == Some(name) {
                                        out.push(Resolved::instance(v));
                                        break;
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                NodeKind::Package(_) => {
                    let path = match self.ast.kind(cand.decl) {
                        NodeKind::Package(p) => p.path.clone(),
                        _ => continue,
                    };
                    if let Some(imported) = self.modules.get(&path) {
                        self.search_exports(imported, name, &mut out);
                    }
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Project `name` out of a class: direct members first, then the
    /// inherited chain.
    pub(crate) fn project_member(
        &mut self,
        class: NodeId,
        name: Symbol,
        vis: Visibility,
        out: &mut Candidates,
    ) -> SemaResult<()> {
        let members = self
            .ast
            .as_class(class)
            .map(|c| c.members.clone())
            .unwrap_or_default();
        let before = out.len();
        self.search_members(&members, name, vis, out);
        if out.len() > before {
            return Ok(());
        }
        self.search_inherited(class, name, vis, out)
    }

    // --- calls ---

    fn resolve_call(&mut self, call: NodeId, callee: NodeId, args: NodeId) -> SemaResult<Candidates> {
        let callee_candidates = self.resolve_base(callee)?;
        let arg_ids: Vec<NodeId> = self.ast.list(Some(args)).to_vec();

        let mut out = Candidates::new();
        let mut callable = false;
        let mut class_seen = false;
        let mut constructor_seen = false;

        for cand in callee_candidates {
            match self.ast.kind(cand.decl) {
                NodeKind::Class(_) if !cand.instance => {
                    callable = true;
                    class_seen = true;
                    if self.match_constructor(cand.decl, &arg_ids, &mut constructor_seen)? {
                        out.push(Resolved::instance(cand.decl));
                        self.resolutions.instances.insert(call);
                    }
                }
                NodeKind::Function(_) => {
                    callable = true;
                    if let Some(resolved) = self.match_function(cand.decl, &arg_ids)? {
                        out.push(resolved);
                    }
                }
                NodeKind::Heritage(_) => {
                    callable = true;
                    class_seen = true;
                    let target = self.heritage_target(cand.decl)?;
                    if self.match_constructor(target, &arg_ids, &mut constructor_seen)? {
                        out.push(Resolved::instance(target));
                        self.resolutions.instances.insert(call);
                    }
                }
                NodeKind::Var(_)
                | NodeKind::Entity(_)
                | NodeKind::Parameter(_)
                | NodeKind::Property(_) => {
                    // A value holding a callable: match through its type.
                    if let Some(ty) = self.value_type(cand.decl)? {
                        if matches!(self.ast.kind(ty.decl), NodeKind::Function(_)) {
                            callable = true;
                            if let Some(resolved) = self.match_function(ty.decl, &arg_ids)? {
                                out.push(resolved);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        if out.is_empty() {
            let span = self.ast.span(call);
            let name = self.describe(callee);
            let error = if !callable {
                SemanticError::NotCallable {
                    name,
                    span: span.into(),
                }
            } else if class_seen && !constructor_seen {
                SemanticError::MissingConstructor {
                    name,
                    span: span.into(),
                }
            } else {
                SemanticError::NoMatchingSignature {
                    name,
                    span: span.into(),
                }
            };
            return Err(self.report(error, span));
        }
        Ok(out)
    }

    /// Match a class's constructors against a call. `seen` records whether
    /// any constructor existed at all, distinguishing "no constructor" from
    /// "no matching signature".
    fn match_constructor(
        &mut self,
        class: NodeId,
        args: &[NodeId],
        seen: &mut bool,
    ) -> SemaResult<bool> {
        let ctor_name = self.known.constructor;
        let mut ctors = Candidates::new();
        let vis = Visibility {
            inside: false,
            instance: true,
        };
        self.project_member(class, ctor_name, vis, &mut ctors)?;

        for ctor in ctors {
            let params = match self.ast.kind(ctor.decl) {
                NodeKind::Function(f) => f.params,
                _ => continue,
            };
            *seen = true;
            if self.params_accept_args(params, args)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Match a function against a call; on success the call denotes the
    /// declared result type (or the function itself when it has none).
    fn match_function(&mut self, func: NodeId, args: &[NodeId]) -> SemaResult<Option<Resolved>> {
        let (params, result) = match self.ast.kind(func) {
            NodeKind::Function(f) => (f.params, f.result),
            _ => return Ok(None),
        };
        if !self.params_accept_args(params, args)? {
            return Ok(None);
        }
        let Some(result) = result else {
            return Ok(Some(Resolved::decl(func)));
        };
        let result_candidates = self.resolve_base(result)?;
        let ty = result_candidates
            .iter()
            .find(|c| matches!(self.ast.kind(c.decl), NodeKind::Class(_) | NodeKind::Enum(_)))
            .map(|c| c.decl)
            .unwrap_or(result_candidates[0].decl);
        Ok(Some(Resolved::instance(ty)))
    }

    // --- indexing ---

    fn resolve_index(&mut self, base: NodeId, args: NodeId) -> SemaResult<Candidates> {
        let base_candidates = self.resolve_base(base)?;
        let arg_ids: Vec<NodeId> = self.ast.list(Some(args)).to_vec();
        let index_name = self.known.index_op;

        let mut out = Candidates::new();
        for cand in base_candidates {
            // Indexing needs an instance of a class with a `[]` member.
            let class = match self.ast.kind(cand.decl) {
                NodeKind::Class(_) if cand.instance => Some(cand.decl),
                NodeKind::Var(_)
                | NodeKind::Entity(_)
                | NodeKind::Parameter(_)
                | NodeKind::Property(_) => self
                    .value_type(cand.decl)?
                    .filter(|ty| matches!(self.ast.kind(ty.decl), NodeKind::Class(_)))
                    .map(|ty| ty.decl),
                _ => None,
            };
            let Some(class) = class else { continue };

            let mut operators = Candidates::new();
            let vis = Visibility {
                inside: false,
                instance: true,
            };
            self.project_member(class, index_name, vis, &mut operators)?;
            for op in operators {
                if let Some(resolved) = self.match_function(op.decl, &arg_ids)? {
                    out.push(resolved);
                    break;
                }
            }
        }

        if out.is_empty() {
            let span = self.ast.span(base);
            let name = self.describe(base);
            return Err(self.report(
                SemanticError::NotIndexable {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }
        Ok(out)
    }

    // --- generic instantiation ---

    fn resolve_pseudonym(&mut self, base: NodeId, fields: NodeId) -> SemaResult<Candidates> {
        self.check_field_keys(fields)?;
        let base_candidates = self.resolve_base(base)?;
        let field_ids: Vec<NodeId> = self.ast.list(Some(fields)).to_vec();

        let mut out = Candidates::new();
        for cand in base_candidates {
            let generics = match self.ast.kind(cand.decl) {
                NodeKind::Class(c) => c.generics,
                NodeKind::Package(p) => p.generics,
                _ => continue,
            };
            if self.generics_accept_fields(generics, &field_ids)? {
                out.push(Resolved {
                    decl: cand.decl,
                    instance: cand.instance,
                });
            }
        }

        if out.is_empty() {
            let span = self.ast.span(base);
            let name = self.describe(base);
            return Err(self.report(
                SemanticError::GenericMismatch {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }
        Ok(out)
    }

    /// Reject duplicate named keys in a Fields list.
    fn check_field_keys(&mut self, fields: NodeId) -> SemaResult<()> {
        let field_ids: Vec<NodeId> = self.ast.list(Some(fields)).to_vec();
        let mut seen: Vec<(Symbol, NodeId)> = Vec::new();
        for f in field_ids {
            let key = match self.ast.kind(f) {
                NodeKind::Field(field) => field.key,
                _ => None,
            };
            let Some(key) = key else { continue };
            if let Some(&(_, previous)) = seen.iter().find(|(k, _)| *k == key) {
                let span = self.ast.span(f);
                let prev_span = self.ast.span(previous);
                let key = self.name_str(key);
                return Err(self.report(
                    SemanticError::DuplicateFieldKey {
                        key,
                        span: span.into(),
                        previous: prev_span.into(),
                    },
                    span,
                ));
            }
            seen.push((key, f));
        }
        Ok(())
    }

    // --- value types ---

    /// The class or enum a value declaration is typed as, memoized per
    /// declaration. Derived from the declared type when present, otherwise
    /// inferred from the initializer's resolution.
    pub(crate) fn value_type(&mut self, decl: NodeId) -> SemaResult<Option<Resolved>> {
        if let Some(&cached) = self.resolutions.value_types.get(&decl) {
            return Ok(Some(cached));
        }
        if self.value_type_stack.contains(&decl) {
            return Ok(None);
        }
        self.value_type_stack.push(decl);
        let resolved = self.value_type_uncached(decl);
        self.value_type_stack.pop();
        resolved
    }

    fn value_type_uncached(&mut self, decl: NodeId) -> SemaResult<Option<Resolved>> {
        let (ty, init) = match self.ast.kind(decl) {
            NodeKind::Var(v) => (v.ty, v.init),
            NodeKind::Parameter(p) => (p.ty, p.default),
            NodeKind::Property(p) => (p.ty, p.value),
            NodeKind::Entity(_) => (None, None),
            _ => (None, None),
        };

        let Some(source) = ty.or(init) else {
            return Ok(None);
        };

        let candidates = self.resolve_expr(source)?;
        let resolved = candidates
            .iter()
            .find(|c| {
                matches!(
                    self.ast.kind(c.decl),
                    NodeKind::Class(_) | NodeKind::Enum(_) | NodeKind::Function(_)
                )
            })
            .map(|c| Resolved::instance(c.decl));

        if let Some(resolved) = resolved {
            self.resolutions.value_types.insert(decl, resolved);
        }
        Ok(resolved)
    }
}
