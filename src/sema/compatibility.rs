// src/sema/compatibility.rs
//! Structural list comparison: generics against generics, parameters
//! against parameters, parameters against call arguments, and generics
//! against instantiation fields.
//!
//! Each comparator answers "do these lists fit together" — `Ok(false)` is a
//! plain mismatch the caller may tolerate (overload selection tries the next
//! candidate), `Err` means a diagnostic was already reported and the match
//! attempt is over.

use crate::errors::SemanticError;
use crate::frontend::{NodeId, NodeKind, Symbol};
use crate::sema::analyzer::{Analyzer, SemaResult};

impl<'a> Analyzer<'a> {
    // --- generics vs generics ---

    /// Whether two generic-parameter lists declare the same shape: every
    /// parameter pairs up positionally (or by name when positions disagree)
    /// with a compatible bound, and anything unpaired has a default.
    ///
    /// An absent list equals a defaults-only list, so `<T = Int>` collides
    /// with an unparameterized declaration while `<T>` does not.
    pub(crate) fn generics_equal_generics(
        &mut self,
        a: Option<NodeId>,
        b: Option<NodeId>,
    ) -> SemaResult<bool> {
        let a_items: Vec<NodeId> = self.ast.list(a).to_vec();
        let b_items: Vec<NodeId> = self.ast.list(b).to_vec();
        self.lists_pair_up(&a_items, &b_items, Self::generic_bounds_compatible)
    }

    /// Whether two parameter lists declare the same signature, comparing
    /// resolved parameter types for identity rather than bound
    /// compatibility.
    pub(crate) fn params_equal_params(
        &mut self,
        a: Option<NodeId>,
        b: Option<NodeId>,
    ) -> SemaResult<bool> {
        let a_items: Vec<NodeId> = self.ast.list(a).to_vec();
        let b_items: Vec<NodeId> = self.ast.list(b).to_vec();
        self.lists_pair_up(&a_items, &b_items, Self::param_types_identical)
    }

    /// Shared pairing algorithm: positional first, by name for the
    /// leftovers, defaults for anything still unpaired.
    fn lists_pair_up(
        &mut self,
        a_items: &[NodeId],
        b_items: &[NodeId],
        mut compatible: impl FnMut(&mut Self, NodeId, NodeId) -> SemaResult<bool>,
    ) -> SemaResult<bool> {
        let mut a_paired = vec![false; a_items.len()];
        let mut b_paired = vec![false; b_items.len()];

        let common = a_items.len().min(b_items.len());
        for i in 0..common {
            if compatible(self, a_items[i], b_items[i])? {
                a_paired[i] = true;
                b_paired[i] = true;
            }
        }

        for (i, &a_item) in a_items.iter().enumerate() {
            if a_paired[i] {
                continue;
            }
            let a_name = self.ast.decl_name(a_item);
            for (j, &b_item) in b_items.iter().enumerate() {
                if b_paired[j] || self.ast.decl_name(b_item) != a_name {
                    continue;
                }
                if compatible(self, a_item, b_item)? {
                    a_paired[i] = true;
                    b_paired[j] = true;
                }
                break;
            }
        }

        for (i, &a_item) in a_items.iter().enumerate() {
            if !a_paired[i] && !self.has_default(a_item) {
                return Ok(false);
            }
        }
        for (j, &b_item) in b_items.iter().enumerate() {
            if !b_paired[j] && !self.has_default(b_item) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn has_default(&self, item: NodeId) -> bool {
        match self.ast.kind(item) {
            NodeKind::Generic(g) => g.default.is_some(),
            NodeKind::Parameter(p) => p.default.is_some(),
            _ => false,
        }
    }

    /// Generic bounds are compatible when both are absent or both resolve to
    /// the same class under mutual subtyping (invariance, not covariance).
    fn generic_bounds_compatible(&mut self, a: NodeId, b: NodeId) -> SemaResult<bool> {
        let a_bound = match self.ast.kind(a) {
            NodeKind::Generic(g) => g.bound,
            _ => None,
        };
        let b_bound = match self.ast.kind(b) {
            NodeKind::Generic(g) => g.bound,
            _ => None,
        };
        match (a_bound, b_bound) {
            (None, None) => Ok(true),
            (Some(a_ty), Some(b_ty)) => {
                let a_decl = self.required_type_decl(a_ty)?;
                let b_decl = self.required_type_decl(b_ty)?;
                self.same_class(a_decl, b_decl)
            }
            _ => Ok(false),
        }
    }

    /// Parameter types are identical when both are untyped or both resolve
    /// to the same declaration.
    fn param_types_identical(&mut self, a: NodeId, b: NodeId) -> SemaResult<bool> {
        let a_ty = match self.ast.kind(a) {
            NodeKind::Parameter(p) => p.ty,
            _ => None,
        };
        let b_ty = match self.ast.kind(b) {
            NodeKind::Parameter(p) => p.ty,
            _ => None,
        };
        match (a_ty, b_ty) {
            (None, None) => Ok(true),
            (Some(a_ty), Some(b_ty)) => {
                let a_decl = self.required_type_decl(a_ty)?;
                let b_decl = self.required_type_decl(b_ty)?;
                Ok(a_decl == b_decl)
            }
            _ => Ok(false),
        }
    }

    /// Resolve a type expression to the declaration it names, reporting a
    /// reference error when it names nothing.
    pub(crate) fn required_type_decl(&mut self, ty: NodeId) -> SemaResult<NodeId> {
        let candidates = self.resolve_expr(ty)?;
        if candidates.is_empty() {
            let span = self.ast.span(ty);
            let name = self.describe(ty);
            return Err(self.report(
                SemanticError::ReferenceNotFound {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }
        Ok(candidates[0].decl)
    }

    // --- parameters vs call arguments ---

    /// Whether a call's argument list satisfies a parameter list.
    ///
    /// Positional arguments fill parameters in order until the first named
    /// argument; after that every argument must be named. Unfilled
    /// parameters need defaults; surplus or unknown-named arguments sink the
    /// match. A positional argument after a named one is malformed and is
    /// reported rather than tolerated.
    pub(crate) fn params_accept_args(
        &mut self,
        params: Option<NodeId>,
        args: &[NodeId],
    ) -> SemaResult<bool> {
        let param_ids: Vec<NodeId> = self.ast.list(params).to_vec();
        let mut filled = vec![false; param_ids.len()];
        let mut next_positional = 0usize;
        let mut named_seen = false;

        for &arg in args {
            let key = match self.ast.kind(arg) {
                NodeKind::Argument(a) => a.key,
                NodeKind::Field(f) => f.key,
                _ => None,
            };
            match key {
                None => {
                    if named_seen {
                        let span = self.ast.span(arg);
                        return Err(self.report(
                            SemanticError::PositionalAfterNamed { span: span.into() },
                            span,
                        ));
                    }
                    if next_positional >= param_ids.len() {
                        return Ok(false);
                    }
                    filled[next_positional] = true;
                    next_positional += 1;
                }
                Some(key) => {
                    named_seen = true;
                    let Some(index) = self.find_by_name(&param_ids, key) else {
                        return Ok(false);
                    };
                    if filled[index] {
                        return Ok(false);
                    }
                    filled[index] = true;
                }
            }
        }

        for (i, &param) in param_ids.iter().enumerate() {
            if !filled[i] && !self.has_default(param) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // --- generics vs instantiation fields ---

    /// Whether an instantiation's field list satisfies a generic-parameter
    /// list. Same shape rules as arguments, but a field's type must be a
    /// subclass of the generic's bound rather than an exact match.
    pub(crate) fn generics_accept_fields(
        &mut self,
        generics: Option<NodeId>,
        fields: &[NodeId],
    ) -> SemaResult<bool> {
        let generic_ids: Vec<NodeId> = self.ast.list(generics).to_vec();
        let mut filled = vec![false; generic_ids.len()];
        let mut next_positional = 0usize;
        let mut named_seen = false;

        for &field in fields {
            let (key, value) = match self.ast.kind(field) {
                NodeKind::Field(f) => (f.key, f.value),
                _ => continue,
            };
            let index = match key {
                None => {
                    if named_seen {
                        let span = self.ast.span(field);
                        return Err(self.report(
                            SemanticError::PositionalAfterNamed { span: span.into() },
                            span,
                        ));
                    }
                    if next_positional >= generic_ids.len() {
                        return Ok(false);
                    }
                    let index = next_positional;
                    next_positional += 1;
                    index
                }
                Some(key) => {
                    named_seen = true;
                    let Some(index) = self.find_by_name(&generic_ids, key) else {
                        return Ok(false);
                    };
                    index
                }
            };
            if filled[index] {
                return Ok(false);
            }
            if !self.field_satisfies_bound(generic_ids[index], value)? {
                return Ok(false);
            }
            filled[index] = true;
        }

        for (i, &generic) in generic_ids.iter().enumerate() {
            if !filled[i] && !self.has_default(generic) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn field_satisfies_bound(&mut self, generic: NodeId, value: NodeId) -> SemaResult<bool> {
        let bound = match self.ast.kind(generic) {
            NodeKind::Generic(g) => g.bound,
            _ => None,
        };
        let Some(bound) = bound else {
            // Unbounded generics accept any type argument, but it must
            // still denote something.
            self.required_type_decl(value)?;
            return Ok(true);
        };
        let bound_decl = self.required_type_decl(bound)?;
        let value_decl = self.required_type_decl(value)?;
        self.is_subclass_of(value_decl, bound_decl)
    }

    fn find_by_name(&self, items: &[NodeId], name: Symbol) -> Option<usize> {
        items
            .iter()
            .position(|&item| self.ast.decl_name(item) == Some(name))
    }
}
