// src/sema/heritage.rs
//! The inheritance projector.
//!
//! Heritage targets resolve exactly once per Heritage node and are cached in
//! the side tables; every chain traversal runs over an explicit work-list
//! with a visited set, so diamond graphs are walked once and cycles become
//! diagnostics instead of non-termination.

use crate::errors::SemanticError;
use crate::frontend::{NodeId, NodeKind};
use crate::sema::analyzer::{Analyzer, Reported, SemaResult};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Work-list entries kept inline for shallow chains.
type Pending = SmallVec<[NodeId; 4]>;

impl<'a> Analyzer<'a> {
    /// The class a Heritage node names. Resolved on first use, cached, and
    /// never re-derived; a second call reuses the cached target.
    pub(crate) fn heritage_target(&mut self, heritage: NodeId) -> SemaResult<NodeId> {
        if let Some(target) = self.resolutions.heritage_target(heritage) {
            return Ok(target);
        }

        let ty = match self.ast.kind(heritage) {
            NodeKind::Heritage(h) => h.ty,
            _ => return Err(Reported),
        };

        if self.heritage_stack.contains(&heritage) {
            let span = self.ast.span(heritage);
            let name = self.describe(ty);
            return Err(self.report(
                SemanticError::HeritageCycle {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }
        self.heritage_stack.push(heritage);
        let resolved = self.resolve_expr(ty);
        self.heritage_stack.pop();
        let candidates = resolved?;
        let span = self.ast.span(ty);
        if candidates.is_empty() {
            let name = self.describe(ty);
            return Err(self.report(
                SemanticError::ReferenceNotFound {
                    name,
                    span: span.into(),
                },
                span,
            ));
        }

        let class = candidates
            .iter()
            .find(|c| matches!(self.ast.kind(c.decl), NodeKind::Class(_)))
            .map(|c| c.decl);
        let Some(class) = class else {
            let name = self.describe(ty);
            return Err(self.report(
                SemanticError::HeritageNotClass {
                    name,
                    span: span.into(),
                },
                span,
            ));
        };

        self.resolutions.set_heritage_target(heritage, class);
        Ok(class)
    }

    /// Drive `visit` over every base class of `root`, depth-first through an
    /// explicit work-list. `visit` returns true to stop early (found what it
    /// was looking for). Re-reaching `root` reports an inheritance cycle;
    /// re-reaching any other base (a diamond) is skipped silently.
    pub(crate) fn walk_heritage_chain(
        &mut self,
        root: NodeId,
        mut visit: impl FnMut(&mut Self, NodeId) -> SemaResult<bool>,
    ) -> SemaResult<()> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        visited.insert(root);

        let mut pending = self.heritages_of(root);
        while let Some(heritage) = pending.pop() {
            let target = self.heritage_target(heritage)?;
            if target == root {
                let span = self.ast.span(heritage);
                let name = self
                    .ast
                    .decl_name(target)
                    .map(|s| self.name_str(s))
                    .unwrap_or_default();
                return Err(self.report(
                    SemanticError::HeritageCycle {
                        name,
                        span: span.into(),
                    },
                    span,
                ));
            }
            if !visited.insert(target) {
                continue;
            }
            if visit(self, target)? {
                return Ok(());
            }
            pending.extend(self.heritages_of(target));
        }
        Ok(())
    }

    /// Heritage nodes of a class, reversed so popping the work-list visits
    /// them in declaration order.
    fn heritages_of(&self, class: NodeId) -> Pending {
        let heritages = self.ast.as_class(class).and_then(|c| c.heritages);
        self.ast.list(heritages).iter().rev().copied().collect()
    }

    /// Resolve the full chain of `class`, forcing every heritage target and
    /// surfacing cycle diagnostics even when nothing is being looked up.
    pub(crate) fn check_heritage_chain(&mut self, class: NodeId) -> SemaResult<()> {
        self.walk_heritage_chain(class, |_, _| Ok(false))
    }

    /// Whether `sub` is `base` or inherits from it, directly or through any
    /// number of intermediate classes.
    pub(crate) fn is_subclass_of(&mut self, sub: NodeId, base: NodeId) -> SemaResult<bool> {
        if sub == base {
            return Ok(true);
        }
        if self.ast.as_class(sub).is_none() {
            return Ok(false);
        }
        let mut found = false;
        self.walk_heritage_chain(sub, |_, target| {
            found = target == base;
            Ok(found)
        })?;
        Ok(found)
    }

    /// Invariant class equivalence: each is a subclass of the other, which
    /// holds only for the same declaration or a degenerate cycle (already a
    /// diagnostic by then).
    pub(crate) fn same_class(&mut self, a: NodeId, b: NodeId) -> SemaResult<bool> {
        Ok(self.is_subclass_of(a, b)? && self.is_subclass_of(b, a)?)
    }
}
