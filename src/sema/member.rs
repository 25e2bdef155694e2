// src/sema/member.rs
//! Member lookup shared by identifier resolution and attribute projection.
//!
//! One search routine serves every member kind; the callers differ only in
//! the visibility context they pass.

use crate::frontend::{Modifiers, NodeId, NodeKind, Symbol};
use crate::sema::analyzer::{Analyzer, SemaResult};
use crate::sema::output::{Candidates, Resolved};

/// Visibility context for a member search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Visibility {
    /// The lookup originates inside the class or reaches the member through
    /// its inheritance chain; protected members are visible.
    pub inside: bool,
    /// The base denotes an instance rather than the bare class. Without an
    /// instance, inherited non-static properties are inaccessible.
    pub instance: bool,
}

impl<'a> Analyzer<'a> {
    /// Scan a member list for `name`. Functions and classes accumulate
    /// (overload sets); an enum or property hit is unique and ends the scan.
    pub(crate) fn search_members(
        &self,
        members: &[NodeId],
        name: Symbol,
        vis: Visibility,
        out: &mut Candidates,
    ) {
        for &member in members {
            if self.ast.decl_name(member) != Some(name) {
                continue;
            }
            if self.ast.modifiers(member).contains(Modifiers::PROTECT) && !vis.inside {
                continue;
            }
            match self.ast.kind(member) {
                NodeKind::Function(_) | NodeKind::Class(_) => out.push(Resolved::decl(member)),
                NodeKind::Enum(_) => {
                    out.push(Resolved::decl(member));
                    return;
                }
                NodeKind::Property(_) => {
                    out.push(Resolved::instance(member));
                    return;
                }
                _ => {}
            }
        }
    }

    /// Scan the inherited chain of `class` for `name`.
    ///
    /// The chain is flattened depth-first through an explicit work-list so
    /// deep and diamond-shaped graphs cost no stack; a base reached twice is
    /// searched once, and reaching the starting class again is an
    /// inheritance cycle, reported as such.
    pub(crate) fn search_inherited(
        &mut self,
        class: NodeId,
        name: Symbol,
        vis: Visibility,
        out: &mut Candidates,
    ) -> SemaResult<()> {
        self.walk_heritage_chain(class, |this, base| {
            let members = this
                .ast
                .as_class(base)
                .map(|c| c.members.clone())
                .unwrap_or_default();
            this.search_members_inherited(&members, name, vis, out);
            Ok(!out.is_empty())
        })
    }

    /// Like [`search_members`], with the inherited-access restriction:
    /// without an instance, a non-static property found through the chain
    /// does not match (state needs an instance; functions and types do not).
    fn search_members_inherited(
        &self,
        members: &[NodeId],
        name: Symbol,
        vis: Visibility,
        out: &mut Candidates,
    ) {
        for &member in members {
            if self.ast.decl_name(member) != Some(name) {
                continue;
            }
            if self.ast.modifiers(member).contains(Modifiers::PROTECT) && !vis.inside {
                continue;
            }
            let is_static = self.ast.modifiers(member).contains(Modifiers::STATIC);
            match self.ast.kind(member) {
                NodeKind::Function(_) | NodeKind::Class(_) => out.push(Resolved::decl(member)),
                NodeKind::Enum(_) => {
                    out.push(Resolved::decl(member));
                    return;
                }
                NodeKind::Property(_) => {
                    if vis.instance || is_static {
                        out.push(Resolved::instance(member));
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}
