// src/sema/output.rs
//! Side tables produced by analysis.
//!
//! The analyzer never mutates node payloads; everything later phases need
//! is keyed by [`NodeId`] here. This is the durable output contract handed
//! to code generation.

use crate::frontend::NodeId;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// One resolution result: the declaration an expression denotes, and
/// whether the expression denotes an instance of it rather than the
/// declaration itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub decl: NodeId,
    pub instance: bool,
}

impl Resolved {
    pub fn decl(decl: NodeId) -> Self {
        Self {
            decl,
            instance: false,
        }
    }

    pub fn instance(decl: NodeId) -> Self {
        Self {
            decl,
            instance: true,
        }
    }
}

/// Candidate set for one reference. More than one entry is an overload set
/// awaiting disambiguation by generic/parameter shape.
pub type Candidates = SmallVec<[Resolved; 2]>;

/// All resolution results for one analysis run.
#[derive(Debug, Default)]
pub struct Resolutions {
    /// Resolved declaration(s) per reference expression.
    pub targets: FxHashMap<NodeId, Candidates>,
    /// Resolved base class per Heritage node. Write-once.
    heritage_targets: FxHashMap<NodeId, NodeId>,
    /// Memoized declared/inferred type per Var/Entity/Property/Parameter.
    pub value_types: FxHashMap<NodeId, Resolved>,
    /// Expressions denoting freshly constructed values.
    pub instances: FxHashSet<NodeId>,
    /// The one `Main`-annotated function, once discovered.
    pub main_function: Option<NodeId>,
}

impl Resolutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets_of(&self, node: NodeId) -> &[Resolved] {
        self.targets.get(&node).map_or(&[], |c| c.as_slice())
    }

    pub fn heritage_target(&self, heritage: NodeId) -> Option<NodeId> {
        self.heritage_targets.get(&heritage).copied()
    }

    /// Cache a heritage's resolved base. The target is computed at most once
    /// per Heritage node; a second write must agree with the first.
    pub fn set_heritage_target(&mut self, heritage: NodeId, class: NodeId) {
        let prior = self.heritage_targets.insert(heritage, class);
        debug_assert!(prior.is_none() || prior == Some(class));
    }

    pub fn heritage_target_count(&self) -> usize {
        self.heritage_targets.len()
    }
}
