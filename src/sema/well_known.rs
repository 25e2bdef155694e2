// src/sema/well_known.rs
//! Names with language-level meaning, interned once per analysis.

use crate::frontend::{Interner, Symbol};

#[derive(Debug, Clone, Copy)]
pub struct WellKnown {
    /// Constructor member of a class.
    pub constructor: Symbol,
    /// Entry-point function annotation.
    pub main: Symbol,
    /// Entry class located by `finalize`.
    pub system: Symbol,
    /// Indexing operator member.
    pub index_op: Symbol,
}

impl WellKnown {
    pub fn intern(interner: &mut Interner) -> Self {
        Self {
            constructor: interner.intern("Constructor"),
            main: interner.intern("Main"),
            system: interner.intern("System"),
            index_op: interner.intern("[]"),
        }
    }
}
