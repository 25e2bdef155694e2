// src/frontend/mod.rs
//! AST data model for the Marten language.
//!
//! Lexing and parsing live upstream; this module defines the arena-backed
//! tree they produce and the allocation helpers used to build it.

pub mod ast;
pub mod build;
pub mod intern;
pub mod span;

pub use ast::{Ast, Modifiers, NodeId, NodeKind, Symbol, VarKeys};
pub use build::{AstBuilder, ClassParts, FunctionParts};
pub use intern::Interner;
pub use span::Span;
