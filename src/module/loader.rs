// src/module/loader.rs
//! Module loading for `using` imports.
//!
//! Handles:
//! - the seam to the driver that materializes a module AST for a path
//! - load-once caching by import path
//! - circular import detection
//!
//! A loaded module is never mutated after population; every later `using`
//! of the same path reuses the first-loaded tree.

use crate::frontend::{Ast, Interner, NodeId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NotFound(String),
    CircularImport(String),
    InvalidPath(String),
    Failed(String),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::NotFound(path) => write!(f, "module not found: {}", path),
            LoadError::CircularImport(path) => write!(f, "circular import detected: {}", path),
            LoadError::InvalidPath(path) => write!(f, "invalid import path: {}", path),
            LoadError::Failed(msg) => write!(f, "failed to load module: {}", msg),
        }
    }
}

/// The driver-supplied collaborator that turns an import path into a module
/// tree inside the shared arena. Implementations typically read and parse a
/// source file; tests register pre-built trees.
pub trait ModuleSource {
    fn load(
        &mut self,
        path: &str,
        ast: &mut Ast,
        interner: &mut Interner,
    ) -> Result<NodeId, LoadError>;
}

/// A [`ModuleSource`] over modules that were materialized up front.
#[derive(Debug, Default)]
pub struct ProvidedModules {
    modules: FxHashMap<String, NodeId>,
}

impl ProvidedModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, module: NodeId) {
        self.modules.insert(path.to_string(), module);
    }
}

impl ModuleSource for ProvidedModules {
    fn load(
        &mut self,
        path: &str,
        _ast: &mut Ast,
        _interner: &mut Interner,
    ) -> Result<NodeId, LoadError> {
        self.modules
            .get(path)
            .copied()
            .ok_or_else(|| LoadError::NotFound(path.to_string()))
    }
}

/// Load-once module registry with cycle detection.
#[derive(Debug, Default)]
pub struct ModuleMap {
    cache: FxHashMap<String, NodeId>,
    /// Stack of import paths currently being loaded.
    loading: Vec<String>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.cache.get(path).copied()
    }

    /// Register a module that was analyzed directly rather than imported.
    pub fn insert(&mut self, path: &str, module: NodeId) {
        self.cache.insert(path.to_string(), module);
    }

    pub fn load(
        &mut self,
        source: &mut dyn ModuleSource,
        path: &str,
        ast: &mut Ast,
        interner: &mut Interner,
    ) -> Result<NodeId, LoadError> {
        if let Some(cached) = self.cache.get(path) {
            return Ok(*cached);
        }

        if self.loading.iter().any(|p| p == path) {
            return Err(LoadError::CircularImport(path.to_string()));
        }

        self.loading.push(path.to_string());
        let loaded = source.load(path, ast, interner);
        self.loading.pop();

        let module = loaded?;
        self.cache.insert(path.to_string(), module);
        Ok(module)
    }
}
