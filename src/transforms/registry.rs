//! Transform registry
//!
//! Holds the available transform definitions keyed by kind name. The driver
//! resolves persisted pipeline entries against it at run start; unknown
//! kinds are dropped from the active set.

use super::{builtin, TransformDefinition};
use std::collections::HashMap;
use std::sync::Arc;

pub struct TransformRegistry {
    definitions: HashMap<&'static str, Arc<dyn TransformDefinition>>,
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Registry preloaded with the stock catalog
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        builtin::register_builtin(&mut registry);
        registry
    }

    pub fn register(&mut self, definition: impl TransformDefinition + 'static) {
        self.definitions.insert(definition.kind(), Arc::new(definition));
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn TransformDefinition>> {
        self.definitions.get(kind).cloned()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.definitions.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.keys().copied()
    }
}
