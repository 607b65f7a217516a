//! Modifier registry
//!
//! Provides [`ModifierRegistry`] for looking up modifiers by tag name.

use super::{After, Around, Augment, Before, Modifier, Static};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Registry of available modifiers
///
/// No namespacing: a name maps to exactly one modifier and the last
/// registration for a name wins.
#[derive(Default)]
pub struct ModifierRegistry {
    modifiers: RwLock<IndexMap<String, Arc<dyn Modifier>>>,
}

impl ModifierRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create registry with built-in modifiers
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("before", Before);
        registry.register("after", After);
        registry.register("around", Around);
        registry.register("augment", Augment);
        registry.register("static", Static);
        registry
    }

    /// Register a modifier, returning the one it replaced
    pub fn register(
        &self,
        name: &str,
        modifier: impl Modifier + 'static,
    ) -> Option<Arc<dyn Modifier>> {
        self.modifiers
            .write()
            .insert(name.to_string(), Arc::new(modifier))
    }

    /// Get modifier by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Modifier>> {
        self.modifiers.read().get(name).cloned()
    }

    /// Check if modifier exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.read().contains_key(name)
    }

    /// List registered names in registration order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.modifiers.read().keys().cloned().collect()
    }

    /// Get number of registered modifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifiers.read().len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.read().is_empty()
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModifierRegistry")
            .field("names", &self.names())
            .finish()
    }
}
