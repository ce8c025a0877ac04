use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{OperationError, RegistryError};

// ---------------------------------------------------------------------------
// Keyed trait
// ---------------------------------------------------------------------------

/// A behavior that reports its own registry key.
///
/// The key is self-describing: the registry never assigns one.
pub trait Keyed: Send + Sync {
    /// Returns the unique key of this behavior (e.g., `"claims"`, `"EMAIL_CAMPAIGN"`).
    fn key(&self) -> &str;
}

// ---------------------------------------------------------------------------
// StrategyRegistry
// ---------------------------------------------------------------------------

/// Registry of interchangeable behaviors selected by a string key.
///
/// Built once at startup from an explicit list and read-only afterwards, so
/// lookups need no synchronization. Registration order is preserved for
/// listing and for applicability scans.
pub struct StrategyRegistry<S: ?Sized + Keyed> {
    /// Key-based lookup: key -> index into `ordered`.
    by_key: HashMap<String, usize>,
    /// Registration order.
    ordered: Vec<Arc<S>>,
}

impl<S: ?Sized + Keyed> StrategyRegistry<S> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_key: HashMap::new(),
            ordered: Vec::new(),
        }
    }

    /// Builds a registry from an explicit startup list.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if two strategies report the same key.
    pub fn from_strategies(
        strategies: impl IntoIterator<Item = Arc<S>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for strategy in strategies {
            registry.register(strategy)?;
        }
        Ok(registry)
    }

    /// Register a strategy under the key it reports.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKey`] if the key is already taken.
    pub fn register(&mut self, strategy: Arc<S>) -> Result<(), RegistryError> {
        let key = strategy.key().to_string();
        if self.by_key.contains_key(&key) {
            return Err(RegistryError::DuplicateKey { key });
        }
        self.by_key.insert(key, self.ordered.len());
        self.ordered.push(strategy);
        Ok(())
    }

    /// Resolve a strategy by exact, case-sensitive key.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::UnsupportedType`] if no strategy has that key.
    pub fn resolve(&self, key: &str) -> Result<Arc<S>, OperationError> {
        self.by_key
            .get(key)
            .map(|&idx| Arc::clone(&self.ordered[idx]))
            .ok_or_else(|| OperationError::UnsupportedType(key.to_string()))
    }

    /// Keys in registration order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.ordered.iter().map(|s| s.key().to_string()).collect()
    }

    /// Iterate strategies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<S>> {
        self.ordered.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl<S: ?Sized + Keyed> Default for StrategyRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
