// 🗂️ Identifier Registry - uniqueness of keys among same-typed entities
//
// The registry is an explicit object handed to constructors, never global state.
// Cloning the handle shares the same underlying set, so one registry can be passed
// to every constructor of a family while tests create fresh ones at will.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone)]
pub struct IdRegistry<K> {
    used: Arc<RwLock<HashSet<K>>>,
}

impl<K: Eq + Hash + Clone + Debug> IdRegistry<K> {
    pub fn new() -> Self {
        IdRegistry {
            used: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Claim a key. Returns false (and changes nothing) if it is already taken.
    pub fn claim(&self, key: K) -> bool {
        let mut used = self.used.write().unwrap_or_else(PoisonError::into_inner);
        let inserted = used.insert(key.clone());
        if !inserted {
            tracing::debug!(?key, "registry key already claimed");
        }
        inserted
    }

    pub fn contains(&self, key: &K) -> bool {
        self.used
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    /// Give a key back so it can be claimed again
    pub fn release(&self, key: &K) -> bool {
        self.used
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    pub fn len(&self) -> usize {
        self.used.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every key
    pub fn clear(&self) {
        self.used.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl<K: Eq + Hash + Clone + Debug> Default for IdRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_is_unique() {
        let registry = IdRegistry::new();

        assert!(registry.claim(1_u32));
        assert!(!registry.claim(1_u32));
        assert!(registry.claim(2_u32));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let registry: IdRegistry<String> = IdRegistry::new();
        let handle = registry.clone();

        assert!(handle.claim("AB123CD".to_string()));
        assert!(registry.contains(&"AB123CD".to_string()));
        assert!(!registry.claim("AB123CD".to_string()));
    }

    #[test]
    fn test_separate_registries_are_isolated() {
        let first = IdRegistry::new();
        let second = IdRegistry::new();

        assert!(first.claim(7_u32));
        assert!(second.claim(7_u32));
    }

    #[test]
    fn test_release_and_clear() {
        let registry = IdRegistry::new();
        registry.claim(1_u32);
        registry.claim(2_u32);

        assert!(registry.release(&1));
        assert!(!registry.release(&1));
        assert!(registry.claim(1));

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_claim_from_threads() {
        let registry: IdRegistry<u32> = IdRegistry::new();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || (0..100).filter(|k| registry.claim(*k)).count())
            })
            .collect();

        let claimed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(claimed, 100);
        assert_eq!(registry.len(), 100);
    }
}
