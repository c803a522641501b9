//! Memo of resolved effective attributes.
//!
//! Entries are keyed by note ID only and are valid for one graph snapshot.
//! Any mutation that can change inheritance clears the whole table: a single
//! template relation can affect arbitrarily many notes, and that fan-out is
//! not tracked.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Resolved attribute IDs (owned first, then ancestor-inherited, then
/// template-inherited) per note.
#[derive(Debug, Default)]
pub struct AttributeInheritanceCache {
    resolved: RwLock<HashMap<String, Arc<[String]>>>,
}

impl AttributeInheritanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, note_id: &str) -> Option<Arc<[String]>> {
        self.resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(note_id)
            .cloned()
    }

    pub(crate) fn insert(&self, note_id: &str, attribute_ids: Arc<[String]>) {
        self.resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(note_id.to_string(), attribute_ids);
    }

    /// Drops every memoized resolution.
    pub(crate) fn invalidate(&self) {
        let mut resolved = self.resolved.write().unwrap_or_else(PoisonError::into_inner);
        if !resolved.is_empty() {
            log::trace!("Invalidating {} memoized attribute resolutions", resolved.len());
            resolved.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.resolved.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_invalidate() {
        let cache = AttributeInheritanceCache::new();
        assert!(cache.get("n1").is_none());

        cache.insert("n1", Arc::from(vec!["a1".to_string(), "a2".to_string()]));
        assert_eq!(cache.get("n1").unwrap().len(), 2);
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.get("n1").is_none());
    }
}
