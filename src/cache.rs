//! Client-side cache hydration
//!
//! A thin snapshot store: enough to carry server-rendered state into a
//! freshly built client so that data fetched during render is readable
//! without a network round trip. Not a normalization layer.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Serialized cache snapshot, as produced by a server render
pub type CacheSnapshot = HashMap<String, Value>;

/// In-memory cache attached to a client instance
#[derive(Clone, Default)]
pub struct InMemoryCache {
    records: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate the cache from a prior snapshot
    pub fn restore(self, snapshot: CacheSnapshot) -> Self {
        {
            let mut records = self.records.write().unwrap();
            records.extend(snapshot);
        }
        self
    }

    /// Read a record by cache key
    pub fn read(&self, key: &str) -> Option<Value> {
        let records = self.records.read().unwrap();
        records.get(key).cloned()
    }

    /// Write a record
    pub fn write(&self, key: impl Into<String>, value: Value) {
        let mut records = self.records.write().unwrap();
        records.insert(key.into(), value);
    }

    /// Serialize the cache contents into a snapshot
    pub fn extract(&self) -> CacheSnapshot {
        let records = self.records.read().unwrap();
        records.clone()
    }

    /// Whether the cache holds no records
    pub fn is_empty(&self) -> bool {
        let records = self.records.read().unwrap();
        records.is_empty()
    }

    /// Drop all records
    pub fn clear(&self) {
        let mut records = self.records.write().unwrap();
        records.clear();
    }
}

impl std::fmt::Debug for InMemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.records.read().unwrap();
        f.debug_struct("InMemoryCache")
            .field("keys", &records.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn restore_serves_reads_without_fetch() {
        let mut snapshot = CacheSnapshot::new();
        snapshot.insert("Query".to_string(), json!({"field": "value"}));

        let cache = InMemoryCache::new().restore(snapshot);

        assert_eq!(cache.read("Query"), Some(json!({"field": "value"})));
        assert_eq!(cache.read("Mutation"), None);
    }

    #[test]
    fn empty_snapshot_leaves_cache_empty() {
        let cache = InMemoryCache::new().restore(CacheSnapshot::new());

        assert!(cache.is_empty());
    }

    #[test]
    fn extract_round_trips() {
        let cache = InMemoryCache::new();
        cache.write("Query", json!({"viewer": {"id": "1"}}));

        let snapshot = cache.extract();
        let rehydrated = InMemoryCache::new().restore(snapshot);

        assert_eq!(rehydrated.read("Query"), cache.read("Query"));
    }
}
