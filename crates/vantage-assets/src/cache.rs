//! Result cache keyed by stable asset id and quality tier name.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Stable identifier of a source asset, e.g. its path or content hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey(String);

impl AssetKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for AssetKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Optimized results per asset, one entry per tier.
#[derive(Debug)]
pub struct OptimizedCache<T> {
    entries: FxHashMap<AssetKey, FxHashMap<String, Arc<T>>>,
}

impl<T> OptimizedCache<T> {
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn get(&self, key: &AssetKey, level: &str) -> Option<Arc<T>> {
        self.entries
            .get(key)
            .and_then(|tiers| tiers.get(level))
            .map(Arc::clone)
    }

    pub fn insert(&mut self, key: AssetKey, level: &str, value: Arc<T>) {
        self.entries
            .entry(key)
            .or_default()
            .insert(level.to_string(), value);
    }

    /// Drop every tier of `key`. Returns how many entries were removed.
    pub fn invalidate(&mut self, key: &AssetKey) -> usize {
        self.entries.remove(key).map_or(0, |tiers| tiers.len())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached (asset, tier) results.
    pub fn len(&self) -> usize {
        self.entries.values().map(|tiers| tiers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for OptimizedCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_insert_invalidate() {
        let mut cache = OptimizedCache::new();
        let key = AssetKey::from("rock.png");
        cache.insert(key.clone(), "low", Arc::new(1));
        cache.insert(key.clone(), "high", Arc::new(2));
        cache.insert(AssetKey::from("tree.png"), "low", Arc::new(3));

        assert_eq!(cache.get(&key, "high").as_deref(), Some(&2));
        assert!(cache.get(&key, "medium").is_none());
        assert_eq!(cache.len(), 3);

        assert_eq!(cache.invalidate(&key), 2);
        assert!(cache.get(&key, "low").is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
