//! Time-bounded cache of the allowed grade set.
//!
//! The grade list lives in a JSON file that admins can rewrite at any time.
//! Handlers consult [`GradeCache`] instead of re-reading the file on every
//! request; the grade update handler calls [`GradeCache::invalidate`] so the
//! next lookup sees the new list immediately.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use cr_store::queries::grades::GradeStore;
use parking_lot::RwLock;

struct Entry {
    value: HashSet<String>,
    expiry: Instant,
}

/// Cached set of grades videos may be tagged with and viewed under.
pub struct GradeCache {
    ttl: Duration,
    entry: RwLock<Option<Entry>>,
}

impl std::fmt::Debug for GradeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradeCache")
            .field("ttl", &self.ttl)
            .field("cached", &self.entry.read().is_some())
            .finish()
    }
}

impl GradeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Current allowed grades, refreshing from `store` when expired.
    ///
    /// A store failure falls back to the store's defaults; the fallback is
    /// cached for a full TTL like a successful read.
    pub fn allowed(&self, store: &GradeStore) -> HashSet<String> {
        let now = Instant::now();
        if let Some(entry) = self.entry.read().as_ref() {
            if now < entry.expiry {
                return entry.value.clone();
            }
        }

        let grades = store.read().unwrap_or_else(|e| {
            tracing::warn!("Failed to refresh grade list, using defaults: {e}");
            store.defaults().to_vec()
        });
        let value: HashSet<String> = grades.into_iter().collect();

        *self.entry.write() = Some(Entry {
            value: value.clone(),
            expiry: now + self.ttl,
        });
        value
    }

    /// Drop the cached value so the next lookup re-reads the store.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path) -> GradeStore {
        GradeStore::open(dir, vec!["Grade 7".into(), "Grade 8".into()])
    }

    fn set(grades: &[&str]) -> HashSet<String> {
        grades.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn serves_cached_value_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let cache = GradeCache::new(Duration::from_secs(3600));

        assert_eq!(cache.allowed(&store), set(&["Grade 7", "Grade 8"]));
        store.write(&["Grade 9".into()]).unwrap();

        // Still the old set inside the TTL.
        assert_eq!(cache.allowed(&store), set(&["Grade 7", "Grade 8"]));

        cache.invalidate();
        assert_eq!(cache.allowed(&store), set(&["Grade 9"]));
    }

    #[test]
    fn zero_ttl_always_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let cache = GradeCache::new(Duration::ZERO);

        assert!(cache.allowed(&store).contains("Grade 8"));
        store.write(&["Grade 10".into()]).unwrap();
        assert_eq!(cache.allowed(&store), set(&["Grade 10"]));
    }

    #[test]
    fn empty_defaults_yield_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let store = GradeStore::open(dir.path(), Vec::new());
        let cache = GradeCache::new(Duration::from_secs(5));
        assert!(cache.allowed(&store).is_empty());
    }

    #[test]
    fn unreadable_store_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = GradeStore::open(&blocker, vec!["Grade 7".into()]);
        let cache = GradeCache::new(Duration::from_secs(5));

        assert_eq!(cache.allowed(&store), set(&["Grade 7"]));
        // The fallback is cached like a successful read.
        assert!(format!("{cache:?}").contains("cached: true"));
    }
}
