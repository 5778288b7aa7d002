use std::collections::HashMap;
use std::sync::Arc;

use chronoplan_timeline::{CostSeries, TimeSpan};
use indexmap::IndexMap;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::engine::DimensionFilter;

/// Memoization key: node, query window, canonical dimension selection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    node: Uuid,
    window: TimeSpan,
    /// Sorted dimension names; `None` selects all dimensions.
    dimensions: Option<Vec<String>>,
}

impl CacheKey {
    /// Builds the key for a query.
    #[must_use]
    pub fn new(node: Uuid, window: TimeSpan, filter: &DimensionFilter) -> Self {
        Self {
            node,
            window,
            dimensions: filter.canonical(),
        }
    }
}

struct CacheEntry {
    revision: u64,
    series: Arc<IndexMap<String, CostSeries>>,
}

/// Revision-validated result cache shared by concurrent readers.
///
/// An entry is only served while the store revision of its node is
/// unchanged, so a stale result is never returned; edits simply leave
/// outdated entries behind to age out on their next lookup. Two readers
/// racing on the same key may both compute (wasted but correct).
#[derive(Default)]
pub struct QueryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached series for the key, provided it was computed at exactly
    /// `revision`. A mismatch evicts the dead entry.
    #[must_use]
    pub fn lookup(
        &self,
        key: &CacheKey,
        revision: u64,
    ) -> Option<Arc<IndexMap<String, CostSeries>>> {
        {
            let entries = self.entries.read();
            let entry = entries.get(key)?;
            if entry.revision == revision {
                return Some(Arc::clone(&entry.series));
            }
        }
        self.entries.write().remove(key);
        None
    }

    /// Stores a computed result for the key at the given revision.
    pub fn insert(
        &self,
        key: CacheKey,
        revision: u64,
        series: Arc<IndexMap<String, CostSeries>>,
    ) {
        self.entries
            .write()
            .insert(key, CacheEntry { revision, series });
    }

    /// Number of live entries (stale ones included until next lookup).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .finish()
    }
}
