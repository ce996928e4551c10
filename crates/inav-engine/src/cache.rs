//! Visibility-edge cache and the query-result LRU.
//!
//! The edge cache is content-addressed: the key encodes dataset identity
//! (map id + timestamp) and every parameter that changes edge semantics
//! (distance, neighbor cap, schema version).  Storage is behind the
//! [`EdgeStore`] trait — the engine neither knows nor cares whether records
//! land in memory, on disk, or in a browser KV.  Writes are fire-and-forget:
//! a failed `put` is logged by the caller and never propagated.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use lru::LruCache;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// Bump when edge-build semantics change; invalidates every stored record.
pub const CACHE_SCHEMA_VERSION: u32 = 3;

/// One directed visibility edge in serialized form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedEdge {
    pub from: String,
    pub to: String,
    pub weight_m: f64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheMeta {
    pub node_count: usize,
    pub floor_count: usize,
}

/// A complete cached edge set for one dataset + parameter combination.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedEdgeSet {
    pub edges: Vec<CachedEdge>,
    pub meta: CacheMeta,
    /// Unix seconds at write time.
    pub created_at: u64,
}

/// `visibilityEdges:v<SCHEMA>:<map_id>:<map_time>:d<max_distance>:k<max_neighbors>`
pub fn cache_key(map_id: &str, map_time: u64, config: &EngineConfig) -> String {
    format!(
        "visibilityEdges:v{CACHE_SCHEMA_VERSION}:{map_id}:{map_time}:d{}:k{}",
        config.max_distance_m, config.max_neighbors
    )
}

pub fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ── EdgeStore ─────────────────────────────────────────────────────────────────

/// Storage-agnostic persistent mapping for cached edge sets.
pub trait EdgeStore {
    fn get(&self, key: &str) -> EngineResult<Option<CachedEdgeSet>>;
    fn put(&self, key: &str, record: &CachedEdgeSet) -> EngineResult<()>;
}

/// In-process [`EdgeStore`].  The default backend for tests and for sharing
/// edge sets between engine instances in one process.
#[derive(Default)]
pub struct MemoryEdgeStore {
    inner: Mutex<FxHashMap<String, CachedEdgeSet>>,
}

impl MemoryEdgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("edge store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EdgeStore for MemoryEdgeStore {
    fn get(&self, key: &str) -> EngineResult<Option<CachedEdgeSet>> {
        Ok(self.inner.lock().expect("edge store poisoned").get(key).cloned())
    }

    fn put(&self, key: &str, record: &CachedEdgeSet) -> EngineResult<()> {
        self.inner
            .lock()
            .expect("edge store poisoned")
            .insert(key.to_string(), record.clone());
        Ok(())
    }
}

// ── PathCache ─────────────────────────────────────────────────────────────────

/// Bounded LRU for query results.  The single mutable shared state on the
/// query path; a `Mutex` serializes writers, and an evicted-then-reinserted
/// entry is benign.
pub struct PathCache<T> {
    inner: Mutex<LruCache<String, T>>,
}

impl<T: Clone> PathCache<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity >= 1");
        Self { inner: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.lock().expect("path cache poisoned").get(key).cloned()
    }

    pub fn put(&self, key: String, value: T) {
        self.inner.lock().expect("path cache poisoned").put(key, value);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("path cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
