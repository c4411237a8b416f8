//! Cache of prepared documents.
//!
//! Preparing a document only depends on its text and on the schema, so the outcome (errors
//! included) is kept per schema version and document hash. Concurrent requests for the same
//! document wait for a single preparation, unrelated documents don't block each other.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, OnceLock,
};

use dashmap::DashMap;

use crate::{config::OperationCaching, response::GraphqlError, typecheck::TypedDocument};

/// The outcome of parsing, elaborating, type checking and validating a document.
pub type Prepared = Result<Arc<TypedDocument>, Arc<[GraphqlError]>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    schema_version: String,
    document: blake3::Hash,
}

impl CacheKey {
    pub fn new(schema_version: &str, document: &str) -> Self {
        CacheKey {
            schema_version: schema_version.to_string(),
            document: blake3::hash(document.as_bytes()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct OperationCache {
    enabled: bool,
    limit: usize,
    entries: DashMap<CacheKey, Arc<OnceLock<Prepared>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl OperationCache {
    pub fn new(config: &OperationCaching) -> Self {
        OperationCache {
            enabled: config.enabled,
            limit: config.limit,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached preparation of `document`, running `prepare` if there is none yet.
    ///
    /// Once the cache holds `limit` documents, new ones are prepared every time.
    pub fn get_or_prepare(&self, schema_version: &str, document: &str, prepare: impl FnOnce() -> Prepared) -> Prepared {
        if !self.enabled {
            return prepare();
        }

        let key = CacheKey::new(schema_version, document);
        // The shard guard must be released before `entry` is called on the same map.
        let existing = self.entries.get(&key).map(|slot| Arc::clone(&slot));
        let slot = match existing {
            Some(slot) => slot,
            None if self.entries.len() >= self.limit => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(document = %key.document, "operation cache is full, preparing without caching");
                return prepare();
            }
            None => Arc::clone(&self.entries.entry(key.clone()).or_default()),
        };

        let mut computed = false;
        let prepared = slot.get_or_init(|| {
            computed = true;
            prepare()
        });

        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(document = %key.document, "operation cache miss");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(document = %key.document, "operation cache hit");
        }

        prepared.clone()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}
