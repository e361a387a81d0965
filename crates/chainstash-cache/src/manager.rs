//! Cache manager
//!
//! The single entry point callers interact with: namespacing, TTL and
//! schema-version enforcement, and lazy eviction of invalid entries, layered
//! over a [`StorageBackend`] chosen at construction time.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::metrics::{CacheMetrics, CacheStats};
use crate::storage::{Payload, PayloadMode, RawEntry, StorageBackend};

/// TTL- and version-aware cache over one namespace of one storage backend.
///
/// All operations are synchronous bookkeeping over the storage medium; the
/// manager performs no I/O of its own beyond what the backend does.
pub struct CacheManager {
    config: CacheConfig,
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    metrics: Arc<CacheMetrics>,
}

impl CacheManager {
    /// Create a manager over a backend. Fails on invalid configuration.
    pub fn new(
        config: CacheConfig,
        backend: Arc<dyn StorageBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            clock,
            metrics: Arc::new(CacheMetrics::new()),
        })
    }

    /// The configuration this manager was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Retrieve a cached value
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.get_entry(key).map(|entry| entry.data)
    }

    /// Retrieve a cached value together with its bookkeeping.
    ///
    /// Expired or version-mismatched entries are deleted from the backend on
    /// first observation and reported as absent.
    pub fn get_entry<T>(&self, key: &str) -> Option<CacheEntry<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let physical_key = self.physical_key(key);
        let Some(raw) = self.backend.get(&physical_key) else {
            debug!("cache miss for {}", physical_key);
            self.metrics.record_miss();
            return None;
        };

        let now_ms = self.clock.now_ms();
        if now_ms > raw.expires_at_ms {
            debug!("cache entry expired for {}", physical_key);
            self.backend.delete(&physical_key);
            self.metrics.record_invalidation();
            return None;
        }
        if raw.schema_version != self.config.schema_version {
            debug!(
                "cache entry version mismatch for {} ({} != {})",
                physical_key, raw.schema_version, self.config.schema_version
            );
            self.backend.delete(&physical_key);
            self.metrics.record_invalidation();
            return None;
        }

        let Some(data) = Self::extract::<T>(&physical_key, raw.payload) else {
            // undecodable payloads are dropped like any other invalid entry
            self.backend.delete(&physical_key);
            self.metrics.record_invalidation();
            return None;
        };

        debug!("cache hit for {}", physical_key);
        self.metrics.record_hit();
        Some(CacheEntry {
            data,
            stored_at_ms: raw.stored_at_ms,
            expires_at_ms: raw.expires_at_ms,
            schema_version: raw.schema_version,
        })
    }

    /// Store a value under this manager's namespace, TTL, and schema version
    pub fn set<T>(&self, key: &str, data: T)
    where
        T: Serialize + Send + Sync + 'static,
    {
        let physical_key = self.physical_key(key);
        let entry = CacheEntry::new(
            data,
            self.clock.now_ms(),
            self.config.ttl,
            self.config.schema_version.clone(),
        );

        let payload = match self.backend.payload_mode() {
            PayloadMode::Serialized => match serde_json::to_value(&entry.data) {
                Ok(value) => Payload::Json(value),
                Err(e) => {
                    // best-effort medium: an unserializable value is not cached
                    warn!("failed to serialize value for {}: {}", physical_key, e);
                    return;
                }
            },
            PayloadMode::ByReference => Payload::Shared(Arc::new(entry.data)),
        };

        self.backend.set(
            &physical_key,
            RawEntry {
                stored_at_ms: entry.stored_at_ms,
                expires_at_ms: entry.expires_at_ms,
                schema_version: entry.schema_version,
                payload,
            },
        );
        debug!("cached value for {}", physical_key);
    }

    /// Delete a single key, reporting whether it was present
    pub fn delete(&self, key: &str) -> bool {
        self.backend.delete(&self.physical_key(key))
    }

    /// Remove every entry under this manager's namespace.
    ///
    /// Entries belonging to other namespaces on the same medium are spared.
    pub fn clear(&self) {
        debug!("clearing namespace {}", self.config.namespace);
        self.backend.clear_prefix(&self.config.key_prefix());
    }

    /// Number of entries currently stored under this namespace
    pub fn len(&self) -> usize {
        let prefix = self.config.key_prefix();
        self.backend
            .keys()
            .iter()
            .filter(|key| key.starts_with(&prefix))
            .count()
    }

    /// Whether this namespace currently holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical keys currently stored under this namespace (diagnostics)
    pub fn keys(&self) -> Vec<String> {
        let prefix = self.config.key_prefix();
        self.backend
            .keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Hit/miss statistics snapshot
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot(self.len())
    }

    /// Identifier of the backing medium (diagnostics)
    pub fn backend_id(&self) -> String {
        self.backend.id()
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix(), key)
    }

    fn extract<T>(physical_key: &str, payload: Payload) -> Option<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        match payload {
            Payload::Shared(any) => match any.downcast::<T>() {
                Ok(shared) => Some((*shared).clone()),
                Err(_) => {
                    warn!("type mismatch for volatile entry {}", physical_key);
                    None
                }
            },
            Payload::Json(value) => match serde_json::from_value(value) {
                Ok(data) => Some(data),
                Err(e) => {
                    debug!("undecodable cache entry for {}: {}", physical_key, e);
                    None
                }
            },
        }
    }
}
