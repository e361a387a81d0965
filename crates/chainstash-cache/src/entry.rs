//! Cache entry data model

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cached payload with its freshness bookkeeping.
///
/// Entries carry everything needed to decide validity without consulting the
/// store that produced them: creation time, expiry time, and the schema
/// version they were written under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached data
    pub data: T,
    /// Creation time, milliseconds since the UNIX epoch
    pub stored_at_ms: u64,
    /// Expiry time; always strictly greater than `stored_at_ms`
    pub expires_at_ms: u64,
    /// Schema version the entry was written under
    pub schema_version: String,
}

impl<T> CacheEntry<T> {
    /// Create an entry valid for `ttl` starting at `now_ms`
    pub fn new(data: T, now_ms: u64, ttl: Duration, schema_version: impl Into<String>) -> Self {
        let ttl_ms = (ttl.as_millis() as u64).max(1);
        Self {
            data,
            stored_at_ms: now_ms,
            expires_at_ms: now_ms + ttl_ms,
            schema_version: schema_version.into(),
        }
    }

    /// Whether the entry has outlived its TTL at `now_ms`
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.expires_at_ms
    }

    /// Whether the entry was written under the given schema version
    pub fn matches_version(&self, version: &str) -> bool {
        self.schema_version == version
    }
}
