//! Cache configuration and named presets

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Schema version written when none is configured
pub const DEFAULT_SCHEMA_VERSION: &str = "1.0";

/// Separator between a namespace and the logical key in physical keys
pub(crate) const KEY_SEPARATOR: char = ':';

/// Where a cache keeps its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageKind {
    /// Process-lifetime memory, bounded by an LRU store shared per namespace
    Volatile,
    /// Survives process restarts (one JSON file per entry)
    Durable,
    /// Survives only for the lifetime of a single application session
    Session,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for entries
    pub ttl: Duration,
    /// Maximum number of entries (enforced by the volatile LRU store)
    pub max_entries: usize,
    /// Storage backend kind
    pub kind: StorageKind,
    /// Key namespace; all physical keys are prefixed with it
    pub namespace: String,
    /// Entries written under a different version are treated as absent
    pub schema_version: String,
}

impl CacheConfig {
    /// Create a configuration with defaults (5 minute TTL, 100 entries)
    pub fn new(namespace: impl Into<String>, kind: StorageKind) -> Self {
        Self {
            ttl: Duration::from_secs(300),
            max_entries: 100,
            kind,
            namespace: namespace.into(),
            schema_version: DEFAULT_SCHEMA_VERSION.to_string(),
        }
    }

    /// Set the entry TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the entry bound
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the schema version
    pub fn with_schema_version(mut self, version: impl Into<String>) -> Self {
        self.schema_version = version.into();
        self
    }

    /// Check the configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(CacheError::invalid_config("ttl must be greater than zero"));
        }
        if self.max_entries == 0 {
            return Err(CacheError::invalid_config(
                "max_entries must be greater than zero",
            ));
        }
        if self.namespace.is_empty() {
            return Err(CacheError::invalid_config("namespace must not be empty"));
        }
        if self.namespace.contains(KEY_SEPARATOR) {
            return Err(CacheError::invalid_config(format!(
                "namespace must not contain '{}'",
                KEY_SEPARATOR
            )));
        }
        Ok(())
    }

    /// Physical-key prefix owned by this configuration's namespace
    pub(crate) fn key_prefix(&self) -> String {
        format!("{}{}", self.namespace, KEY_SEPARATOR)
    }
}

/// Named configurations for the common cache shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CachePreset {
    /// Metadata-like data: slow to change, worth keeping across restarts
    Metadata,
    /// Session-scoped derived data, kept in bounded memory
    Derived,
    /// Fast-changing numeric data (prices, balances), session-lifetime only
    Quotes,
    /// Long-lived user settings
    Settings,
}

impl CachePreset {
    /// Materialize the preset for a namespace
    pub fn config(self, namespace: impl Into<String>) -> CacheConfig {
        match self {
            CachePreset::Metadata => CacheConfig::new(namespace, StorageKind::Durable)
                .with_ttl(Duration::from_secs(300))
                .with_max_entries(100),
            CachePreset::Derived => CacheConfig::new(namespace, StorageKind::Volatile)
                .with_ttl(Duration::from_secs(600))
                .with_max_entries(50),
            CachePreset::Quotes => CacheConfig::new(namespace, StorageKind::Session)
                .with_ttl(Duration::from_secs(60))
                .with_max_entries(200),
            CachePreset::Settings => CacheConfig::new(namespace, StorageKind::Durable)
                .with_ttl(Duration::from_secs(86_400))
                .with_max_entries(10),
        }
    }
}
