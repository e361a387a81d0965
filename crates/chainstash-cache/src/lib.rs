//! # Chainstash Cache
//!
//! Namespaced caching core for data-fetching layers: bounded LRU memory,
//! TTL expiration, schema-version invalidation, and interchangeable storage
//! backends behind one manager.
//!
//! ## Features
//!
//! - **Bounded memory**: volatile caches share one LRU store per namespace
//! - **Freshness**: TTL and schema-version checks with lazy eviction on read
//! - **Pluggable storage**: volatile, durable, and session-lifetime backends
//!   behind a single strategy trait
//! - **Best-effort media**: storage failures degrade to cache misses, never
//!   to caller-visible errors
//! - **Injectable clock**: deterministic expiry in tests
//!
//! Construct a [`CacheRegistry`] at application startup and build
//! [`CacheManager`]s from it; the registry also carries the diagnostic
//! `stats`/`clear_all` surface.

pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod lru;
pub mod manager;
pub mod metrics;
pub mod registry;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CachePreset, StorageKind, DEFAULT_SCHEMA_VERSION};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use lru::LruStore;
pub use manager::CacheManager;
pub use metrics::{CacheMetrics, CacheStats};
pub use registry::CacheRegistry;
pub use storage::{
    DurableBackend, Payload, PayloadMode, RawEntry, SessionBackend, StorageBackend,
    VolatileBackend,
};

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, CacheError>;
