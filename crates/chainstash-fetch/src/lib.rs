//! # Chainstash Fetch
//!
//! Async orchestration over the chainstash cache core: memoize arbitrary
//! asynchronous producers behind a [`CacheManager`], with per-key
//! single-flight deduplication, observable loading/error state, and
//! dependency-triggered namespace invalidation.
//!
//! Producer failures are the only caller-visible errors; everything the
//! storage layer does stays invisible on the happy and the degraded path
//! alike.

pub mod error;
pub mod fetcher;
pub mod watcher;

pub use chainstash_cache::CacheManager;
pub use error::FetchError;
pub use fetcher::{CachedFetcher, FetchStatus};
pub use watcher::DependencyWatcher;

/// Re-export commonly used Result type
pub type Result<T> = std::result::Result<T, FetchError>;
