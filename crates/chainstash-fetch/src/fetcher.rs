//! Cached-fetch orchestration
//!
//! Wraps an arbitrary asynchronous producer behind a [`CacheManager`]: fresh
//! cache hits return immediately, misses run the producer exactly once per
//! key no matter how many callers are waiting, and the loading/error state
//! of every key stays observable.

use std::{collections::HashMap, future::Future, sync::Arc};

use chainstash_cache::CacheManager;
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};

/// Observable state of one key's fetch lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    /// Never requested, or reset by `invalidate`
    Idle,
    /// A producer call is in flight
    Loading,
    /// The last request resolved with a value
    Loaded,
    /// The last request failed; carries the producer's error message
    Failed(String),
}

type SharedResult<T> = Arc<OnceCell<Result<T>>>;

/// Memoizes async producers behind a cache, one value type per fetcher.
///
/// Overlapping requests for the same key share one in-flight producer call
/// and observe its eventual result, success or failure. If every waiting
/// caller is cancelled mid-flight the shared cell is simply re-entered by
/// the next request, so an abandoned fetch never wedges a key.
pub struct CachedFetcher<T> {
    manager: Arc<CacheManager>,
    inflight: Mutex<HashMap<String, SharedResult<T>>>,
    states: Mutex<HashMap<String, FetchStatus>>,
}

impl<T> CachedFetcher<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self {
            manager,
            inflight: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
        }
    }

    /// The cache this fetcher stores through
    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    /// Return the cached value for `key`, or produce and cache it.
    ///
    /// A fresh cache hit returns without invoking the producer or touching
    /// the loading state. On a miss the producer runs under a per-key
    /// single-flight cell; failures are surfaced to every waiting caller
    /// and never cached.
    pub async fn request<F, Fut, E>(&self, key: &str, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        if let Some(value) = self.manager.get::<T>(key) {
            self.set_status(key, FetchStatus::Loaded);
            return Ok(value);
        }

        let cell = {
            let mut inflight = self.inflight.lock();
            Arc::clone(inflight.entry(key.to_string()).or_default())
        };

        let result = cell
            .get_or_init(|| async {
                self.set_status(key, FetchStatus::Loading);
                debug!("fetching {}", key);
                match producer().await {
                    Ok(value) => {
                        self.manager.set(key, value.clone());
                        Ok(value)
                    }
                    Err(e) => {
                        warn!("producer failed for {}: {}", key, e);
                        Err(FetchError::producer(e))
                    }
                }
            })
            .await
            .clone();

        self.finish(key, &cell, &result);
        result
    }

    /// Run the producer unconditionally, overwriting the cache on success
    pub async fn refetch<F, Fut, E>(&self, key: &str, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        self.set_status(key, FetchStatus::Loading);
        debug!("refetching {}", key);
        match producer().await {
            Ok(value) => {
                self.manager.set(key, value.clone());
                self.set_status(key, FetchStatus::Loaded);
                Ok(value)
            }
            Err(e) => {
                warn!("producer failed for {}: {}", key, e);
                let error = FetchError::producer(e);
                self.set_status(key, FetchStatus::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    /// Drop `key` from the cache and reset its observable state.
    ///
    /// Does not trigger a refetch; the next `request` will.
    pub fn invalidate(&self, key: &str) -> bool {
        self.states.lock().remove(key);
        self.manager.delete(key)
    }

    /// Observable state of `key`
    pub fn status(&self, key: &str) -> FetchStatus {
        self.states
            .lock()
            .get(key)
            .cloned()
            .unwrap_or(FetchStatus::Idle)
    }

    fn set_status(&self, key: &str, status: FetchStatus) {
        self.states.lock().insert(key.to_string(), status);
    }

    /// Record the outcome and retire the completed in-flight cell so later
    /// misses fetch anew.
    fn finish(&self, key: &str, cell: &SharedResult<T>, result: &Result<T>) {
        {
            let mut inflight = self.inflight.lock();
            if let Some(current) = inflight.get(key) {
                if Arc::ptr_eq(current, cell) {
                    inflight.remove(key);
                }
            }
        }
        match result {
            Ok(_) => self.set_status(key, FetchStatus::Loaded),
            Err(e) => self.set_status(key, FetchStatus::Failed(e.to_string())),
        }
    }
}
