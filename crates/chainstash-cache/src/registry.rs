//! Cache registry
//!
//! The registry is the composition root of the cache subsystem: the host
//! application constructs one at startup and hands it to whoever needs a
//! cache. It owns the per-namespace volatile stores (so the memory bound is
//! shared by every manager of a namespace, not per caller), the session
//! medium, and the durable base directory, and it is the diagnostic surface
//! for the whole subsystem.
//!
//! Tests construct their own isolated registries instead of sharing global
//! state.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, CachePreset, StorageKind};
use crate::error::Result;
use crate::lru::LruStore;
use crate::manager::CacheManager;
use crate::storage::{
    DurableBackend, SessionBackend, SessionMedium, SharedVolatileStore, StorageBackend,
    VolatileBackend,
};

/// Factory and diagnostic surface for every cache in the process
pub struct CacheRegistry {
    durable_dir: PathBuf,
    volatile: Mutex<HashMap<String, SharedVolatileStore>>,
    session: SessionMedium,
}

impl CacheRegistry {
    /// Create a registry persisting durable entries under `durable_dir`
    pub fn new(durable_dir: impl AsRef<Path>) -> Self {
        Self {
            durable_dir: durable_dir.as_ref().to_path_buf(),
            volatile: Mutex::new(HashMap::new()),
            session: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Build a manager for the given configuration, using the wall clock
    pub fn manager(&self, config: CacheConfig) -> Result<CacheManager> {
        self.manager_with_clock(config, Arc::new(SystemClock))
    }

    /// Build a manager with an injected clock
    pub fn manager_with_clock(
        &self,
        config: CacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<CacheManager> {
        config.validate()?;

        let backend: Arc<dyn StorageBackend> = match config.kind {
            StorageKind::Volatile => Arc::new(VolatileBackend::new(
                config.namespace.as_str(),
                self.volatile_store(&config.namespace, config.max_entries),
            )),
            StorageKind::Durable => Arc::new(DurableBackend::new(&self.durable_dir)),
            StorageKind::Session => Arc::new(SessionBackend::new(Arc::clone(&self.session))),
        };

        CacheManager::new(config, backend, clock)
    }

    /// Build a manager from a named preset
    pub fn preset(&self, preset: CachePreset, namespace: &str) -> Result<CacheManager> {
        self.manager(preset.config(namespace))
    }

    /// Entry counts per backing medium
    pub fn stats(&self) -> HashMap<String, usize> {
        let mut stats = HashMap::new();
        for (namespace, store) in self.volatile.lock().iter() {
            stats.insert(format!("volatile:{}", namespace), store.lock().len());
        }
        stats.insert("session".to_string(), self.session.read().len());
        stats.insert(
            "durable".to_string(),
            DurableBackend::new(&self.durable_dir).len(),
        );
        stats
    }

    /// Flush every namespace on every medium (full logout/reset path)
    pub fn clear_all(&self) {
        info!("clearing all caches");
        for store in self.volatile.lock().values() {
            store.lock().clear();
        }
        self.session.write().clear();
        // empty prefix matches every durable entry
        DurableBackend::new(&self.durable_dir).clear_prefix("");
    }

    /// One shared LRU store per namespace; the first caller's capacity wins
    fn volatile_store(&self, namespace: &str, max_entries: usize) -> SharedVolatileStore {
        let mut stores = self.volatile.lock();
        let store = stores.entry(namespace.to_string()).or_insert_with(|| {
            debug!(
                "creating volatile store for namespace {} (capacity {})",
                namespace, max_entries
            );
            Arc::new(Mutex::new(LruStore::new(max_entries)))
        });
        Arc::clone(store)
    }
}
