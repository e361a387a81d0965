//! Storage backends
//!
//! Three interchangeable media behind one strategy trait: process-lifetime
//! bounded memory, a durable file-per-entry medium, and a session-lifetime
//! serialized map. The trait is selected once at manager construction; the
//! manager never branches on storage kind afterwards.
//!
//! Medium failures (I/O, quota, serialization) never escape this layer:
//! reads degrade to misses and writes to no-ops, logged via `tracing`.

use std::{
    any::Any,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::lru::LruStore;

/// How a backend wants payloads handed to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// Values are kept by reference; no serialization happens
    ByReference,
    /// Values cross the boundary as serialized JSON
    Serialized,
}

/// The stored value, in whichever representation the backend uses
#[derive(Clone)]
pub enum Payload {
    /// Serialized representation (durable and session media)
    Json(serde_json::Value),
    /// Shared in-memory handle (volatile medium)
    Shared(Arc<dyn Any + Send + Sync>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Payload::Shared(_) => f.debug_tuple("Shared").field(&"..").finish(),
        }
    }
}

/// A physical entry as the storage layer sees it: freshness bookkeeping in
/// the clear, payload opaque.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub stored_at_ms: u64,
    pub expires_at_ms: u64,
    pub schema_version: String,
    pub payload: Payload,
}

/// Uniform physical storage contract, keyed by namespace-prefixed strings.
///
/// All methods are infallible at the signature level; implementations absorb
/// medium errors internally.
pub trait StorageBackend: Send + Sync {
    /// Read an entry; absent on miss, medium failure, or corrupt data
    fn get(&self, physical_key: &str) -> Option<RawEntry>;

    /// Write an entry; silently dropped on medium failure
    fn set(&self, physical_key: &str, entry: RawEntry);

    /// Delete an entry, reporting whether it existed
    fn delete(&self, physical_key: &str) -> bool;

    /// Best-effort removal of every entry whose key starts with `prefix`
    fn clear_prefix(&self, prefix: &str);

    /// Number of entries currently held by the medium (diagnostics)
    fn len(&self) -> usize;

    /// Keys currently held by the medium (diagnostics)
    fn keys(&self) -> Vec<String>;

    /// Payload representation this backend expects
    fn payload_mode(&self) -> PayloadMode;

    /// Identifier used in diagnostic stats
    fn id(&self) -> String;
}

/// Shared handle to one namespace's bounded in-memory store
pub type SharedVolatileStore = Arc<Mutex<LruStore<RawEntry>>>;

// ---------------------------------------------------------------------------
// Volatile
// ---------------------------------------------------------------------------

/// Process-lifetime backend over a shared per-namespace LRU store.
///
/// The store itself comes from the registry, so every manager built for the
/// same namespace shares one memory bound. Values are stored by reference.
pub struct VolatileBackend {
    namespace: String,
    store: SharedVolatileStore,
}

impl VolatileBackend {
    pub fn new(namespace: impl Into<String>, store: SharedVolatileStore) -> Self {
        Self {
            namespace: namespace.into(),
            store,
        }
    }
}

impl StorageBackend for VolatileBackend {
    fn get(&self, physical_key: &str) -> Option<RawEntry> {
        self.store.lock().get(physical_key).cloned()
    }

    fn set(&self, physical_key: &str, entry: RawEntry) {
        if let Some(evicted) = self.store.lock().put(physical_key.to_string(), entry) {
            debug!("evicted {} from volatile store {}", evicted, self.namespace);
        }
    }

    fn delete(&self, physical_key: &str) -> bool {
        self.store.lock().remove(physical_key)
    }

    fn clear_prefix(&self, _prefix: &str) {
        // one store == one namespace, so a prefix clear is a full flush
        self.store.lock().clear();
    }

    fn len(&self) -> usize {
        self.store.lock().len()
    }

    fn keys(&self) -> Vec<String> {
        self.store.lock().keys()
    }

    fn payload_mode(&self) -> PayloadMode {
        PayloadMode::ByReference
    }

    fn id(&self) -> String {
        format!("volatile:{}", self.namespace)
    }
}

// ---------------------------------------------------------------------------
// Durable
// ---------------------------------------------------------------------------

/// On-disk representation of one entry.
///
/// The physical key is recorded inside the document because filenames are
/// sanitized and cannot be mapped back to keys reliably.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    key: String,
    stored_at_ms: u64,
    expires_at_ms: u64,
    schema_version: String,
    data: serde_json::Value,
}

impl PersistedEntry {
    fn from_raw(key: &str, entry: &RawEntry) -> Option<Self> {
        match &entry.payload {
            Payload::Json(value) => Some(Self {
                key: key.to_string(),
                stored_at_ms: entry.stored_at_ms,
                expires_at_ms: entry.expires_at_ms,
                schema_version: entry.schema_version.clone(),
                data: value.clone(),
            }),
            Payload::Shared(_) => None,
        }
    }

    fn into_raw(self) -> RawEntry {
        RawEntry {
            stored_at_ms: self.stored_at_ms,
            expires_at_ms: self.expires_at_ms,
            schema_version: self.schema_version,
            payload: Payload::Json(self.data),
        }
    }
}

/// File-per-entry backend surviving process restarts.
///
/// All namespaces share one base directory; `clear_prefix` filters on the
/// key recorded inside each document rather than on filenames.
pub struct DurableBackend {
    base_dir: PathBuf,
}

impl DurableBackend {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn entry_path(&self, physical_key: &str) -> PathBuf {
        let sanitized = physical_key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();
        self.base_dir.join(format!("{}.json", sanitized))
    }

    fn read_entry(&self, path: &Path) -> Result<PersistedEntry> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CacheError::Serialization {
            message: e.to_string(),
        })
    }

    fn write_entry(&self, path: &Path, persisted: &PersistedEntry) -> Result<()> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir)?;
        }
        let json =
            serde_json::to_string_pretty(persisted).map_err(|e| CacheError::Serialization {
                message: e.to_string(),
            })?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Every parseable entry on disk, with its file path
    fn entries(&self) -> Vec<(PathBuf, PersistedEntry)> {
        let dir = match fs::read_dir(&self.base_dir) {
            Ok(dir) => dir,
            Err(_) => return Vec::new(),
        };

        dir.filter_map(|item| {
            let path = item.ok()?.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                let persisted = self.read_entry(&path).ok()?;
                Some((path, persisted))
            } else {
                None
            }
        })
        .collect()
    }
}

impl StorageBackend for DurableBackend {
    fn get(&self, physical_key: &str) -> Option<RawEntry> {
        let path = self.entry_path(physical_key);
        if !path.exists() {
            return None;
        }

        match self.read_entry(&path) {
            // sanitized filenames can collide; trust the recorded key
            Ok(persisted) if persisted.key == physical_key => Some(persisted.into_raw()),
            Ok(_) => None,
            Err(e) => {
                debug!("unreadable durable entry for {}: {}", physical_key, e);
                None
            }
        }
    }

    fn set(&self, physical_key: &str, entry: RawEntry) {
        let Some(persisted) = PersistedEntry::from_raw(physical_key, &entry) else {
            warn!("durable backend given an unserialized payload for {}", physical_key);
            return;
        };

        let path = self.entry_path(physical_key);
        if let Err(e) = self.write_entry(&path, &persisted) {
            warn!("failed to persist {}: {}", physical_key, e);
        }
    }

    fn delete(&self, physical_key: &str) -> bool {
        let path = self.entry_path(physical_key);
        if path.exists() {
            fs::remove_file(&path).is_ok()
        } else {
            false
        }
    }

    fn clear_prefix(&self, prefix: &str) {
        for (path, persisted) in self.entries() {
            if persisted.key.starts_with(prefix) {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("failed to remove durable entry {}: {}", persisted.key, e);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.entries().len()
    }

    fn keys(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .map(|(_, persisted)| persisted.key)
            .collect()
    }

    fn payload_mode(&self) -> PayloadMode {
        PayloadMode::Serialized
    }

    fn id(&self) -> String {
        "durable".to_string()
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The in-memory medium behind every session backend built by one registry
pub type SessionMedium = Arc<RwLock<HashMap<String, String>>>;

/// Session-lifetime backend over a shared serialized map.
///
/// Entries live exactly as long as the medium (in practice, the registry
/// that owns it). Values are serialized like the durable medium's, so the
/// two stay interchangeable from the manager's perspective.
pub struct SessionBackend {
    medium: SessionMedium,
}

impl SessionBackend {
    pub fn new(medium: SessionMedium) -> Self {
        Self { medium }
    }
}

impl StorageBackend for SessionBackend {
    fn get(&self, physical_key: &str) -> Option<RawEntry> {
        let content = self.medium.read().get(physical_key).cloned()?;
        match serde_json::from_str::<PersistedEntry>(&content) {
            Ok(persisted) => Some(persisted.into_raw()),
            Err(e) => {
                debug!("unreadable session entry for {}: {}", physical_key, e);
                None
            }
        }
    }

    fn set(&self, physical_key: &str, entry: RawEntry) {
        let Some(persisted) = PersistedEntry::from_raw(physical_key, &entry) else {
            warn!("session backend given an unserialized payload for {}", physical_key);
            return;
        };

        match serde_json::to_string(&persisted) {
            Ok(json) => {
                self.medium.write().insert(physical_key.to_string(), json);
            }
            Err(e) => warn!("failed to serialize session entry {}: {}", physical_key, e),
        }
    }

    fn delete(&self, physical_key: &str) -> bool {
        self.medium.write().remove(physical_key).is_some()
    }

    fn clear_prefix(&self, prefix: &str) {
        self.medium
            .write()
            .retain(|key, _| !key.starts_with(prefix));
    }

    fn len(&self) -> usize {
        self.medium.read().len()
    }

    fn keys(&self) -> Vec<String> {
        self.medium.read().keys().cloned().collect()
    }

    fn payload_mode(&self) -> PayloadMode {
        PayloadMode::Serialized
    }

    fn id(&self) -> String {
        "session".to_string()
    }
}
