//! End-to-end coverage of the cache subsystem across both crates:
//! registry-built managers over every storage kind, fetch orchestration,
//! and dependency-triggered invalidation working together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chainstash_cache::{
    CacheConfig, CachePreset, CacheRegistry, Clock, ManualClock, StorageKind,
};
use chainstash_fetch::{CachedFetcher, DependencyWatcher, FetchStatus};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NftMetadata {
    name: String,
    image_url: String,
}

#[test]
fn eviction_keeps_the_two_most_recent_entries() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());
    let manager = registry
        .manager(
            CacheConfig::new("nft", StorageKind::Volatile)
                .with_ttl(Duration::from_millis(1_000))
                .with_max_entries(2),
        )
        .unwrap();

    manager.set("a", 1u32);
    manager.set("b", 2u32);
    manager.set("c", 3u32);

    assert_eq!(manager.get::<u32>("a"), None);
    assert_eq!(manager.get::<u32>("b"), Some(2));
    assert_eq!(manager.get::<u32>("c"), Some(3));
}

#[test]
fn advancing_past_ttl_expires_the_entry() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());
    let clock = Arc::new(ManualClock::new(0));
    let manager = registry
        .manager_with_clock(
            CacheConfig::new("nft", StorageKind::Volatile)
                .with_ttl(Duration::from_millis(1_000))
                .with_max_entries(2),
            Arc::clone(&clock) as Arc<dyn Clock>,
        )
        .unwrap();

    manager.set("x", "v".to_string());
    clock.advance(Duration::from_millis(1_001));
    assert_eq!(manager.get::<String>("x"), None);

    // the physical entry was removed, not just hidden
    let stats = registry.stats();
    assert_eq!(stats.get("volatile:nft"), Some(&0));
}

#[test]
fn schema_bump_invalidates_unexpired_entries() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());

    let v1 = registry
        .manager(CacheConfig::new("prefs", StorageKind::Durable).with_schema_version("1.0"))
        .unwrap();
    v1.set("layout", "compact".to_string());
    assert_eq!(v1.get::<String>("layout"), Some("compact".to_string()));

    let v2 = registry
        .manager(CacheConfig::new("prefs", StorageKind::Durable).with_schema_version("2.0"))
        .unwrap();
    assert_eq!(v2.get::<String>("layout"), None);
}

#[test]
fn namespaces_on_a_shared_durable_medium_stay_isolated() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());

    let alpha = registry
        .manager(CacheConfig::new("alpha", StorageKind::Durable))
        .unwrap();
    let beta = registry
        .manager(CacheConfig::new("beta", StorageKind::Durable))
        .unwrap();

    alpha.set("k", 1u32);
    assert_eq!(beta.get::<u32>("k"), None);

    beta.set("k", 2u32);
    alpha.clear();
    assert_eq!(alpha.get::<u32>("k"), None);
    assert_eq!(beta.get::<u32>("k"), Some(2));
}

#[test]
fn durable_medium_is_visible_across_registries() {
    // two registries over one directory model two processes sharing one
    // medium: last write wins on the next read, nothing stronger
    let dir = TempDir::new().unwrap();
    let first = CacheRegistry::new(dir.path());
    let second = CacheRegistry::new(dir.path());

    let config = CacheConfig::new("shared", StorageKind::Durable);
    first.manager(config.clone()).unwrap().set("k", 1u32);
    second.manager(config.clone()).unwrap().set("k", 2u32);

    assert_eq!(first.manager(config).unwrap().get::<u32>("k"), Some(2));
}

#[test]
fn presets_round_trip_typed_values() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());
    let manager = registry.preset(CachePreset::Metadata, "nft").unwrap();

    let metadata = NftMetadata {
        name: "Jar #42".to_string(),
        image_url: "ipfs://...".to_string(),
    };
    manager.set("0xabc/42", metadata.clone());
    assert_eq!(manager.get::<NftMetadata>("0xabc/42"), Some(metadata));
}

#[test]
fn clear_all_empties_every_medium() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());

    registry
        .preset(CachePreset::Derived, "derived")
        .unwrap()
        .set("a", 1u32);
    registry
        .preset(CachePreset::Metadata, "meta")
        .unwrap()
        .set("b", 2u32);
    registry
        .preset(CachePreset::Quotes, "quotes")
        .unwrap()
        .set("c", 3u32);

    assert!(registry.stats().values().sum::<usize>() > 0);
    registry.clear_all();
    assert_eq!(registry.stats().values().sum::<usize>(), 0);
}

#[tokio::test]
async fn fetcher_deduplicates_concurrent_requests_end_to_end() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());
    let manager = Arc::new(registry.preset(CachePreset::Metadata, "nft").unwrap());
    let fetcher = CachedFetcher::<NftMetadata>::new(manager);
    let calls = AtomicUsize::new(0);

    let producer = || {
        let calls = &calls;
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok::<_, String>(NftMetadata {
                name: "Jar #1".to_string(),
                image_url: "ipfs://jar1".to_string(),
            })
        }
    };

    let (a, b) = tokio::join!(
        fetcher.request("0xabc/1", producer),
        fetcher.request("0xabc/1", producer),
    );

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(fetcher.status("0xabc/1"), FetchStatus::Loaded);
}

#[tokio::test]
async fn account_switch_clears_and_next_request_refetches() {
    let dir = TempDir::new().unwrap();
    let registry = CacheRegistry::new(dir.path());
    let manager = Arc::new(
        registry
            .manager(CacheConfig::new("balances", StorageKind::Volatile))
            .unwrap(),
    );
    let fetcher = CachedFetcher::<u64>::new(Arc::clone(&manager));
    let watcher = DependencyWatcher::new(Arc::clone(&manager));
    let calls = AtomicUsize::new(0);

    let producer = |balance: u64| {
        let calls = &calls;
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(balance)
        }
    };

    watcher.check_and_invalidate(&["account-1"]);
    let balance = fetcher.request("eth", || producer(10)).await.unwrap();
    assert_eq!(balance, 10);

    // same account: cache answers, no new producer call
    assert!(!watcher.check_and_invalidate(&["account-1"]));
    fetcher.request("eth", || producer(99)).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // account switch: namespace is flushed, next request refetches
    assert!(watcher.check_and_invalidate(&["account-2"]));
    let balance = fetcher.request("eth", || producer(25)).await.unwrap();
    assert_eq!(balance, 25);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
