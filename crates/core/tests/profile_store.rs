//! Integration tests for `ProfileStore`
//!
//! Covers cache hits and misses, per-key fetch coalescing, invalidation and
//! the no-negative-caching rule.

mod support;

use std::sync::Arc;
use std::time::Duration;

use support::fetcher::ScriptedFetcher;
use support::wait_until;
use tokio_test::{assert_err, assert_ok};
use userdeck_core::ProfileStore;
use userdeck_domain::{FetchError, ProfileEntity, ProfileKey, SiteId};

fn key() -> ProfileKey {
    ProfileKey::new(42, Some(7), "site1")
}

fn store_with(fetcher: &Arc<ScriptedFetcher>) -> ProfileStore {
    ProfileStore::new(Arc::clone(fetcher) as Arc<dyn userdeck_core::ProfileFetcher>)
}

// =============================================================================
// Hits and misses
// =============================================================================

#[tokio::test]
async fn first_get_fetches_once() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    let profile = assert_ok!(store.get(&key()).await);

    assert_eq!(profile.id, 42);
    assert_eq!(fetcher.calls(), 1);
    assert_eq!(fetcher.keys(), vec![key()]);
    assert!(store.cached(&key()).is_some());
}

#[tokio::test]
async fn second_get_returns_identical_cached_instance() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    let first = assert_ok!(store.get(&key()).await);
    let second = assert_ok!(store.get(&key()).await);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fetcher.calls(), 1);

    let stats = store.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.fetches, 1);
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn contexts_are_cached_independently() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    let with_context = ProfileKey::new(42, Some(7), "site1");
    let other_context = ProfileKey::new(42, Some(8), "site1");
    let no_context = ProfileKey::without_context(42, "site1");

    for k in [&with_context, &other_context, &no_context] {
        assert_ok!(store.get(k).await);
    }
    for k in [&with_context, &other_context, &no_context] {
        assert_ok!(store.get(k).await);
    }

    assert_eq!(fetcher.calls(), 3);
    assert_eq!(store.len(), 3);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn failure_propagates_and_is_not_cached() {
    let fetcher = Arc::new(ScriptedFetcher::new().then(Err(FetchError::Network("offline".into()))));
    let store = store_with(&fetcher);

    let err = assert_err!(store.get(&key()).await);
    assert_eq!(err, FetchError::Network("offline".into()));
    assert!(store.cached(&key()).is_none());
    assert!(store.is_empty());

    // Next read retries instead of replaying the failure.
    assert_ok!(store.get(&key()).await);
    assert_eq!(fetcher.calls(), 2);
    assert_eq!(store.stats().failures, 1);
}

// =============================================================================
// Coalescing
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_gets_share_one_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::gated());
    let store = Arc::new(store_with(&fetcher));
    let readers = 8;

    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get(&key()).await })
        })
        .collect();

    wait_until(|| store.stats().misses + store.stats().coalesced == readers).await;
    assert!(store.is_fetching(&key()));
    fetcher.release(1);

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(fetcher.calls(), 1);
    assert!(results.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert!(!store.is_fetching(&key()));

    let stats = store.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.coalesced, readers - 1);
    assert_eq!(stats.in_flight, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_gets_share_one_failure() {
    let fetcher =
        Arc::new(ScriptedFetcher::gated().then(Err(FetchError::Auth("invalid token".into()))));
    let store = Arc::new(store_with(&fetcher));
    let readers = 5;

    let handles: Vec<_> = (0..readers)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get(&key()).await })
        })
        .collect();

    wait_until(|| store.stats().misses + store.stats().coalesced == readers).await;
    fetcher.release(1);

    for handle in handles {
        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err, FetchError::Auth("invalid token".into()));
    }

    assert_eq!(fetcher.calls(), 1);
    assert!(store.cached(&key()).is_none());
    assert!(!store.is_fetching(&key()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_keys_fetch_independently() {
    let fetcher = Arc::new(ScriptedFetcher::gated());
    let store = Arc::new(store_with(&fetcher));

    let first = ProfileKey::new(1, None, "site1");
    let second = ProfileKey::new(2, None, "site1");

    let a = {
        let store = Arc::clone(&store);
        let k = first.clone();
        tokio::spawn(async move { store.get(&k).await })
    };
    let b = {
        let store = Arc::clone(&store);
        let k = second.clone();
        tokio::spawn(async move { store.get(&k).await })
    };

    wait_until(|| fetcher.calls() == 2).await;
    assert!(store.is_fetching(&first));
    assert!(store.is_fetching(&second));
    fetcher.release(2);

    assert_eq!(a.await.unwrap().unwrap().id, 1);
    assert_eq!(b.await.unwrap().unwrap().id, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn abandoned_fetch_releases_its_slot() {
    let fetcher = Arc::new(ScriptedFetcher::gated());
    let store = Arc::new(store_with(&fetcher));

    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.get(&key()).await })
    };
    wait_until(|| fetcher.calls() == 1).await;
    assert!(store.is_fetching(&key()));

    reader.abort();
    assert!(reader.await.unwrap_err().is_cancelled());
    wait_until(|| store.stats().in_flight == 0).await;
    assert!(!store.is_fetching(&key()));

    // The next read starts its own request instead of resuming the old one.
    fetcher.release(1);
    assert_ok!(store.get(&key()).await);
    assert_eq!(fetcher.calls(), 2);
    assert!(store.cached(&key()).is_some());
    assert_eq!(store.stats().fetches, 1);
}

// =============================================================================
// Fresh fetches
// =============================================================================

#[tokio::test]
async fn fetch_fresh_bypasses_cache_and_replaces_entry() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    let before = assert_ok!(store.get(&key()).await);
    let fresh = assert_ok!(store.fetch_fresh(&key()).await);

    assert_eq!(fetcher.calls(), 2);
    assert!(!Arc::ptr_eq(&before, &fresh));
    assert!(Arc::ptr_eq(&store.cached(&key()).unwrap().profile, &fresh));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fetch_fresh_waits_out_earlier_fetch_and_is_joined_by_later_reads() {
    let fetcher = Arc::new(ScriptedFetcher::gated());
    let store = Arc::new(store_with(&fetcher));

    let earlier = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.get(&key()).await })
    };
    wait_until(|| fetcher.calls() == 1).await;

    let fresh = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.fetch_fresh(&key()).await })
    };
    fetcher.release(1);
    let earlier = earlier.await.unwrap().unwrap();

    wait_until(|| fetcher.calls() == 2).await;
    store.invalidate(&key());
    let joined = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.get(&key()).await })
    };
    wait_until(|| store.stats().coalesced == 1).await;
    fetcher.release(1);

    let fresh = fresh.await.unwrap().unwrap();
    let joined = joined.await.unwrap().unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert!(!Arc::ptr_eq(&earlier, &fresh));
    assert!(Arc::ptr_eq(&fresh, &joined));
}

// =============================================================================
// Invalidation
// =============================================================================

#[tokio::test]
async fn invalidate_forces_next_get_to_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    let before = assert_ok!(store.get(&key()).await);
    store.invalidate(&key());
    assert!(store.cached(&key()).is_none());

    let after = assert_ok!(store.get(&key()).await);
    assert_eq!(fetcher.calls(), 2);
    assert!(!Arc::ptr_eq(&before, &after));
}

#[tokio::test]
async fn invalidate_missing_key_is_a_noop() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    store.invalidate(&key());
    assert!(store.is_empty());
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalidate_during_fetch_lets_fetch_populate_cache() {
    let fetcher = Arc::new(ScriptedFetcher::gated());
    let store = Arc::new(store_with(&fetcher));

    let pending = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.get(&key()).await })
    };
    wait_until(|| fetcher.calls() == 1).await;

    store.invalidate(&key());
    fetcher.release(1);

    assert_ok!(pending.await.unwrap());
    assert!(store.cached(&key()).is_some());
}

#[tokio::test]
async fn invalidate_user_drops_every_context_for_that_site() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);
    let site1 = SiteId::new("site1");

    for k in [
        ProfileKey::new(42, Some(7), "site1"),
        ProfileKey::new(42, None, "site1"),
        ProfileKey::new(42, Some(7), "site2"),
        ProfileKey::new(43, Some(7), "site1"),
    ] {
        assert_ok!(store.get(&k).await);
    }

    assert_eq!(store.invalidate_user(42, &site1), 2);
    assert_eq!(store.len(), 2);
    assert!(store.cached(&ProfileKey::new(42, Some(7), "site2")).is_some());
    assert!(store.cached(&ProfileKey::new(43, Some(7), "site1")).is_some());
}

#[tokio::test]
async fn clear_site_and_clear() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher);

    for k in [
        ProfileKey::new(1, None, "site1"),
        ProfileKey::new(2, None, "site1"),
        ProfileKey::new(1, None, "site2"),
    ] {
        assert_ok!(store.get(&k).await);
    }

    assert_eq!(store.clear_site(&SiteId::new("site1")), 2);
    assert_eq!(store.len(), 1);

    store.clear();
    assert!(store.is_empty());
}

// =============================================================================
// Expiry
// =============================================================================

#[tokio::test]
async fn expired_entries_are_refetched() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher).with_ttl(Some(Duration::ZERO));

    assert_ok!(store.get(&key()).await);
    assert_ok!(store.get(&key()).await);

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(store.stats().expirations, 1);
}

#[tokio::test]
async fn fresh_entries_survive_ttl() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let store = store_with(&fetcher).with_ttl(Some(Duration::from_secs(3600)));

    assert_ok!(store.get(&key()).await);
    assert_ok!(store.get(&key()).await);

    assert_eq!(fetcher.calls(), 1);
    let cached = store.cached(&key()).unwrap();
    assert!(cached.age() < Duration::from_secs(3600));
}

#[tokio::test]
async fn cached_entry_is_the_fetched_profile() {
    let profile = ProfileEntity {
        id: 42,
        full_name: "Ada Lovelace".into(),
        interests: Some("engines".into()),
        ..ProfileEntity::default()
    };
    let fetcher = Arc::new(ScriptedFetcher::new().then(Ok(profile.clone())));
    let store = store_with(&fetcher);

    let fetched = assert_ok!(store.get(&key()).await);
    let cached = store.cached(&key()).unwrap();

    assert_eq!(*fetched, profile);
    assert!(Arc::ptr_eq(&fetched, &cached.profile));
    assert!(cached.profile.has_details());
    assert!(!cached.profile.has_contact());
}
