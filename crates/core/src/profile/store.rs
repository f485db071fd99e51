//! Profile store - cache of remote profiles with coalesced fetches
//!
//! Entries are keyed by [`ProfileKey`]. A miss starts a remote fetch that is
//! registered per key; every concurrent reader of the same key awaits that
//! one fetch instead of issuing its own. The fetch itself writes the result
//! into the cache and then deregisters, so the cache is populated exactly
//! once no matter how many readers were waiting.
//!
//! The registry only holds weak handles. When every waiter of a fetch is
//! dropped before it finishes, the fetch is cancelled and its slot is
//! released, so the next read starts a new request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use tracing::{debug, warn};
use userdeck_domain::{FetchResult, ProfileEntity, ProfileKey, SiteId};

use super::ports::ProfileFetcher;
use super::stats::{MetricsCollector, ProfileCacheStats};

type FetchFuture = BoxFuture<'static, FetchResult<Arc<ProfileEntity>>>;
type SharedFetch = Shared<FetchFuture>;

/// Registry slot for an outstanding fetch
struct InFlight {
    id: u64,
    fetch: WeakShared<FetchFuture>,
}

/// Releases a fetch's registry slot when the fetch finishes or is dropped
struct InFlightGuard {
    store: Weak<StoreInner>,
    key: ProfileKey,
    id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.in_flight.remove_if(&self.key, |_, slot| slot.id == self.id);
        }
    }
}

/// A cached profile together with the time it was fetched
#[derive(Debug, Clone)]
pub struct CachedProfile {
    pub profile: Arc<ProfileEntity>,
    pub fetched_at: DateTime<Utc>,
    loaded_at: Instant,
}

impl CachedProfile {
    fn new(profile: Arc<ProfileEntity>) -> Self {
        Self { profile, fetched_at: Utc::now(), loaded_at: Instant::now() }
    }

    /// Time elapsed since the profile was stored.
    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.is_some_and(|ttl| self.age() >= ttl)
    }
}

struct StoreInner {
    fetcher: Arc<dyn ProfileFetcher>,
    entries: DashMap<ProfileKey, CachedProfile>,
    in_flight: DashMap<ProfileKey, InFlight>,
    next_fetch_id: AtomicU64,
    metrics: MetricsCollector,
}

impl StoreInner {
    /// Record the outcome of a fetch. Runs once per fetch, inside the shared
    /// future, before the registry slot is released and before any waiter
    /// observes the result.
    fn complete(&self, key: &ProfileKey, result: &FetchResult<Arc<ProfileEntity>>) {
        match result {
            Ok(profile) => {
                self.entries.insert(key.clone(), CachedProfile::new(Arc::clone(profile)));
                self.metrics.record_fetch();
                debug!(
                    user_id = key.user_id,
                    context_id = ?key.context_id,
                    site_id = %key.site_id,
                    "profile fetched and cached"
                );
            }
            Err(err) => {
                self.metrics.record_failure();
                warn!(
                    user_id = key.user_id,
                    context_id = ?key.context_id,
                    site_id = %key.site_id,
                    error = %err,
                    kind = err.label(),
                    "profile fetch failed"
                );
            }
        }
    }
}

/// Single source of truth for profile data
///
/// Cloning is cheap and yields a handle to the same cache.
#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<StoreInner>,
    ttl: Option<Duration>,
}

impl ProfileStore {
    /// Create a store that delegates misses to `fetcher`.
    pub fn new(fetcher: Arc<dyn ProfileFetcher>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                fetcher,
                entries: DashMap::new(),
                in_flight: DashMap::new(),
                next_fetch_id: AtomicU64::new(0),
                metrics: MetricsCollector::default(),
            }),
            ttl: None,
        }
    }

    /// Expire entries older than `ttl`. `None` keeps them until invalidated.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Return the profile for `key`, fetching it on a miss.
    ///
    /// Concurrent callers for the same key share one remote fetch and all
    /// receive its result. Failures are not cached.
    ///
    /// # Errors
    /// Returns the fetcher's `FetchError` unchanged.
    pub async fn get(&self, key: &ProfileKey) -> FetchResult<Arc<ProfileEntity>> {
        if let Some(profile) = self.lookup(key) {
            self.inner.metrics.record_hit();
            debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "profile cache hit");
            return Ok(profile);
        }

        let fetch = {
            let slot = self.inner.in_flight.entry(key.clone());
            match Self::live_fetch(&slot) {
                Some(pending) => {
                    self.inner.metrics.record_coalesced();
                    debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "joining in-flight profile fetch");
                    pending
                }
                None => {
                    // A fetch may have completed between the lookup above and
                    // taking the registry slot.
                    if let Some(profile) = self.lookup(key) {
                        self.inner.metrics.record_hit();
                        return Ok(profile);
                    }
                    self.inner.metrics.record_miss();
                    debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "profile cache miss");
                    self.register_fetch(slot)
                }
            }
        };

        fetch.await
    }

    /// Fetch `key` from the source with a request that starts after this
    /// call, bypassing the cache.
    ///
    /// A fetch already in flight for `key` is awaited and its result
    /// discarded before the new one is registered. Readers arriving while
    /// the new fetch runs join it.
    ///
    /// # Errors
    /// Returns the fetcher's `FetchError` unchanged.
    pub async fn fetch_fresh(&self, key: &ProfileKey) -> FetchResult<Arc<ProfileEntity>> {
        let fetch = loop {
            let earlier = {
                let slot = self.inner.in_flight.entry(key.clone());
                match Self::live_fetch(&slot) {
                    Some(earlier) => earlier,
                    None => break self.register_fetch(slot),
                }
            };
            debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "waiting out earlier profile fetch");
            let _ = earlier.await;
        };

        debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "fetching fresh profile");
        fetch.await
    }

    /// Drop the cached entry for `key`, if any.
    ///
    /// A fetch already in flight for `key` is left alone and may repopulate
    /// the cache when it completes.
    pub fn invalidate(&self, key: &ProfileKey) {
        if self.inner.entries.remove(key).is_some() {
            debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "profile invalidated");
        }
    }

    /// Drop every context's entry for one user on one site.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_user(&self, user_id: i64, site_id: &SiteId) -> usize {
        let removed = self.remove_where(|key| key.user_id == user_id && &key.site_id == site_id);
        debug!(user_id, site_id = %site_id, removed, "user profiles invalidated");
        removed
    }

    /// Drop every entry belonging to `site_id`.
    pub fn clear_site(&self, site_id: &SiteId) -> usize {
        let removed = self.remove_where(|key| &key.site_id == site_id);
        debug!(site_id = %site_id, removed, "site profiles cleared");
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.inner.entries.clear();
        debug!("profile cache cleared");
    }

    /// Inspect the cached entry for `key` without fetching.
    pub fn cached(&self, key: &ProfileKey) -> Option<CachedProfile> {
        self.inner
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| entry.value().clone())
    }

    /// True while a remote fetch for `key` is outstanding.
    pub fn is_fetching(&self, key: &ProfileKey) -> bool {
        self.inner.in_flight.get(key).is_some_and(|slot| slot.fetch.upgrade().is_some())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn stats(&self) -> ProfileCacheStats {
        self.inner.metrics.snapshot(self.inner.entries.len(), self.inner.in_flight.len())
    }

    fn lookup(&self, key: &ProfileKey) -> Option<Arc<ProfileEntity>> {
        {
            let entry = self.inner.entries.get(key)?;
            if !entry.is_expired(self.ttl) {
                return Some(Arc::clone(&entry.profile));
            }
        }

        let ttl = self.ttl;
        if self.inner.entries.remove_if(key, |_, entry| entry.is_expired(ttl)).is_some() {
            self.inner.metrics.record_expiration();
            debug!(user_id = key.user_id, context_id = ?key.context_id, site_id = %key.site_id, "cached profile expired");
        }
        None
    }

    /// The fetch registered in `slot`, unless it has been abandoned.
    fn live_fetch(slot: &Entry<'_, ProfileKey, InFlight>) -> Option<SharedFetch> {
        match slot {
            Entry::Occupied(pending) => pending.get().fetch.upgrade(),
            Entry::Vacant(_) => None,
        }
    }

    /// Start a fetch for the slot's key and record it in the slot,
    /// replacing any abandoned fetch left there.
    fn register_fetch(&self, slot: Entry<'_, ProfileKey, InFlight>) -> SharedFetch {
        let id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let fetch = self.start_fetch(slot.key().clone(), id);
        if let Some(weak) = fetch.downgrade() {
            slot.insert(InFlight { id, fetch: weak });
        }
        fetch
    }

    fn start_fetch(&self, key: ProfileKey, id: u64) -> SharedFetch {
        let fetcher = Arc::clone(&self.inner.fetcher);
        let registry: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let guard = InFlightGuard { store: Weak::clone(&registry), key: key.clone(), id };

        async move {
            let result = fetcher.fetch_profile(&key).await.map(Arc::new);
            if let Some(inner) = registry.upgrade() {
                inner.complete(&key, &result);
            }
            drop(guard);
            result
        }
        .boxed()
        .shared()
    }

    fn remove_where(&self, predicate: impl Fn(&ProfileKey) -> bool) -> usize {
        let mut removed = 0;
        self.inner.entries.retain(|key, _| {
            let matched = predicate(key);
            if matched {
                removed += 1;
            }
            !matched
        });
        removed
    }
}
