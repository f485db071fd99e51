use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use userdeck_core::ProfileFetcher;
use userdeck_domain::{FetchResult, ProfileEntity, ProfileKey};

use super::profile_for;

/// In-memory `ProfileFetcher` that counts calls.
///
/// Queued outcomes are returned first (one per call); afterwards every call
/// succeeds with [`profile_for`]. A gated fetcher parks each call until the
/// test releases it, which keeps a fetch in flight for as long as needed.
#[derive(Default)]
pub struct ScriptedFetcher {
    calls: AtomicUsize,
    keys: Mutex<Vec<ProfileKey>>,
    outcomes: Mutex<VecDeque<FetchResult<ProfileEntity>>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls block until [`ScriptedFetcher::release`] hands out a permit.
    pub fn gated() -> Self {
        Self { gate: Some(Arc::new(Semaphore::new(0))), ..Self::default() }
    }

    /// Queue the outcome of the next unscripted call.
    pub fn then(self, outcome: FetchResult<ProfileEntity>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    /// Queue an outcome on a shared fetcher.
    pub fn push(&self, outcome: FetchResult<ProfileEntity>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Let `count` parked calls proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> Vec<ProfileKey> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileFetcher for ScriptedFetcher {
    async fn fetch_profile(&self, key: &ProfileKey) -> FetchResult<ProfileEntity> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let scripted = self.outcomes.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(profile_for(key)))
    }
}
