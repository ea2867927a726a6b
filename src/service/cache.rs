// service/cache.rs
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::service::error::ServiceError;

/// Cache TTL constants (in seconds)
pub const REPUTATION_CACHE_TTL: u64 = 120; // 2 minutes
pub const ROLE_CACHE_TTL: u64 = 60; // 1 minute

/// Stable query identities.
pub mod keys {
    pub const JOBS: &str = "jobs";
    pub const ESCROWS: &str = "escrows";
    pub const PROFILES: &str = "profiles";
    pub const CANDIDATES: &str = "candidates";
    pub const JOB_PREFIX: &str = "job:";
    pub const APPLICATIONS_PREFIX: &str = "applications:";
    pub const REPUTATION_PREFIX: &str = "reputation:";
    pub const ROLES_PREFIX: &str = "roles:";

    pub fn job(job_id: &str) -> String {
        format!("{}{}", JOB_PREFIX, job_id)
    }

    pub fn applications(job_id: &str) -> String {
        format!("{}{}", APPLICATIONS_PREFIX, job_id)
    }

    pub fn reputation(address: &str) -> String {
        format!("{}{}", REPUTATION_PREFIX, address)
    }

    pub fn roles(address: &str) -> String {
        format!("{}{}", ROLES_PREFIX, address)
    }

    pub fn is_known(key: &str) -> bool {
        matches!(key, JOBS | ESCROWS | PROFILES | CANDIDATES)
            || [JOB_PREFIX, APPLICATIONS_PREFIX, REPUTATION_PREFIX, ROLES_PREFIX]
                .iter()
                .any(|prefix| key.strip_prefix(prefix).map_or(false, |rest| !rest.is_empty()))
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.stored_at.elapsed() < self.ttl
    }
}

#[derive(Debug, Default)]
struct InFlight {
    generation: u64,
    fetches: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    /// Keys with a fetch running. Invalidation bumps the generation, and a
    /// fetch stores its result only if the generation it started under is
    /// still current. A key leaves this map when its last fetch ends.
    in_flight: HashMap<String, InFlight>,
}

impl CacheState {
    fn begin(&mut self, key: &str) -> u64 {
        let in_flight = self.in_flight.entry(key.to_string()).or_default();
        in_flight.fetches += 1;
        in_flight.generation
    }

    /// Ends one fetch of `key`, returning the generation current at its end.
    fn finish(&mut self, key: &str) -> Option<u64> {
        let in_flight = self.in_flight.get_mut(key)?;
        let generation = in_flight.generation;
        in_flight.fetches = in_flight.fetches.saturating_sub(1);
        if in_flight.fetches == 0 {
            self.in_flight.remove(key);
        }
        Some(generation)
    }

    fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
        if let Some(in_flight) = self.in_flight.get_mut(key) {
            in_flight.generation += 1;
        }
    }

    fn sweep(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh());
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!("Cache EVICT: {} expired entries", evicted);
        }
    }
}

/// Marks a fetch of `key` as running until it is finished or dropped, so a
/// cancelled fetch does not leave its key behind.
struct FetchGuard<'a> {
    cache: &'a QueryCache,
    key: &'a str,
    generation: u64,
    finished: bool,
}

impl<'a> FetchGuard<'a> {
    /// True when nothing invalidated `key` since the fetch began.
    fn finish(mut self, state: &mut CacheState) -> bool {
        self.finished = true;
        state.finish(self.key) == Some(self.generation)
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.cache.lock().finish(self.key);
        }
    }
}

/// Process-scoped query cache keyed by query identity. Expired entries are
/// dropped when read and swept whenever a value is stored.
pub struct QueryCache {
    state: Mutex<CacheState>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    pub fn new(default_ttl_secs: u64) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            default_ttl: Duration::from_secs(default_ttl_secs),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // Never held across an await.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fresh cached value for `key`, or the result of `fetch`, which is stored
    /// unless `key` was invalidated while it ran. Fetch errors are returned
    /// and nothing is stored.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let guard = {
            let mut state = self.lock();
            match state.entries.get(key) {
                Some(entry) if entry.is_fresh() => match serde_json::from_value::<T>(entry.value.clone()) {
                    Ok(value) => {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!("Cache HIT: {}", key);
                        return Ok(value);
                    }
                    Err(e) => tracing::warn!("Cache deserialization failed for {}: {}", key, e),
                },
                Some(_) => {
                    state.entries.remove(key);
                }
                None => {}
            }
            FetchGuard {
                cache: self,
                key,
                generation: state.begin(key),
                finished: false,
            }
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Cache MISS: {}", key);

        let value = fetch().await?;
        let serialized = serde_json::to_value(&value).map_err(|e| ServiceError::Cache(e.to_string()))?;

        let mut state = self.lock();
        if guard.finish(&mut state) {
            state.sweep();
            state.entries.insert(
                key.to_string(),
                CacheEntry {
                    value: serialized,
                    stored_at: Instant::now(),
                    ttl,
                },
            );
            tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl.as_secs());
        } else {
            tracing::debug!("Cache SKIP: {} was invalidated during fetch", key);
        }

        Ok(value)
    }

    pub async fn invalidate(&self, key: &str) {
        self.lock().invalidate(key);
        tracing::debug!("Cache DELETE: {}", key);
    }

    /// Drop every key starting with `prefix`, including keys whose fetch is in flight.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut state = self.lock();
        let mut matching: Vec<String> = state
            .entries
            .keys()
            .chain(state.in_flight.keys())
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        matching.sort();
        matching.dedup();

        for key in &matching {
            state.invalidate(key);
        }
        tracing::debug!("Cache DELETE pattern: {}* ({} keys)", prefix, matching.len());
    }

    /// Invalidate then fetch again, storing the new value.
    pub async fn refetch<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        self.invalidate(key).await;
        self.get_or_fetch(key, ttl, fetch).await
    }

    /// Counters plus the number of live entries; expired ones are swept first.
    pub async fn stats(&self) -> CacheStats {
        let mut state = self.lock();
        state.sweep();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: state.entries.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}
