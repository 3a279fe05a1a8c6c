use super::{domain_label, normalize_tld};
use async_trait::async_trait;
use brand_core::{DomainChecker, DomainStatus, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Shared TTL cache of domain lookups keyed by normalized label and TLD.
///
/// Clones share storage, so one cache can serve several checkers and sessions.
#[derive(Debug, Clone)]
pub struct DomainCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<(String, String), (DomainStatus, Instant)>>>,
}

impl Default for DomainCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl DomainCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), (DomainStatus, Instant)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, label: &str, tld: &str) -> Option<DomainStatus> {
        let mut entries = self.lock();
        let key = (label.to_string(), tld.to_string());
        match entries.get(&key) {
            Some((status, stored)) if stored.elapsed() < self.ttl => Some(*status),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores a definite answer. `Unknown` is never cached.
    pub fn insert(&self, label: &str, tld: &str, status: DomainStatus) {
        if status == DomainStatus::Unknown {
            return;
        }
        self.lock().insert((label.to_string(), tld.to_string()), (status, Instant::now()));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (_, stored)| stored.elapsed() < ttl);
        before - entries.len()
    }
}

/// Wraps a [`DomainChecker`] and answers repeat lookups from a [`DomainCache`].
pub struct CachedDomainChecker<C> {
    inner: C,
    cache: DomainCache,
}

impl<C: DomainChecker> CachedDomainChecker<C> {
    pub fn new(inner: C, cache: DomainCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &DomainCache {
        &self.cache
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: DomainChecker> DomainChecker for CachedDomainChecker<C> {
    async fn check_domains(
        &self,
        name: &str,
        tlds: &[String],
    ) -> Result<BTreeMap<String, DomainStatus>> {
        let label = domain_label(name);
        let mut results = BTreeMap::new();
        let mut misses = Vec::new();

        for tld in tlds.iter().map(|t| normalize_tld(t)) {
            match self.cache.get(&label, &tld) {
                Some(status) => {
                    results.insert(tld, status);
                }
                None => misses.push(tld),
            }
        }

        debug!(name = %label, hits = results.len(), misses = misses.len(), "domain cache lookup");
        if misses.is_empty() {
            return Ok(results);
        }

        let fresh = self.inner.check_domains(name, &misses).await?;
        for tld in misses {
            let status = fresh.get(&tld).copied().unwrap_or(DomainStatus::Unknown);
            self.cache.insert(&label, &tld, status);
            results.insert(tld, status);
        }
        Ok(results)
    }
}
