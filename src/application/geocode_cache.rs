//! Geocode Cache - find-or-create use cases
//!
//! Resolves queries and structured locations to stored geocodes, calling
//! the provider only on a cache miss.

use crate::domain::entities::{Geocode, Location};
use crate::domain::ports::{GeocodeProvider, GeocodeRepository};
use crate::error::{ProviderError, Result};
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Default bound on a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Deduplicating geocode cache.
///
/// Every successful lookup is stored under its normalized query. Concurrent
/// misses on one key inside this process wait on a per-key lock so the
/// provider is asked once; across processes the repository's
/// insert-if-absent keeps one record per key.
pub struct GeocodeCache {
    repository: Arc<dyn GeocodeRepository>,
    provider: Arc<dyn GeocodeProvider>,
    timeout: Duration,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

/// Registration of one caller in the per-key lock table.
///
/// Dropping it releases the entry once no other caller shares the lock,
/// including when the owning future is cancelled mid-lookup.
struct InFlight<'a> {
    table: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    lock: Arc<Mutex<()>>,
}

impl<'a> InFlight<'a> {
    fn enter(table: &'a DashMap<String, Arc<Mutex<()>>>, key: String) -> Self {
        let lock = table
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { table, key, lock }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        // Only the table and this caller hold the lock: nobody else is waiting
        self.table
            .remove_if(&self.key, |_, l| Arc::strong_count(l) <= 2);
    }
}

impl GeocodeCache {
    pub fn new(repository: Arc<dyn GeocodeRepository>, provider: Arc<dyn GeocodeProvider>) -> Self {
        Self {
            repository,
            provider,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
            in_flight: DashMap::new(),
        }
    }

    /// Bound every provider call by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn repository(&self) -> &Arc<dyn GeocodeRepository> {
        &self.repository
    }

    /// Cache key for a query: trimmed and lowercased.
    pub fn normalize_query(query: &str) -> String {
        query.trim().to_lowercase()
    }

    /// Stored geocode for `query`, without asking the provider.
    pub async fn find_by_query(&self, query: &str) -> Result<Option<Geocode>> {
        let key = Self::normalize_query(query);
        if key.is_empty() {
            return Ok(None);
        }
        Ok(self.repository.find_by_query(&key).await?)
    }

    /// Geocode for a free-text query, resolving and storing it on a miss.
    ///
    /// Returns `Ok(None)` for blank or unresolvable queries.
    pub async fn find_or_create_by_query(&self, query: &str) -> Result<Option<Geocode>> {
        let key = Self::normalize_query(query);
        let provider = self.provider.clone();
        let lookup = query.trim().to_string();

        self.find_or_create(key, move || async move { provider.locate(&lookup).await })
            .await
    }

    /// Geocode for a structured location, keyed by its rendered address.
    pub async fn find_or_create_by_location(&self, location: &Location) -> Result<Option<Geocode>> {
        let key = Self::normalize_query(&location.to_string());
        let provider = self.provider.clone();
        let location = location.clone();

        self.find_or_create(key, move || async move { provider.locate_location(&location).await })
            .await
    }

    async fn find_or_create<F, Fut>(&self, key: String, lookup: F) -> Result<Option<Geocode>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Vec<Location>, ProviderError>>,
    {
        if key.is_empty() {
            return Ok(None);
        }

        if let Some(geocode) = self.repository.find_by_query(&key).await? {
            tracing::debug!("geocode cache hit for {:?}", key);
            return Ok(Some(geocode));
        }

        let in_flight = InFlight::enter(&self.in_flight, key);
        let _guard = in_flight.lock.lock().await;
        self.resolve_miss(&in_flight.key, lookup).await
    }

    async fn resolve_miss<F, Fut>(&self, key: &str, lookup: F) -> Result<Option<Geocode>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<Vec<Location>, ProviderError>>,
    {
        // Another task may have stored it while we waited
        if let Some(geocode) = self.repository.find_by_query(key).await? {
            tracing::debug!("geocode for {:?} stored while waiting", key);
            return Ok(Some(geocode));
        }

        let locations = match tokio::time::timeout(self.timeout, lookup()).await {
            Ok(Ok(locations)) => locations,
            Ok(Err(ProviderError::NotFound(_))) => {
                tracing::warn!("could not geocode {:?}", key);
                return Ok(None);
            }
            Ok(Err(e)) => {
                tracing::warn!("geocoding {:?} failed: {}", key, e);
                return Err(e.into());
            }
            Err(_) => {
                tracing::warn!("geocoding {:?} timed out after {:?}", key, self.timeout);
                return Err(ProviderError::Timeout(self.timeout).into());
            }
        };

        let Some(first) = locations.into_iter().next() else {
            tracing::warn!("could not geocode {:?}", key);
            return Ok(None);
        };

        if !first.is_resolved() {
            tracing::warn!("could not geocode {:?}: result has no coordinates", key);
            return Ok(None);
        }

        let stored = self
            .repository
            .insert_if_absent(Geocode::from_location(key, &first))
            .await?;
        tracing::info!("stored geocode {} for {:?}", stored, key);

        Ok(Some(stored))
    }
}
