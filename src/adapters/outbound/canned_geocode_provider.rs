//! Canned Geocode Provider
//!
//! Implements GeocodeProvider from a fixed table of answers keyed by the
//! literal (trimmed) query. Used for offline runs and tests.

use crate::domain::entities::Location;
use crate::domain::ports::GeocodeProvider;
use crate::domain::value_objects::Precision;
use crate::error::ProviderError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Deterministic provider with optional failure injection.
///
/// Unknown queries answer [`ProviderError::NotFound`]. Queries registered
/// with [`CannedGeocodeProvider::fail`] answer a transport error.
#[derive(Default)]
pub struct CannedGeocodeProvider {
    responses: DashMap<String, Vec<Location>>,
    failures: DashMap<String, String>,
    calls: DashMap<String, usize>,
    total_calls: AtomicUsize,
    delay: Option<Duration>,
}

impl CannedGeocodeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider preloaded with a handful of well-known places.
    pub fn fixtures() -> Self {
        let provider = Self::new();

        let san_francisco = Location::new()
            .locality("San Francisco")
            .region("CA")
            .postal_code("94110")
            .country("US")
            .coordinates(37.775206, -122.419209)
            .precision(Precision::Street);
        provider.respond("San Francisco", san_francisco.clone());
        provider.respond("San Francisco, CA", san_francisco);

        let saugatuck = Location::new()
            .locality("Saugatuck")
            .region("MI")
            .postal_code("49406")
            .country("US")
            .coordinates(42.654781, -86.200722)
            .precision(Precision::Locality);
        provider.respond("49406", saugatuck.clone());
        provider.respond("Saugatuck, MI", saugatuck.clone());
        provider.respond("Saugatuck, MI 49406", saugatuck);

        let white_house = Location::new()
            .street("1600 Pennsylvania Ave NW")
            .locality("Washington")
            .region("DC")
            .postal_code("20502")
            .country("US")
            .coordinates(38.898748, -77.037684)
            .precision(Precision::Address);
        provider.respond("1600 Pennsylvania Ave NW\nWashington, DC 20502", white_house);

        provider
    }

    /// Answer `query` with a single location.
    pub fn respond(&self, query: impl Into<String>, location: Location) {
        self.respond_all(query, vec![location]);
    }

    /// Answer `query` with several candidates, best first.
    pub fn respond_all(&self, query: impl Into<String>, locations: Vec<Location>) {
        self.responses.insert(query.into().trim().to_string(), locations);
    }

    /// Make `query` fail as if the provider were unreachable.
    pub fn fail(&self, query: impl Into<String>, reason: impl Into<String>) {
        self.failures.insert(query.into().trim().to_string(), reason.into());
    }

    /// Sleep this long before every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of lookups received for `query`.
    pub fn calls_for(&self, query: &str) -> usize {
        self.calls.get(query.trim()).map(|c| *c).unwrap_or(0)
    }

    /// Number of lookups received in total.
    pub fn calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodeProvider for CannedGeocodeProvider {
    async fn locate(&self, query: &str) -> Result<Vec<Location>, ProviderError> {
        let query = query.trim();
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self.calls.entry(query.to_string()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(reason) = self.failures.get(query) {
            return Err(ProviderError::Transport(reason.value().clone()));
        }

        self.responses
            .get(query)
            .map(|r| r.value().clone())
            .ok_or_else(|| ProviderError::NotFound(query.to_string()))
    }
}
