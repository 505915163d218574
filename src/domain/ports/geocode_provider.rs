//! Geocode Provider Port
//!
//! Defines the interface for resolving addresses to coordinates.

use crate::domain::entities::Location;
use crate::error::ProviderError;
use async_trait::async_trait;

/// External geocoding service.
///
/// This is an outbound port that abstracts the geocoding backend.
/// Implementations may call a web API or answer from a canned table.
/// The provider is handed to the cache at construction; there is no
/// process-wide default.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Resolve a free-text query.
    ///
    /// Returns every candidate the backend offered, best first. An empty
    /// vector or [`ProviderError::NotFound`] means the query could not be
    /// geocoded; other errors mean the lookup did not complete.
    async fn locate(&self, query: &str) -> Result<Vec<Location>, ProviderError>;

    /// Resolve a structured location.
    ///
    /// Defaults to locating the location's one-line rendering.
    async fn locate_location(&self, location: &Location) -> Result<Vec<Location>, ProviderError> {
        self.locate(&location.to_string()).await
    }
}
