//! Geocode Repository Port
//!
//! Defines the interface for the geocode cache storage.
//! Implementations may use SQLite or in-memory storage.

use crate::domain::entities::Geocode;
use crate::error::RepositoryError;
use async_trait::async_trait;

/// Storage for resolved geocodes, unique by normalized query.
#[async_trait]
pub trait GeocodeRepository: Send + Sync {
    /// Find a geocode by its exact normalized query.
    async fn find_by_query(&self, query: &str) -> Result<Option<Geocode>, RepositoryError>;

    /// Find a geocode by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Geocode>, RepositoryError>;

    /// Store `geocode` unless its query is already taken.
    ///
    /// Returns the stored record: the new one, or the one that won the key
    /// first. Unresolved geocodes are rejected with
    /// [`RepositoryError::Unresolved`].
    async fn insert_if_absent(&self, geocode: Geocode) -> Result<Geocode, RepositoryError>;

    /// Delete a geocode together with every geocoding that references it.
    /// Returns whether a geocode was removed.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Number of stored geocodes.
    async fn count(&self) -> Result<usize, RepositoryError>;
}
