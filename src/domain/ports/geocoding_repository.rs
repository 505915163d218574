//! Geocoding Repository Port
//!
//! Defines the interface for entity-to-geocode associations.

use crate::domain::entities::Geocoding;
use crate::domain::value_objects::{EntityKind, GeocodableRef};
use crate::error::RepositoryError;
use async_trait::async_trait;

/// Repository for entity-to-geocode associations.
///
/// Each entity carries at most one geocoding; setting a new one replaces
/// the old.
#[async_trait]
pub trait GeocodingRepository: Send + Sync {
    /// Get the geocoding for an entity, if one exists.
    async fn get(&self, entity: &GeocodableRef) -> Result<Option<Geocoding>, RepositoryError>;

    /// Bind an entity to a geocode, replacing any previous binding.
    ///
    /// Fails with [`RepositoryError::UnknownGeocode`] when no geocode has
    /// `geocode_id`.
    async fn set(&self, entity: GeocodableRef, geocode_id: i64) -> Result<Geocoding, RepositoryError>;

    /// Remove the geocoding for an entity. Returns whether one existed.
    async fn remove(&self, entity: &GeocodableRef) -> Result<bool, RepositoryError>;

    /// Every entity bound to a geocode.
    async fn for_geocode(&self, geocode_id: i64) -> Result<Vec<GeocodableRef>, RepositoryError>;

    /// Every geocoding for one entity kind, ordered by entity id.
    async fn of_kind(&self, kind: &EntityKind) -> Result<Vec<Geocoding>, RepositoryError>;

    /// Total number of geocodings.
    async fn count(&self) -> Result<usize, RepositoryError>;
}
