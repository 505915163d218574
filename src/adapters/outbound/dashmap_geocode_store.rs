//! DashMap Geocode Store
//!
//! Implements GeocodeRepository and GeocodingRepository using DashMap for
//! lock-free concurrent access within one process.

use crate::domain::entities::{Geocode, Geocoding};
use crate::domain::ports::{GeocodeRepository, GeocodingRepository};
use crate::domain::value_objects::{EntityKind, GeocodableRef};
use crate::error::RepositoryError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// DashMap-backed geocode and geocoding store.
///
/// The query index entry API is the compare-and-insert: the first writer
/// for a key wins and later writers get the stored record back.
pub struct DashMapGeocodeStore {
    geocodes: Arc<DashMap<i64, Geocode>>,
    by_query: Arc<DashMap<String, i64>>,
    geocodings: Arc<DashMap<GeocodableRef, Geocoding>>,
    next_geocode_id: AtomicI64,
    next_geocoding_id: AtomicI64,
}

impl DashMapGeocodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            geocodes: Arc::new(DashMap::new()),
            by_query: Arc::new(DashMap::new()),
            geocodings: Arc::new(DashMap::new()),
            next_geocode_id: AtomicI64::new(1),
            next_geocoding_id: AtomicI64::new(1),
        }
    }
}

impl Default for DashMapGeocodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeocodeRepository for DashMapGeocodeStore {
    async fn find_by_query(&self, query: &str) -> Result<Option<Geocode>, RepositoryError> {
        let id = match self.by_query.get(query) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.geocodes.get(&id).map(|e| e.value().clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Geocode>, RepositoryError> {
        Ok(self.geocodes.get(&id).map(|e| e.value().clone()))
    }

    async fn insert_if_absent(&self, mut geocode: Geocode) -> Result<Geocode, RepositoryError> {
        if !geocode.is_geocoded() {
            return Err(RepositoryError::Unresolved(geocode.query));
        }

        match self.by_query.entry(geocode.query.clone()) {
            Entry::Occupied(existing) => {
                let id = *existing.get();
                drop(existing);
                tracing::debug!("geocode for {:?} already stored as {}", geocode.query, id);
                // The winner inserts into `geocodes` before releasing the entry
                Ok(self
                    .geocodes
                    .get(&id)
                    .map(|e| e.value().clone())
                    .unwrap_or(geocode))
            }
            Entry::Vacant(slot) => {
                let id = self.next_geocode_id.fetch_add(1, Ordering::SeqCst);
                geocode.id = Some(id);
                self.geocodes.insert(id, geocode.clone());
                slot.insert(id);
                Ok(geocode)
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let Some((_, geocode)) = self.geocodes.remove(&id) else {
            return Ok(false);
        };
        self.by_query.remove(&geocode.query);
        self.geocodings.retain(|_, g| g.geocode_id != id);
        Ok(true)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.geocodes.len())
    }
}

#[async_trait]
impl GeocodingRepository for DashMapGeocodeStore {
    async fn get(&self, entity: &GeocodableRef) -> Result<Option<Geocoding>, RepositoryError> {
        Ok(self.geocodings.get(entity).map(|e| e.value().clone()))
    }

    async fn set(&self, entity: GeocodableRef, geocode_id: i64) -> Result<Geocoding, RepositoryError> {
        if !self.geocodes.contains_key(&geocode_id) {
            tracing::warn!("cannot bind {} to missing geocode {}", entity, geocode_id);
            return Err(RepositoryError::UnknownGeocode(geocode_id));
        }

        match self.geocodings.entry(entity.clone()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().geocode_id = geocode_id;
                Ok(existing.get().clone())
            }
            Entry::Vacant(slot) => {
                let geocoding = Geocoding {
                    id: self.next_geocoding_id.fetch_add(1, Ordering::SeqCst),
                    geocode_id,
                    geocodable: entity,
                };
                slot.insert(geocoding.clone());
                Ok(geocoding)
            }
        }
    }

    async fn remove(&self, entity: &GeocodableRef) -> Result<bool, RepositoryError> {
        Ok(self.geocodings.remove(entity).is_some())
    }

    async fn for_geocode(&self, geocode_id: i64) -> Result<Vec<GeocodableRef>, RepositoryError> {
        let mut entities: Vec<GeocodableRef> = self
            .geocodings
            .iter()
            .filter(|e| e.value().geocode_id == geocode_id)
            .map(|e| e.key().clone())
            .collect();
        entities.sort_by(|a, b| a.kind.cmp(&b.kind).then(a.id.cmp(&b.id)));
        Ok(entities)
    }

    async fn of_kind(&self, kind: &EntityKind) -> Result<Vec<Geocoding>, RepositoryError> {
        let mut geocodings: Vec<Geocoding> = self
            .geocodings
            .iter()
            .filter(|e| e.key().kind == *kind)
            .map(|e| e.value().clone())
            .collect();
        geocodings.sort_by_key(|g| g.geocodable.id);
        Ok(geocodings)
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.geocodings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Location;

    fn resolved(query: &str) -> Geocode {
        Geocode::from_location(query, &Location::new().coordinates(42.654781, -86.200722))
    }

    // ===== Geocode Tests =====

    #[tokio::test]
    async fn test_insert_and_find_by_query() {
        let store = DashMapGeocodeStore::new();

        let stored = store.insert_if_absent(resolved("saugatuck, mi")).await.unwrap();
        assert!(stored.id.is_some());

        let found = store.find_by_query("saugatuck, mi").await.unwrap();
        assert_eq!(found, Some(stored.clone()));

        let by_id = store.find_by_id(stored.id.unwrap()).await.unwrap();
        assert_eq!(by_id, Some(stored));
    }

    #[tokio::test]
    async fn test_find_nonexistent() {
        let store = DashMapGeocodeStore::new();
        assert!(store.find_by_query("nowhere").await.unwrap().is_none());
        assert!(store.find_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_existing_query_returns_winner() {
        let store = DashMapGeocodeStore::new();

        let first = store.insert_if_absent(resolved("49406")).await.unwrap();
        let mut loser = resolved("49406");
        loser.locality = Some("Douglas".to_string());
        let second = store.insert_if_absent(loser).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(GeocodeRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_unresolved_is_rejected() {
        let store = DashMapGeocodeStore::new();
        let unresolved = Geocode {
            query: "fail!".to_string(),
            ..Geocode::default()
        };

        let result = store.insert_if_absent(unresolved).await;
        assert!(matches!(result, Err(RepositoryError::Unresolved(_))));
        assert_eq!(GeocodeRepository::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_converge() {
        let store = Arc::new(DashMapGeocodeStore::new());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_if_absent(resolved("holland, mi")).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().id);
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(GeocodeRepository::count(store.as_ref()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_geocodings() {
        let store = DashMapGeocodeStore::new();
        let geocode = store.insert_if_absent(resolved("saugatuck, mi")).await.unwrap();
        let id = geocode.id.unwrap();
        store.set(GeocodableRef::new("vacation", 1), id).await.unwrap();

        assert!(store.delete(id).await.unwrap());
        assert!(store.find_by_query("saugatuck, mi").await.unwrap().is_none());
        assert_eq!(GeocodingRepository::count(&store).await.unwrap(), 0);
        assert!(!store.delete(id).await.unwrap());
    }

    // ===== Geocoding Tests =====

    async fn stored_ids(store: &DashMapGeocodeStore, queries: &[&str]) -> Vec<i64> {
        let mut ids = Vec::new();
        for query in queries {
            ids.push(store.insert_if_absent(resolved(query)).await.unwrap().id.unwrap());
        }
        ids
    }

    #[tokio::test]
    async fn test_set_replaces_existing_geocoding() {
        let store = DashMapGeocodeStore::new();
        let ids = stored_ids(&store, &["49406", "holland, mi"]).await;
        let entity = GeocodableRef::new("vacation", 1);

        let first = store.set(entity.clone(), ids[0]).await.unwrap();
        let replaced = store.set(entity.clone(), ids[1]).await.unwrap();

        assert_eq!(replaced.id, first.id);
        assert_eq!(store.get(&entity).await.unwrap().unwrap().geocode_id, ids[1]);
        assert_eq!(GeocodingRepository::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_rejects_unknown_geocode() {
        let store = DashMapGeocodeStore::new();

        let result = store.set(GeocodableRef::new("city", 1), 42).await;
        assert!(matches!(result, Err(RepositoryError::UnknownGeocode(42))));
        assert_eq!(GeocodingRepository::count(&store).await.unwrap(), 0);

        let id = stored_ids(&store, &["49406"]).await[0];
        store.delete(id).await.unwrap();
        let result = store.set(GeocodableRef::new("city", 1), id).await;
        assert!(matches!(result, Err(RepositoryError::UnknownGeocode(_))));
    }

    #[tokio::test]
    async fn test_remove_geocoding() {
        let store = DashMapGeocodeStore::new();
        let id = stored_ids(&store, &["49406"]).await[0];
        let entity = GeocodableRef::new("city", 3);

        store.set(entity.clone(), id).await.unwrap();
        assert!(store.remove(&entity).await.unwrap());
        assert!(store.get(&entity).await.unwrap().is_none());
        assert!(!store.remove(&entity).await.unwrap());
    }

    #[tokio::test]
    async fn test_for_geocode_and_of_kind() {
        let store = DashMapGeocodeStore::new();
        let ids = stored_ids(&store, &["49406", "holland, mi"]).await;
        store.set(GeocodableRef::new("vacation", 2), ids[0]).await.unwrap();
        store.set(GeocodableRef::new("vacation", 1), ids[0]).await.unwrap();
        store.set(GeocodableRef::new("city", 1), ids[1]).await.unwrap();

        let bound = store.for_geocode(ids[0]).await.unwrap();
        assert_eq!(
            bound,
            vec![GeocodableRef::new("vacation", 1), GeocodableRef::new("vacation", 2)]
        );

        let vacations = store.of_kind(&EntityKind::new("vacation")).await.unwrap();
        assert_eq!(vacations.len(), 2);
        assert_eq!(vacations[0].geocodable.id, 1);

        let cities = store.of_kind(&EntityKind::new("city")).await.unwrap();
        assert_eq!(cities.len(), 1);
    }
}
