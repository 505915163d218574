//! Geocodable Service - entity-facing use cases
//!
//! Binds application entities to cached geocodes and answers distance,
//! proximity and validation questions about them. Entity kinds must be
//! registered before use.

use crate::application::GeocodeCache;
use crate::domain::entities::{Geocode, LocatedEntity, Location};
use crate::domain::ports::{GeocodeRepository, GeocodingRepository};
use crate::domain::services::{DistanceEngine, GeocodeValidator, Located, ProximityQuery};
use crate::domain::value_objects::{EntityKind, Formula, GeocodableRef, Point, Units};
use crate::error::{DistanceError, GeocodeError, RepositoryError, Result, ValidationError};
use dashmap::DashSet;
use std::sync::Arc;

/// Outcome of [`GeocodableService::attach_geocode`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttachOutcome {
    /// The entity now points at `geocode`.
    Attached {
        geocode: Geocode,
        /// The input location with components filled from the geocode
        normalized: Location,
    },
    /// Nothing changed.
    Unchanged,
    /// The address was blank and the previous geocoding was removed.
    Detached,
    /// The address could not be geocoded; any previous geocoding was removed.
    Unresolved,
}

/// Something a distance or search can be measured from.
#[derive(Debug, Clone)]
pub enum Origin {
    Query(String),
    Location(Location),
    Geocode(Geocode),
    Point(Point),
    Entity(GeocodableRef),
}

impl From<Point> for Origin {
    fn from(point: Point) -> Self {
        Origin::Point(point)
    }
}

impl From<&str> for Origin {
    fn from(query: &str) -> Self {
        Origin::Query(query.to_string())
    }
}

/// Proximity search over every located entity of one kind.
#[derive(Debug, Clone)]
pub struct EntitySearch {
    pub query: ProximityQuery,
    pub candidates: Vec<LocatedEntity>,
}

impl EntitySearch {
    pub fn within(&self, radius: f64) -> std::result::Result<Vec<Located<&LocatedEntity>>, DistanceError> {
        self.query.within(radius, &self.candidates)
    }

    pub fn beyond(&self, radius: f64) -> std::result::Result<Vec<Located<&LocatedEntity>>, DistanceError> {
        self.query.beyond(radius, &self.candidates)
    }

    pub fn nearest(&self) -> std::result::Result<Option<Located<&LocatedEntity>>, DistanceError> {
        self.query.nearest(&self.candidates)
    }

    pub fn farthest(&self) -> std::result::Result<Option<Located<&LocatedEntity>>, DistanceError> {
        self.query.farthest(&self.candidates)
    }
}

/// Geocodable service - entity use cases.
pub struct GeocodableService {
    cache: Arc<GeocodeCache>,
    geocodes: Arc<dyn GeocodeRepository>,
    geocodings: Arc<dyn GeocodingRepository>,
    kinds: DashSet<EntityKind>,
    units: Units,
    formula: Formula,
}

impl GeocodableService {
    pub fn new(cache: Arc<GeocodeCache>, geocodings: Arc<dyn GeocodingRepository>) -> Self {
        Self {
            geocodes: cache.repository().clone(),
            cache,
            geocodings,
            kinds: DashSet::new(),
            units: Units::default(),
            formula: Formula::default(),
        }
    }

    /// Units used by [`GeocodableService::search`].
    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Formula used by [`GeocodableService::search`].
    pub fn formula(mut self, formula: Formula) -> Self {
        self.formula = formula;
        self
    }

    pub fn cache(&self) -> &Arc<GeocodeCache> {
        &self.cache
    }

    pub fn register_kind(&self, kind: impl Into<EntityKind>) {
        let kind = kind.into();
        tracing::debug!("registered geocodable kind {}", kind);
        self.kinds.insert(kind);
    }

    pub fn is_registered(&self, kind: &EntityKind) -> bool {
        self.kinds.contains(kind)
    }

    fn ensure_registered(&self, kind: &EntityKind) -> Result<()> {
        if self.is_registered(kind) {
            Ok(())
        } else {
            Err(GeocodeError::UnknownEntityKind(kind.to_string()))
        }
    }

    /// Current geocode of an entity.
    pub async fn geocode_for(&self, entity: &GeocodableRef) -> Result<Option<Geocode>> {
        self.ensure_registered(&entity.kind)?;

        let Some(geocoding) = self.geocodings.get(entity).await? else {
            return Ok(None);
        };
        Ok(self.geocodes.find_by_id(geocoding.geocode_id).await?)
    }

    /// Re-geocode an entity after its address changed.
    ///
    /// Blank addresses never reach the provider. With `force_normalize` the
    /// returned location takes every component the geocode knows; otherwise
    /// only its blank components are filled.
    pub async fn attach_geocode(
        &self,
        entity: &GeocodableRef,
        location: &Location,
        force_normalize: bool,
    ) -> Result<AttachOutcome> {
        self.ensure_registered(&entity.kind)?;

        if location.is_blank() {
            let removed = self.geocodings.remove(entity).await?;
            return Ok(if removed {
                AttachOutcome::Detached
            } else {
                AttachOutcome::Unchanged
            });
        }

        let Some(geocode) = self.cache.find_or_create_by_location(location).await? else {
            self.geocodings.remove(entity).await?;
            return Ok(AttachOutcome::Unresolved);
        };
        let Some(geocode_id) = geocode.id else {
            return Err(RepositoryError::Unresolved(geocode.query).into());
        };

        if let Some(current) = self.geocodings.get(entity).await? {
            if current.geocode_id == geocode_id {
                return Ok(AttachOutcome::Unchanged);
            }
        }

        self.geocodings.set(entity.clone(), geocode_id).await?;
        tracing::debug!("{} geocoded as {}", entity, geocode);

        Ok(AttachOutcome::Attached {
            normalized: location.normalized_with(&geocode, force_normalize),
            geocode,
        })
    }

    /// Drop an entity's geocoding, e.g. when the entity is destroyed.
    pub async fn detach(&self, entity: &GeocodableRef) -> Result<bool> {
        self.ensure_registered(&entity.kind)?;
        Ok(self.geocodings.remove(entity).await?)
    }

    /// Distance between two entities; None if either is not geocoded.
    pub async fn distance_between(
        &self,
        a: &GeocodableRef,
        b: &GeocodableRef,
        units: Units,
        formula: Formula,
    ) -> Result<Option<f64>> {
        let a = self.geocode_for(a).await?;
        let b = self.geocode_for(b).await?;
        Ok(DistanceEngine::distance(a.as_ref(), b.as_ref(), units, formula)?)
    }

    /// Distance from an entity to an origin; None if either has no position.
    pub async fn distance_to(
        &self,
        entity: &GeocodableRef,
        origin: &Origin,
        units: Units,
        formula: Formula,
    ) -> Result<Option<f64>> {
        let Some(from) = self.geocode_for(entity).await?.and_then(|g| g.point()) else {
            return Ok(None);
        };
        let Some(to) = self.resolve_origin(origin).await? else {
            return Ok(None);
        };
        Ok(Some(DistanceEngine::between(from, to, units, formula)?))
    }

    /// Position of an origin, geocoding queries and locations as needed.
    pub async fn resolve_origin(&self, origin: &Origin) -> Result<Option<Point>> {
        let point = match origin {
            Origin::Point(point) => Some(*point),
            Origin::Geocode(geocode) => geocode.point(),
            Origin::Query(query) => self
                .cache
                .find_or_create_by_query(query)
                .await?
                .and_then(|g| g.point()),
            Origin::Location(location) => match location.point() {
                Some(point) => Some(point),
                None => self
                    .cache
                    .find_or_create_by_location(location)
                    .await?
                    .and_then(|g| g.point()),
            },
            Origin::Entity(entity) => self.geocode_for(entity).await?.and_then(|g| g.point()),
        };
        Ok(point)
    }

    /// Every geocoded entity of a kind, ordered by entity id.
    pub async fn located(&self, kind: &EntityKind) -> Result<Vec<LocatedEntity>> {
        self.ensure_registered(kind)?;

        let mut located = Vec::new();
        for geocoding in self.geocodings.of_kind(kind).await? {
            if let Some(geocode) = self.geocodes.find_by_id(geocoding.geocode_id).await? {
                located.push(LocatedEntity {
                    entity: geocoding.geocodable,
                    geocode,
                });
            }
        }
        Ok(located)
    }

    /// Proximity search over a kind. None when the origin cannot be resolved.
    pub async fn search(&self, kind: &EntityKind, origin: &Origin) -> Result<Option<EntitySearch>> {
        self.ensure_registered(kind)?;

        let Some(point) = self.resolve_origin(origin).await? else {
            return Ok(None);
        };

        Ok(Some(EntitySearch {
            query: ProximityQuery::new(point).units(self.units).formula(self.formula),
            candidates: self.located(kind).await?,
        }))
    }

    /// Check that an address geocodes and satisfies `validator`.
    ///
    /// A provider failure counts as not geocodable.
    pub async fn validate(
        &self,
        location: &Location,
        validator: &GeocodeValidator,
    ) -> std::result::Result<(), ValidationError> {
        if validator.skips(location) {
            return Ok(());
        }

        match self.cache.find_or_create_by_location(location).await {
            Ok(geocode) => validator.check(geocode.as_ref()),
            Err(e) => {
                tracing::warn!("validation lookup for {:?} failed: {}", location.to_string(), e);
                Err(ValidationError::NotGeocodable)
            }
        }
    }
}
