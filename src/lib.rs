//! geocodable Library
//!
//! Geocode caching, distance calculation and proximity search for
//! application entities, exposed for the binary and integration tests.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;

// Re-export commonly used types
pub use application::{AttachOutcome, GeocodableService, GeocodeCache, Origin};
pub use config::{load_config, load_config_from};
pub use domain::entities::{Geocode, Geocoding, LocatedEntity, Location};
pub use domain::ports::{GeocodeProvider, GeocodeRepository, GeocodingRepository};
pub use domain::services::{DistanceEngine, GeocodeValidator, Located, ProximityQuery};
pub use domain::value_objects::{EntityKind, Formula, GeocodableRef, Point, Precision, Units};
pub use error::{DistanceError, GeocodeError, ProviderError, RepositoryError, ValidationError};
