//! Application Layer
//!
//! Use cases composed from domain services and ports.

mod geocodable_service;
mod geocode_cache;

pub use geocodable_service::{AttachOutcome, EntitySearch, GeocodableService, Origin};
pub use geocode_cache::{GeocodeCache, DEFAULT_PROVIDER_TIMEOUT};
