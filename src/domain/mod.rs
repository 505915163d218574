//! Domain Layer
//!
//! Entities, value objects, ports and pure services. Nothing in here
//! performs I/O; adapters implement the ports.

pub mod entities;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{Geocode, Geocoding, LocatedEntity, Location};
pub use value_objects::{EntityKind, Formula, GeocodableRef, Point, Precision, Units};
