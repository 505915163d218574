mod canned_geocode_provider;
mod dashmap_geocode_store;
mod http_geocode_provider;
mod sqlite_geocode_store;

pub use canned_geocode_provider::CannedGeocodeProvider;
pub use dashmap_geocode_store::DashMapGeocodeStore;
pub use http_geocode_provider::{HttpGeocodeProvider, HttpProviderConfig};
pub use sqlite_geocode_store::SqliteGeocodeStore;
