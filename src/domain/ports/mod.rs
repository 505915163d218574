mod geocode_provider;
mod geocode_repository;
mod geocoding_repository;

pub use geocode_provider::GeocodeProvider;
pub use geocode_repository::GeocodeRepository;
pub use geocoding_repository::GeocodingRepository;
