//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the geocoding domain.
//! They have no external dependencies and contain only business logic.

use crate::domain::value_objects::{GeocodableRef, Point, Precision};
use serde::{Deserialize, Serialize};

/// An address broken into components, as sent to and returned by a provider.
///
/// Locations are transient; only resolved geocodes are stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub street: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub precision: Precision,
}

impl Location {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    pub fn locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// True when no address component carries any text.
    pub fn is_blank(&self) -> bool {
        [
            &self.street,
            &self.locality,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .all(|c| present(c).is_none())
    }

    /// Both coordinates are known.
    pub fn is_resolved(&self) -> bool {
        self.point().is_some()
    }

    pub fn point(&self) -> Option<Point> {
        Some(Point::new(self.latitude?, self.longitude?))
    }

    /// Copy address components from a geocode.
    ///
    /// With `overwrite` every component the geocode knows replaces ours;
    /// otherwise only blank components are filled in.
    pub fn normalized_with(&self, geocode: &Geocode, overwrite: bool) -> Location {
        fn pick(ours: &Option<String>, theirs: &Option<String>, overwrite: bool) -> Option<String> {
            match (present(ours), present(theirs)) {
                (_, Some(t)) if overwrite => Some(t.to_string()),
                (Some(o), _) => Some(o.to_string()),
                (None, Some(t)) => Some(t.to_string()),
                (None, None) => ours.clone(),
            }
        }

        Location {
            street: pick(&self.street, &geocode.street, overwrite),
            locality: pick(&self.locality, &geocode.locality, overwrite),
            region: pick(&self.region, &geocode.region, overwrite),
            postal_code: pick(&self.postal_code, &geocode.postal_code, overwrite),
            country: pick(&self.country, &geocode.country, overwrite),
            latitude: self.latitude,
            longitude: self.longitude,
            precision: self.precision,
        }
    }
}

impl std::fmt::Display for Location {
    /// Renders `street\nlocality, region postal_code country`, skipping blanks.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(street) = present(&self.street) {
            writeln!(f, "{}", street)?;
        }

        let region_line: Vec<&str> = [present(&self.region), present(&self.postal_code)]
            .into_iter()
            .flatten()
            .collect();
        let region_line = region_line.join(" ");

        let mut parts: Vec<&str> = Vec::new();
        if let Some(locality) = present(&self.locality) {
            parts.push(locality);
        }
        if !region_line.is_empty() {
            parts.push(&region_line);
        }
        write!(f, "{}", parts.join(", "))?;

        if let Some(country) = present(&self.country) {
            write!(f, " {}", country)?;
        }
        Ok(())
    }
}

/// Trimmed text of a component, or None when the component is blank.
fn present(component: &Option<String>) -> Option<&str> {
    component
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A cached geocoding result for one normalized query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geocode {
    /// Store-assigned id; None until persisted
    pub id: Option<i64>,
    /// Normalized lookup key (unique)
    pub query: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub street: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub precision: Precision,
}

impl Geocode {
    /// Build an unsaved geocode from a provider location.
    pub fn from_location(query: impl Into<String>, location: &Location) -> Self {
        Self {
            id: None,
            query: query.into(),
            latitude: location.latitude,
            longitude: location.longitude,
            street: location.street.clone(),
            locality: location.locality.clone(),
            region: location.region.clone(),
            postal_code: location.postal_code.clone(),
            country: location.country.clone(),
            precision: location.precision,
        }
    }

    /// Both latitude and longitude are present.
    pub fn is_geocoded(&self) -> bool {
        self.point().is_some()
    }

    pub fn point(&self) -> Option<Point> {
        Some(Point::new(self.latitude?, self.longitude?))
    }

    /// `"longitude,latitude"`, the order map APIs expect.
    pub fn coordinates(&self) -> String {
        format!(
            "{},{}",
            self.longitude.map(|v| v.to_string()).unwrap_or_default(),
            self.latitude.map(|v| v.to_string()).unwrap_or_default()
        )
    }

    pub fn to_location(&self) -> Location {
        Location {
            street: self.street.clone(),
            locality: self.locality.clone(),
            region: self.region.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            precision: self.precision,
        }
    }
}

impl std::fmt::Display for Geocode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.coordinates())
    }
}

/// Association between one entity and one geocode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geocoding {
    pub id: i64,
    pub geocode_id: i64,
    pub geocodable: GeocodableRef,
}

/// An entity reference paired with its geocode, ready for proximity search.
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedEntity {
    pub entity: GeocodableRef,
    pub geocode: Geocode,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn white_house() -> Location {
        Location::new()
            .street("1600 Pennsylvania Ave NW")
            .locality("Washington")
            .region("DC")
            .postal_code("20502")
    }

    // ===== Location Display Tests =====

    #[test]
    fn test_location_to_string_full_address() {
        assert_eq!(
            white_house().to_string(),
            "1600 Pennsylvania Ave NW\nWashington, DC 20502"
        );
    }

    #[test]
    fn test_location_to_string_with_country() {
        let location = Location::new()
            .locality("Grand Rapids")
            .region("MI")
            .country("US");
        assert_eq!(location.to_string(), "Grand Rapids, MI US");
    }

    #[test]
    fn test_location_to_string_postal_code_only() {
        let location = Location::new().postal_code("49406");
        assert_eq!(location.to_string(), "49406");
    }

    #[test]
    fn test_location_to_string_skips_blank_components() {
        let location = Location::new()
            .street("  ")
            .locality("Saugatuck")
            .region("MI")
            .postal_code("");
        assert_eq!(location.to_string(), "Saugatuck, MI");
    }

    // ===== Location Blank Tests =====

    #[test]
    fn test_location_is_blank() {
        assert!(Location::new().is_blank());
        assert!(Location::new().locality("\n").region(" ").is_blank());
        assert!(!Location::new().region("MI").is_blank());
    }

    #[test]
    fn test_location_coordinates_do_not_count_as_address() {
        let location = Location::new().coordinates(1.0, 2.0);
        assert!(location.is_blank());
        assert!(location.is_resolved());
    }

    // ===== Location Normalization Tests =====

    #[test]
    fn test_normalized_with_overwrite() {
        let geocode = Geocode::from_location(
            "sanclemente, ca",
            &Location::new().locality("San Clemente").region("CA"),
        );
        let input = Location::new().locality("sanclemente").region("ca");

        let normalized = input.normalized_with(&geocode, true);
        assert_eq!(normalized.locality.as_deref(), Some("San Clemente"));
        assert_eq!(normalized.region.as_deref(), Some("CA"));
    }

    #[test]
    fn test_normalized_without_overwrite_fills_blanks_only() {
        let geocode = Geocode::from_location(
            "portland, or",
            &Location::new()
                .locality("Portland")
                .region("OR")
                .postal_code("97212"),
        );
        let input = Location::new().locality("portland").region("or");

        let normalized = input.normalized_with(&geocode, false);
        assert_eq!(normalized.locality.as_deref(), Some("portland"));
        assert_eq!(normalized.region.as_deref(), Some("or"));
        assert_eq!(normalized.postal_code.as_deref(), Some("97212"));
    }

    // ===== Geocode Tests =====

    #[test]
    fn test_geocode_is_geocoded() {
        let mut geocode = Geocode::default();
        assert!(!geocode.is_geocoded());

        geocode.latitude = Some(1.0);
        assert!(!geocode.is_geocoded());

        geocode.latitude = None;
        geocode.longitude = Some(1.0);
        assert!(!geocode.is_geocoded());

        geocode.latitude = Some(1.0);
        assert!(geocode.is_geocoded());
    }

    #[test]
    fn test_geocode_coordinates_and_display() {
        let geocode = Geocode::from_location(
            "saugatuck, mi",
            &Location::new().coordinates(42.654781, -86.200722),
        );
        assert_eq!(geocode.coordinates(), "-86.200722,42.654781");
        assert_eq!(geocode.to_string(), geocode.coordinates());
    }

    #[test]
    fn test_geocode_to_location_roundtrip_fields() {
        let location = white_house()
            .coordinates(38.898748, -77.037684)
            .precision(Precision::Street);
        let geocode = Geocode::from_location("white house", &location);

        assert_eq!(geocode.to_location(), location);
        assert_eq!(geocode.id, None);
        assert_eq!(geocode.query, "white house");
    }
}
