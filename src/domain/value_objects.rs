//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};

/// A coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub latitude: f64,
    pub longitude: f64,
}

impl Point {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude in radians.
    pub fn latitude_radians(&self) -> f64 {
        deg2rad(self.latitude)
    }

    /// Longitude in radians.
    pub fn longitude_radians(&self) -> f64 {
        deg2rad(self.longitude)
    }
}

/// Convert degrees to radians.
pub fn deg2rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// Units a distance is reported in.
///
/// Units only select the earth radius constants; there is no separate
/// mile/kilometer conversion step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    Miles,
    Kilometers,
}

impl Units {
    /// Parse units from a string (`mi`, `miles`, `km`, `kilometers`).
    ///
    /// Unknown values fall back to miles.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "km" | "kilometer" | "kilometers" | "kilometres" => Self::Kilometers,
            _ => Self::Miles,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Miles => "miles",
            Self::Kilometers => "kilometers",
        }
    }

    /// Mean earth radius used by the spherical formulas.
    pub fn earth_radius(&self) -> f64 {
        match self {
            Self::Miles => 3963.1676,
            Self::Kilometers => 6378.135,
        }
    }

    /// WGS-84 major (equatorial) semi-axis.
    pub fn earth_major_axis_radius(&self) -> f64 {
        match self {
            Self::Miles => 3963.19059,
            Self::Kilometers => 6378.137,
        }
    }

    /// WGS-84 minor (polar) semi-axis.
    pub fn earth_minor_axis_radius(&self) -> f64 {
        match self {
            Self::Miles => 3949.90276,
            Self::Kilometers => 6356.7523142,
        }
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Distance formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formula {
    /// Spherical law of cosines. Simplest, least accurate at short range.
    Spherical,
    /// Haversine. Stable at small distances.
    #[default]
    Haversine,
    /// Vincenty's iterative solution on the WGS-84 ellipsoid.
    Vincenty,
}

impl Formula {
    /// Parse a formula name. Unknown values fall back to haversine.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "spherical" | "spherical_law_of_cosines" | "cosines" => Self::Spherical,
            "vincenty" => Self::Vincenty,
            _ => Self::Haversine,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spherical => "spherical",
            Self::Haversine => "haversine",
            Self::Vincenty => "vincenty",
        }
    }
}

impl std::fmt::Display for Formula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accuracy of a geocode result, ordered from least to most precise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Unknown,
    Country,
    Region,
    Locality,
    PostalCode,
    Street,
    Address,
    Premise,
    Point,
}

impl Precision {
    /// Parse a precision name. Unrecognized names map to `Unknown`.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "country" => Self::Country,
            "region" | "state" => Self::Region,
            "locality" | "city" => Self::Locality,
            "postal_code" | "zip" => Self::PostalCode,
            "street" => Self::Street,
            "address" => Self::Address,
            "premise" => Self::Premise,
            "point" => Self::Point,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Country => "country",
            Self::Region => "region",
            Self::Locality => "locality",
            Self::PostalCode => "postal_code",
            Self::Street => "street",
            Self::Address => "address",
            Self::Premise => "premise",
            Self::Point => "point",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name of a kind of entity that can carry a geocode ("vacation", "city").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKind(String);

impl EntityKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityKind {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to one geocodable entity: its kind plus its id within that kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeocodableRef {
    pub kind: EntityKind,
    pub id: i64,
}

impl GeocodableRef {
    pub fn new(kind: impl Into<EntityKind>, id: i64) -> Self {
        Self {
            kind: kind.into(),
            id,
        }
    }
}

impl std::fmt::Display for GeocodableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Units Tests =====

    #[test]
    fn test_units_from_str() {
        let tests = vec![
            ("miles", Units::Miles),
            ("mi", Units::Miles),
            ("km", Units::Kilometers),
            ("Kilometers", Units::Kilometers),
            ("furlongs", Units::Miles),
        ];

        for (input, expected) in tests {
            assert_eq!(Units::from_str(input), expected, "Failed for input: {}", input);
        }
    }

    #[test]
    fn test_units_radius_constants() {
        assert!((Units::Miles.earth_radius() - 3963.1676).abs() < f64::EPSILON);
        assert!((Units::Kilometers.earth_radius() - 6378.135).abs() < f64::EPSILON);
        assert!(Units::Kilometers.earth_major_axis_radius() > Units::Kilometers.earth_minor_axis_radius());
        assert!(Units::Miles.earth_major_axis_radius() > Units::Miles.earth_minor_axis_radius());
    }

    #[test]
    fn test_units_default_is_miles() {
        assert_eq!(Units::default(), Units::Miles);
    }

    // ===== Formula Tests =====

    #[test]
    fn test_formula_default_is_haversine() {
        assert_eq!(Formula::default(), Formula::Haversine);
    }

    #[test]
    fn test_formula_from_str() {
        assert_eq!(Formula::from_str("vincenty"), Formula::Vincenty);
        assert_eq!(Formula::from_str("SPHERICAL"), Formula::Spherical);
        assert_eq!(Formula::from_str("haversine"), Formula::Haversine);
        assert_eq!(Formula::from_str("unknown"), Formula::Haversine);
    }

    #[test]
    fn test_formula_display() {
        assert_eq!(format!("{}", Formula::Vincenty), "vincenty");
    }

    // ===== Precision Tests =====

    #[test]
    fn test_precision_ordering() {
        assert!(Precision::Street > Precision::Region);
        assert!(Precision::Region > Precision::Country);
        assert!(Precision::Point > Precision::Premise);
        assert!(Precision::Unknown < Precision::Country);
    }

    #[test]
    fn test_precision_roundtrip_names() {
        let all = [
            Precision::Unknown,
            Precision::Country,
            Precision::Region,
            Precision::Locality,
            Precision::PostalCode,
            Precision::Street,
            Precision::Address,
            Precision::Premise,
            Precision::Point,
        ];

        for precision in all {
            assert_eq!(Precision::from_str(precision.as_str()), precision);
        }
    }

    #[test]
    fn test_precision_unrecognized_is_unknown() {
        assert_eq!(Precision::from_str("rooftop-ish"), Precision::Unknown);
        assert_eq!(Precision::from_str(""), Precision::Unknown);
    }

    // ===== Point Tests =====

    #[test]
    fn test_point_radians() {
        let p = Point::new(180.0, -90.0);
        assert!((p.latitude_radians() - std::f64::consts::PI).abs() < 1e-12);
        assert!((p.longitude_radians() + std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    // ===== GeocodableRef Tests =====

    #[test]
    fn test_geocodable_ref_display() {
        let r = GeocodableRef::new("vacation", 7);
        assert_eq!(r.to_string(), "vacation#7");
        assert_eq!(r.kind.as_str(), "vacation");
    }
}
