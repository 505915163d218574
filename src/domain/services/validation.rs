//! Geocode Validation
//!
//! Rules an address must satisfy to count as geocodable: optionally
//! non-blank, at least a given precision, and an arbitrary predicate.

use crate::domain::entities::{Geocode, Location};
use crate::domain::value_objects::Precision;
use crate::error::ValidationError;
use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&Geocode) -> bool + Send + Sync>;

/// Validation rules for geocodable addresses.
#[derive(Clone, Default)]
pub struct GeocodeValidator {
    allow_blank: bool,
    precision: Option<Precision>,
    predicate: Option<Predicate>,
}

impl GeocodeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept blank addresses without geocoding them.
    pub fn allow_blank(mut self, allow: bool) -> Self {
        self.allow_blank = allow;
        self
    }

    /// Require at least this precision.
    pub fn precision(mut self, minimum: Precision) -> Self {
        self.precision = Some(minimum);
        self
    }

    /// Require the resolved geocode to satisfy `predicate`.
    pub fn with<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Geocode) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Blank input that is accepted without a lookup.
    pub fn skips(&self, location: &Location) -> bool {
        self.allow_blank && location.is_blank()
    }

    /// Check a lookup result. `None` means the address did not geocode.
    pub fn check(&self, geocode: Option<&Geocode>) -> Result<(), ValidationError> {
        let geocode = geocode.ok_or(ValidationError::NotGeocodable)?;

        if let Some(minimum) = self.precision {
            if geocode.precision < minimum {
                return Err(ValidationError::NotGeocodable);
            }
        }

        if let Some(predicate) = &self.predicate {
            if !predicate(geocode) {
                return Err(ValidationError::NotGeocodable);
            }
        }

        Ok(())
    }
}

impl fmt::Debug for GeocodeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeocodeValidator")
            .field("allow_blank", &self.allow_blank)
            .field("precision", &self.precision)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geocode_with(precision: Precision, country: Option<&str>) -> Geocode {
        let mut location = Location::new().coordinates(42.65, -86.2).precision(precision);
        location.country = country.map(str::to_string);
        Geocode::from_location("saugatuck, mi", &location)
    }

    #[test]
    fn test_missing_geocode_is_invalid() {
        let validator = GeocodeValidator::new();
        assert_eq!(validator.check(None), Err(ValidationError::NotGeocodable));
    }

    #[test]
    fn test_any_geocode_is_valid_by_default() {
        let validator = GeocodeValidator::new();
        assert!(validator.check(Some(&geocode_with(Precision::Unknown, None))).is_ok());
    }

    #[test]
    fn test_same_precision_is_valid() {
        let validator = GeocodeValidator::new().precision(Precision::Street);
        assert!(validator.check(Some(&geocode_with(Precision::Street, None))).is_ok());
    }

    #[test]
    fn test_higher_precision_is_valid() {
        let validator = GeocodeValidator::new().precision(Precision::Region);
        assert!(validator.check(Some(&geocode_with(Precision::Street, None))).is_ok());
    }

    #[test]
    fn test_lower_precision_is_invalid() {
        let validator = GeocodeValidator::new().precision(Precision::Street);
        assert_eq!(
            validator.check(Some(&geocode_with(Precision::Region, None))),
            Err(ValidationError::NotGeocodable)
        );
    }

    #[test]
    fn test_predicate() {
        let validator = GeocodeValidator::new()
            .with(|g| matches!(g.country.as_deref(), Some("USA") | Some("US")));

        assert!(validator.check(Some(&geocode_with(Precision::Street, Some("US")))).is_ok());
        assert!(validator.check(Some(&geocode_with(Precision::Street, Some("CA")))).is_err());
    }

    #[test]
    fn test_skips_blank_only_when_allowed() {
        let blank = Location::new();
        assert!(GeocodeValidator::new().allow_blank(true).skips(&blank));
        assert!(!GeocodeValidator::new().skips(&blank));
        assert!(!GeocodeValidator::new()
            .allow_blank(true)
            .skips(&Location::new().locality("Saugatuck")));
    }
}
