//! Distance Engine
//!
//! Pure domain logic for great-circle and ellipsoidal distances.
//! This service has NO external dependencies - it's pure Rust.
//!
//! Formulas follow Chris Veness' notes:
//! - <http://www.movable-type.co.uk/scripts/latlong.html>
//! - <http://www.movable-type.co.uk/scripts/latlong-vincenty.html>

use crate::domain::entities::Geocode;
use crate::domain::value_objects::{Formula, Point, Units};
use crate::error::DistanceError;

/// Maximum number of Vincenty iterations before giving up.
pub const VINCENTY_MAX_ITERATIONS: usize = 20;

/// Convergence tolerance on lambda (about 0.06mm on the ground).
pub const VINCENTY_TOLERANCE: f64 = 1e-12;

/// Distance engine for resolved coordinate pairs.
pub struct DistanceEngine;

impl DistanceEngine {
    /// Distance between two geocodes.
    ///
    /// Returns `Ok(None)` when either side is missing or unresolved; that is
    /// an expected state for entities without coordinates, not a failure.
    pub fn distance(
        a: Option<&Geocode>,
        b: Option<&Geocode>,
        units: Units,
        formula: Formula,
    ) -> Result<Option<f64>, DistanceError> {
        match (a.and_then(Geocode::point), b.and_then(Geocode::point)) {
            (Some(a), Some(b)) => Self::between(a, b, units, formula).map(Some),
            _ => Ok(None),
        }
    }

    /// Distance between two points with the chosen formula.
    pub fn between(a: Point, b: Point, units: Units, formula: Formula) -> Result<f64, DistanceError> {
        match formula {
            Formula::Spherical => Ok(Self::spherical_law_of_cosines(a, b, units)),
            Formula::Haversine => Ok(Self::haversine(a, b, units)),
            Formula::Vincenty => Self::vincenty(a, b, units),
        }
    }

    /// `d = acos(sin φ1·sin φ2 + cos φ1·cos φ2·cos Δλ)·R`
    pub fn spherical_law_of_cosines(a: Point, b: Point, units: Units) -> f64 {
        let (lat1, lon1) = (a.latitude_radians(), a.longitude_radians());
        let (lat2, lon2) = (b.latitude_radians(), b.longitude_radians());

        let cosine = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon2 - lon1).cos();

        // Rounding can push coincident points just past 1.0
        cosine.clamp(-1.0, 1.0).acos() * units.earth_radius()
    }

    /// `a = sin²(Δφ/2) + cos φ1·cos φ2·sin²(Δλ/2)`, `d = R·2·atan2(√a, √(1−a))`
    pub fn haversine(a: Point, b: Point, units: Units) -> f64 {
        let (lat1, lon1) = (a.latitude_radians(), a.longitude_radians());
        let (lat2, lon2) = (b.latitude_radians(), b.longitude_radians());

        let latitude_delta = lat2 - lat1;
        let longitude_delta = lon2 - lon1;

        let h = (latitude_delta / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (longitude_delta / 2.0).sin().powi(2);

        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

        units.earth_radius() * c
    }

    /// Vincenty's inverse solution on the WGS-84 ellipsoid.
    ///
    /// Nearly antipodal points may fail to converge; that is reported as
    /// [`DistanceError::NonConvergence`] rather than an approximate value.
    pub fn vincenty(a: Point, b: Point, units: Units) -> Result<f64, DistanceError> {
        let major = units.earth_major_axis_radius();
        let minor = units.earth_minor_axis_radius();
        let f = (major - minor) / major;

        let l = b.longitude_radians() - a.longitude_radians();
        let u1 = ((1.0 - f) * a.latitude_radians().tan()).atan();
        let u2 = ((1.0 - f) * b.latitude_radians().tan()).atan();
        let (sin_u1, cos_u1) = u1.sin_cos();
        let (sin_u2, cos_u2) = u2.sin_cos();

        let mut lambda = l;
        let mut converged = false;

        let mut sin_sigma = 0.0;
        let mut cos_sigma = 0.0;
        let mut sigma = 0.0;
        let mut cos_sq_alpha = 0.0;
        let mut cos_2sigma_m = 0.0;

        for _ in 0..VINCENTY_MAX_ITERATIONS {
            let (sin_lambda, cos_lambda) = lambda.sin_cos();

            sin_sigma = ((cos_u2 * sin_lambda).powi(2)
                + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
            .sqrt();

            // co-incident points
            if sin_sigma == 0.0 {
                return Ok(0.0);
            }

            cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
            sigma = sin_sigma.atan2(cos_sigma);
            let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
            cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
            cos_2sigma_m = cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha;

            // equatorial line: cos_sq_alpha == 0
            if !cos_2sigma_m.is_finite() {
                cos_2sigma_m = 0.0;
            }

            let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
            let lambda_prev = lambda;
            lambda = l
                + (1.0 - c)
                    * f
                    * sin_alpha
                    * (sigma
                        + c * sin_sigma
                            * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))));

            // NaN never compares <= tolerance, so divergence runs out the loop
            if (lambda - lambda_prev).abs() <= VINCENTY_TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(DistanceError::NonConvergence {
                iterations: VINCENTY_MAX_ITERATIONS,
            });
        }

        let u_sq = cos_sq_alpha * (major.powi(2) - minor.powi(2)) / minor.powi(2);
        let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
        let delta_sigma = big_b
            * sin_sigma
            * (cos_2sigma_m
                + big_b / 4.0
                    * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m.powi(2))
                        - big_b / 6.0
                            * cos_2sigma_m
                            * (-3.0 + 4.0 * sin_sigma.powi(2))
                            * (-3.0 + 4.0 * cos_2sigma_m.powi(2))));

        let s = minor * big_a * (sigma - delta_sigma);

        if s.is_finite() {
            Ok(s)
        } else {
            Err(DistanceError::NonConvergence {
                iterations: VINCENTY_MAX_ITERATIONS,
            })
        }
    }
}
