//! Domain Services
//!
//! Stateless domain logic over entities and value objects.

mod distance;
mod proximity;
mod validation;

pub use distance::{DistanceEngine, VINCENTY_MAX_ITERATIONS, VINCENTY_TOLERANCE};
pub use proximity::{Located, ProximityQuery, ProximitySearchable};
pub use validation::GeocodeValidator;
