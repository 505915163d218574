//! Error types
//!
//! Absence of a result (blank address, unresolvable query, unresolved
//! coordinates) is never an error. These types cover infrastructure failures
//! and the few domain failures that must stay distinct from "not found".

use thiserror::Error;

/// Failure reported by a geocoding provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered but could not geocode the input.
    #[error("no location found for query: {0:?}")]
    NotFound(String),

    /// The request never completed (connection refused, DNS, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with something we could not use.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("provider timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ProviderError {
    /// Whether this is the recoverable "could not geocode" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

/// Failure of the backing store.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("refusing to store unresolved geocode for query {0:?}")]
    Unresolved(String),

    /// A geocoding pointed at a geocode id with no stored row.
    #[error("no geocode with id {0}")]
    UnknownGeocode(i64),
}

/// Failure of a distance formula on two valid points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistanceError {
    #[error("vincenty formula failed to converge after {iterations} iterations")]
    NonConvergence { iterations: usize },
}

/// Top-level error of the application services.
#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Distance(#[from] DistanceError),

    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
}

/// Message attached to entities whose address fails validation.
pub const NOT_GEOCODABLE_MESSAGE: &str = "Address could not be geocoded.";

/// Validation outcome for an address that must be geocodable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Address could not be geocoded.")]
    NotGeocodable,
}

impl ValidationError {
    /// Message suitable for showing next to the offending form.
    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::NotGeocodable => NOT_GEOCODABLE_MESSAGE,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeocodeError>;
