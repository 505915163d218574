//! HTTP Geocode Provider
//!
//! Implements GeocodeProvider against a Nominatim-compatible search API.
//!
//! See: https://nominatim.org/release-docs/latest/api/Search/

use crate::domain::entities::Location;
use crate::domain::ports::GeocodeProvider;
use crate::domain::value_objects::Precision;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// One search hit in `format=jsonv2`.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    addresstype: Option<String>,
    #[serde(default)]
    address: SearchAddress,
}

#[derive(Debug, Default, Deserialize)]
struct SearchAddress {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country_code: Option<String>,
    country: Option<String>,
}

/// Configuration for the search endpoint.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Base URL, e.g. "https://nominatim.openstreetmap.org"
    pub base_url: String,
    /// Sent with every request; public instances reject anonymous clients
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("geocodable/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Geocoding provider backed by an HTTP search API.
pub struct HttpGeocodeProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
}

impl HttpGeocodeProvider {
    pub fn new(config: HttpProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    fn map_send_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.config.timeout)
        } else {
            ProviderError::Transport(e.to_string())
        }
    }

    fn to_location(hit: SearchHit) -> Result<Location, ProviderError> {
        let latitude: f64 = hit
            .lat
            .trim()
            .parse()
            .map_err(|_| ProviderError::Protocol(format!("invalid latitude {:?}", hit.lat)))?;
        let longitude: f64 = hit
            .lon
            .trim()
            .parse()
            .map_err(|_| ProviderError::Protocol(format!("invalid longitude {:?}", hit.lon)))?;

        let address = hit.address;
        let street = match (address.house_number, address.road) {
            (Some(number), Some(road)) => Some(format!("{} {}", number, road)),
            (None, road) => road,
            (Some(_), None) => None,
        };
        let locality = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.hamlet)
            .or(address.municipality);
        let country = address
            .country_code
            .map(|c| c.to_uppercase())
            .or(address.country);

        Ok(Location {
            street,
            locality,
            region: address.state,
            postal_code: address.postcode,
            country,
            latitude: Some(latitude),
            longitude: Some(longitude),
            precision: precision_of(hit.addresstype.as_deref()),
        })
    }
}

/// Map the search API's `addresstype` to a precision level.
fn precision_of(addresstype: Option<&str>) -> Precision {
    match addresstype {
        Some("country") => Precision::Country,
        Some("state" | "region" | "province" | "county" | "state_district") => Precision::Region,
        Some(
            "city" | "town" | "village" | "hamlet" | "municipality" | "suburb" | "neighbourhood"
            | "quarter",
        ) => Precision::Locality,
        Some("postcode") => Precision::PostalCode,
        Some("road") => Precision::Street,
        Some("house" | "house_number") => Precision::Address,
        Some("building" | "amenity" | "shop" | "tourism" | "office") => Precision::Premise,
        _ => Precision::Unknown,
    }
}

#[async_trait]
impl GeocodeProvider for HttpGeocodeProvider {
    async fn locate(&self, query: &str) -> Result<Vec<Location>, ProviderError> {
        tracing::debug!("searching {} for {:?}", self.config.base_url, query);

        let resp = self
            .client
            .get(self.search_url())
            .query(&[("q", query), ("format", "jsonv2"), ("addressdetails", "1")])
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Protocol(format!(
                "search returned status {}",
                status
            )));
        }

        let hits: Vec<SearchHit> = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout(self.config.timeout)
            } else {
                ProviderError::Protocol(format!("undecodable search response: {}", e))
            }
        })?;

        Self::usable_locations(hits)
    }
}

impl HttpGeocodeProvider {
    /// Map hits to locations, skipping malformed ones.
    ///
    /// Fails only when the response had hits and none of them was usable.
    fn usable_locations(hits: Vec<SearchHit>) -> Result<Vec<Location>, ProviderError> {
        let mut first_error = None;
        let mut locations = Vec::with_capacity(hits.len());

        for hit in hits {
            match Self::to_location(hit) {
                Ok(location) => locations.push(location),
                Err(e) => {
                    tracing::warn!("skipping search hit: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if locations.is_empty() => Err(e),
            _ => Ok(locations),
        }
    }
}
