//! Place search: resolve a free-text name to location candidates.

use serde::Deserialize;
use tracing::instrument;

use crate::types::{Location, WeatherError};

const GEOCODE_API_BASE: &str = "https://geocoding-api.open-meteo.com/v1/search";
const RESULT_COUNT: u8 = 8;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<PlaceCandidate>>,
}

/// One place candidate returned by the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceCandidate {
    pub id: u64,
    pub name: String,
    pub country: Option<String>,
    pub admin1: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Option<String>,
}

impl PlaceCandidate {
    /// Promote a selected candidate to an active location.
    pub fn into_location(self) -> Location {
        Location {
            id: self.id.to_string(),
            name: self.name,
            country: self.country.unwrap_or_default(),
            admin1: self.admin1,
            latitude: self.latitude,
            longitude: self.longitude,
            timezone: self.timezone,
        }
    }
}

pub struct GeocodeClient {
    client: reqwest::Client,
    base_url: String,
    language: String,
}

impl GeocodeClient {
    pub fn new(language: &str) -> Self {
        Self::new_with_base_url(language, GEOCODE_API_BASE)
    }

    pub fn new_with_base_url(language: &str, base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
            language: language.to_string(),
        }
    }

    /// Search for places matching a free-text query.
    ///
    /// Zero candidates is a valid outcome, not an error.
    #[instrument(skip(self), level = "info")]
    pub async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, WeatherError> {
        let url = format!(
            "{}?name={}&count={}&language={}&format=json",
            self.base_url,
            urlencoding::encode(query),
            RESULT_COUNT,
            self.language,
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Api {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(e.to_string()))?;

        let candidates = body.results.unwrap_or_default();
        tracing::debug!("Found {} candidates for '{}'", candidates.len(), query);
        Ok(candidates)
    }
}
