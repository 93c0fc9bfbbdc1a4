//! Nominatim geocoding

use async_trait::async_trait;
use serde::Deserialize;

use super::{Geocoder, Place, error_body, http_client, read_json};
use crate::config::{GeocoderConfig, HttpConfig};
use crate::geo::Coordinate;
use crate::retry::{RetryPolicy, send_with_retry};
use crate::{Error, Result};

/// Nominatim search result (`format=jsonv2`)
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// Geocoder backed by a Nominatim instance
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl NominatimGeocoder {
    /// Create a geocoder for the configured Nominatim instance
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &GeocoderConfig, http: HttpConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(Error::Config(
                "Nominatim requires an identifying User-Agent".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(http.timeout, &config.user_agent)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::for_http(http),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();

        let response = send_with_retry(&self.retry, "geocode", || {
            self.client
                .get(&url)
                .query(&[("q", query), ("format", "jsonv2"), ("limit", limit.as_str())])
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(Error::Geocode(format!(
                "Nominatim error {}",
                error_body(response).await
            )));
        }

        let places: Vec<NominatimPlace> = read_json(response, "Nominatim", Error::Geocode).await?;
        Ok(to_places(places))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, name: &str) -> Result<Coordinate> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("location name is empty".to_string()));
        }

        let places = self.search(name, 1).await?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("no location matches \"{name}\"")))?;

        tracing::debug!(query = name, found = %place.name, coordinate = %place.coordinate, "geocoded");
        Ok(place.coordinate)
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        self.search(query, limit).await
    }
}

/// Convert raw results, dropping any with unparsable coordinates
fn to_places(raw: Vec<NominatimPlace>) -> Vec<Place> {
    raw.into_iter()
        .filter_map(|p| {
            let coordinate = Coordinate::new(p.lat.parse().ok()?, p.lon.parse().ok()?);
            if !coordinate.is_valid() {
                tracing::debug!(name = %p.display_name, "ignoring result with invalid coordinates");
                return None;
            }
            Some(Place {
                name: p.display_name,
                coordinate,
            })
        })
        .collect()
}
