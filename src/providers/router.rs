//! `OpenRouteService` directions

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{Router, error_body, http_client, read_json};
use crate::config::{HttpConfig, RouterConfig};
use crate::geo::{Coordinate, Route};
use crate::retry::{RetryPolicy, send_with_retry};
use crate::{Error, Result};

/// Directions response; the GET endpoint answers with GeoJSON `features`,
/// the JSON endpoint with `routes`
#[derive(Debug, Default, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    routes: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<[f64; 2]>,
}

/// Router backed by the `OpenRouteService` directions API
pub struct OpenRouteServiceRouter {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    profile: String,
    retry: RetryPolicy,
}

impl OpenRouteServiceRouter {
    /// Create a router
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: &str, config: &RouterConfig, http: HttpConfig) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "OpenRouteService API key required for routing".to_string(),
            ));
        }

        Ok(Self {
            client: http_client(http.timeout, concat!("route-narrator/", env!("CARGO_PKG_VERSION")))?,
            api_key: SecretString::from(api_key.to_string()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
            retry: RetryPolicy::for_http(http),
        })
    }

    async fn fetch(&self, start: Coordinate, end: Coordinate) -> Result<Route> {
        let url = format!("{}/v2/directions/{}", self.base_url, self.profile);
        let start_param = format!("{},{}", start.lon, start.lat);
        let end_param = format!("{},{}", end.lon, end.lat);

        let response = send_with_retry(&self.retry, "route", || {
            self.client
                .get(&url)
                .header("Authorization", self.api_key.expose_secret())
                .query(&[("start", start_param.as_str()), ("end", end_param.as_str())])
                .send()
        })
        .await?;

        if !response.status().is_success() {
            return Err(Error::Routing(format!(
                "OpenRouteService error {}",
                error_body(response).await
            )));
        }

        let directions: DirectionsResponse =
            read_json(response, "OpenRouteService", Error::Routing).await?;
        to_route(directions)
    }
}

#[async_trait]
impl Router for OpenRouteServiceRouter {
    async fn route(&self, start: Coordinate, end: Coordinate) -> Result<Route> {
        let route = self.fetch(start, end).await?;
        tracing::debug!(points = route.len(), %start, %end, "route received");
        Ok(route)
    }
}

fn to_route(directions: DirectionsResponse) -> Result<Route> {
    let geometry = directions
        .features
        .into_iter()
        .chain(directions.routes)
        .next()
        .map(|f| f.geometry)
        .ok_or_else(|| Error::Routing("response contained no route".to_string()))?;

    Route::new(
        geometry
            .coordinates
            .into_iter()
            .map(Coordinate::from_lon_lat)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geojson_response() {
        let body = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"summary": {"distance": 1234.5}},
                "geometry": {"type": "LineString", "coordinates": [[-122.3, 47.6], [-122.31, 47.61], [-122.35, 47.62]]}
            }]
        }"#;
        let route = to_route(serde_json::from_str(body).unwrap()).unwrap();

        assert_eq!(route.len(), 3);
        assert!((route.start().lat - 47.6).abs() < 1e-9);
        assert!((route.start().lon + 122.3).abs() < 1e-9);
        assert!((route.end().lat - 47.62).abs() < 1e-9);
    }

    #[test]
    fn test_routes_response() {
        let body = r#"{"routes": [{"geometry": {"coordinates": [[8.68, 49.41], [8.69, 49.42]]}}]}"#;
        let route = to_route(serde_json::from_str(body).unwrap()).unwrap();
        assert_eq!(route.len(), 2);
        assert!((route.end().lon - 8.69).abs() < 1e-9);
    }

    #[test]
    fn test_no_route_is_error() {
        let err = to_route(serde_json::from_str("{}").unwrap()).unwrap_err();
        assert!(matches!(err, Error::Routing(_)));

        let body = r#"{"features": [{"geometry": {"coordinates": []}}]}"#;
        let err = to_route(serde_json::from_str(body).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Routing(_)));
    }

    #[test]
    fn test_requires_api_key() {
        let config = RouterConfig {
            base_url: "https://ors.example".to_string(),
            profile: "driving-car".to_string(),
        };
        assert!(matches!(
            OpenRouteServiceRouter::new("", &config, HttpConfig::default()),
            Err(Error::Config(_))
        ));
    }
}
