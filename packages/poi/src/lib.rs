#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Returns typed points of interest within a radius of a coordinate,
//! ordered by ascending distance.

use std::sync::Arc;

use async_trait::async_trait;
use concierge_models::{Poi, PoiCategory};
use concierge_net::{http_client, retry, UpstreamError};
use geo::{Distance, Haversine, Point};
use serde::Deserialize;

/// Default search radius when the caller does not specify one.
pub const DEFAULT_RADIUS_METERS: f64 = 1500.0;

#[derive(Debug, thiserror::Error)]
pub enum PoiError {
    #[error("poi provider rejected credentials: {0}")]
    Auth(String),

    #[error("poi provider had a transient failure: {0}")]
    Transient(String),

    #[error("poi provider rejected the request: {0}")]
    Fatal(String),

    #[error("poi provider response could not be parsed: {0}")]
    Parse(String),
}

impl From<UpstreamError> for PoiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Auth(m) => Self::Auth(m),
            UpstreamError::Transient(m) => Self::Transient(m),
            UpstreamError::Fatal(m) => Self::Fatal(m),
            UpstreamError::Parse(m) => Self::Parse(m),
            UpstreamError::Timeout => Self::Transient("timed out".to_owned()),
        }
    }
}

#[async_trait]
pub trait PoiProvider: Send + Sync {
    /// Returns POIs near `(lat, lon)` within `radius_m`, ascending by
    /// distance. `categories` narrows the search; `None` returns all
    /// known categories.
    ///
    /// # Errors
    ///
    /// Returns [`PoiError`] on auth/transient/fatal failures.
    async fn pois_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        categories: Option<&[PoiCategory]>,
    ) -> Result<Vec<Poi>, PoiError>;
}

/// Lets a shared `Arc<dyn PoiProvider>` be used wherever a `PoiProvider`
/// is expected.
#[async_trait]
impl<T: PoiProvider + ?Sized> PoiProvider for Arc<T> {
    async fn pois_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        categories: Option<&[PoiCategory]>,
    ) -> Result<Vec<Poi>, PoiError> {
        (**self).pois_near(lat, lon, radius_m, categories).await
    }
}

pub struct HttpPoiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl HttpPoiProvider {
    #[must_use]
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: http_client(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.poi.concierge.dev/v1".to_owned()),
        }
    }

    /// Builds a provider from `POI_PROVIDER_API_KEY`/`POI_PROVIDER_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns a configuration message when `POI_PROVIDER_API_KEY` is
    /// absent.
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("POI_PROVIDER_API_KEY")
            .map_err(|_| "POI_PROVIDER_API_KEY is not set".to_owned())?;
        let base_url = std::env::var("POI_PROVIDER_BASE_URL").ok();
        Ok(Self::new(api_key, base_url))
    }
}

#[derive(Deserialize)]
struct PoiResponse {
    #[serde(default)]
    places: Vec<RawPoi>,
}

#[derive(Deserialize)]
struct RawPoi {
    name: String,
    category: String,
    latitude: f64,
    longitude: f64,
}

#[async_trait]
impl PoiProvider for HttpPoiProvider {
    async fn pois_near(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        categories: Option<&[PoiCategory]>,
    ) -> Result<Vec<Poi>, PoiError> {
        let url = format!("{}/places", self.base_url);
        let mut query = vec![
            ("lat".to_owned(), lat.to_string()),
            ("lon".to_owned(), lon.to_string()),
            ("radius_m".to_owned(), radius_m.to_string()),
        ];
        if let Some(cats) = categories {
            let joined = cats
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("categories".to_owned(), joined));
        }

        let value = retry::send_json(
            || self.client.get(&url).bearer_auth(&self.api_key).query(&query),
            &retry::RetryPolicy::default(),
        )
        .await?;

        let parsed: PoiResponse = serde_json::from_value(value)
            .map_err(|e| PoiError::Parse(format!("unexpected poi response: {e}")))?;

        let origin = Point::new(lon, lat);
        let mut pois: Vec<Poi> = parsed
            .places
            .into_iter()
            .map(|raw| {
                let target = Point::new(raw.longitude, raw.latitude);
                let distance_meters = Haversine.distance(origin, target);
                Poi {
                    name: raw.name,
                    category: raw.category.parse().unwrap_or(PoiCategory::Other),
                    latitude: raw.latitude,
                    longitude: raw.longitude,
                    distance_meters,
                }
            })
            .collect();

        pois.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        Ok(pois)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::{HttpPoiProvider, PoiProvider};

    #[tokio::test]
    async fn orders_results_by_ascending_distance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/places"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "places": [
                    {"name": "Far School", "category": "school", "latitude": 37.20, "longitude": -8.0},
                    {"name": "Near Cafe", "category": "cafe", "latitude": 37.020, "longitude": -7.931}
                ]
            })))
            .mount(&server)
            .await;

        let provider = HttpPoiProvider::new("key".to_owned(), Some(server.uri()));
        let pois = provider
            .pois_near(37.0194, -7.9304, 1500.0, None)
            .await
            .unwrap();
        assert_eq!(pois[0].name, "Near Cafe");
        assert!(pois[0].distance_meters < pois[1].distance_meters);
    }
}
