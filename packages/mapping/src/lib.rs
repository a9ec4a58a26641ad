#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Resolves a coordinate for each candidate in an ordered list, preserving
//! order and dropping candidates that fail every resolution strategy.

use std::sync::Arc;
use std::time::Duration;

use concierge_geocoder::{GeocodeResult, Geocoder};
use concierge_models::{coordinates_within_bounding_box, Candidate, GeoCandidate};
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;

/// Upper bound on parallel geocode calls for one batch.
const CONCURRENCY: usize = 8;
/// Shared deadline for an entire mapping batch; entries still unresolved
/// when this elapses are treated as failed.
const BATCH_DEADLINE: Duration = Duration::from_secs(20);

pub struct MappingAgent<G: Geocoder> {
    geocoder: G,
}

impl<G: Geocoder> MappingAgent<G> {
    pub const fn new(geocoder: G) -> Self {
        Self { geocoder }
    }

    /// Resolves a coordinate for each candidate via, in order: existing
    /// coordinates (none exist on a freshly-extracted [`Candidate`], so
    /// this strategy is reserved for future inputs that already carry
    /// one), `geocode(full_address)`, then `geocode(city, country)`
    /// derived from the address's last comma-separated segment. A
    /// resolved coordinate that falls outside `location`'s bounding box
    /// (§4.6) is treated as a failed attempt for that strategy, not a
    /// result — it falls through to the next strategy rather than
    /// shipping a geocode that landed in the wrong municipality. Input
    /// order is preserved; candidates where every strategy fails, or the
    /// batch deadline elapses first, are dropped.
    pub async fn run(&self, candidates: Vec<Candidate>, location: &str) -> Vec<GeoCandidate> {
        let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
        let geocoder = &self.geocoder;

        let work = stream::iter(candidates.into_iter().enumerate())
            .map(|(index, candidate)| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    let _permit = semaphore.acquire().await.ok()?;
                    resolve(geocoder, candidate, location)
                        .await
                        .map(|gc| (index, gc))
                }
            })
            .buffer_unordered(CONCURRENCY)
            .filter_map(|result| async move { result })
            .collect::<Vec<_>>();

        let mut resolved = match tokio::time::timeout(BATCH_DEADLINE, work).await {
            Ok(resolved) => resolved,
            Err(_) => {
                log::warn!("mapping batch deadline elapsed before all candidates resolved");
                Vec::new()
            }
        };

        resolved.sort_by_key(|(index, _)| *index);
        resolved.into_iter().map(|(_, gc)| gc).collect()
    }
}

async fn resolve(
    geocoder: &(impl Geocoder + ?Sized),
    candidate: Candidate,
    location: &str,
) -> Option<GeoCandidate> {
    if let Some(result) = try_geocode(geocoder, &candidate.address, None, location).await {
        return Some(to_geo_candidate(candidate, result));
    }

    if let Some(city) = candidate.address.split(',').next_back() {
        if let Some(result) = try_geocode(geocoder, city.trim(), None, location).await {
            return Some(to_geo_candidate(candidate, result));
        }
    }

    log::debug!("mapping agent could not resolve a coordinate for '{}'", candidate.title);
    None
}

async fn try_geocode(
    geocoder: &(impl Geocoder + ?Sized),
    query: &str,
    country_hint: Option<&str>,
    location: &str,
) -> Option<(f64, f64, f32)> {
    match geocoder.geocode(query, country_hint).await {
        Ok(GeocodeResult::Found {
            latitude,
            longitude,
            confidence,
            ..
        }) => {
            if coordinates_within_bounding_box(latitude, longitude, location) {
                Some((latitude, longitude, confidence))
            } else {
                log::debug!("geocode for '{query}' landed outside {location}'s bounding box, ignoring");
                None
            }
        }
        Ok(GeocodeResult::NotFound) => None,
        Err(err) => {
            log::warn!("geocode failed for '{query}': {err}");
            None
        }
    }
}

fn to_geo_candidate(candidate: Candidate, (latitude, longitude, confidence): (f64, f64, f32)) -> GeoCandidate {
    GeoCandidate {
        candidate,
        latitude,
        longitude,
        geocode_confidence: confidence,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use concierge_geocoder::{GeocodeError, GeocodeResult, Geocoder};
    use concierge_models::Candidate;

    use super::MappingAgent;

    struct ScriptedGeocoder {
        results: Mutex<Vec<Result<GeocodeResult, ()>>>,
    }

    #[async_trait]
    impl Geocoder for ScriptedGeocoder {
        async fn geocode(
            &self,
            _query: &str,
            _country_hint: Option<&str>,
        ) -> Result<GeocodeResult, GeocodeError> {
            match self.results.lock().unwrap().remove(0) {
                Ok(r) => Ok(r),
                Err(()) => Err(GeocodeError::Transient("boom".to_owned())),
            }
        }
    }

    fn candidate(title: &str, address: &str) -> Candidate {
        Candidate {
            title: title.to_owned(),
            address: address.to_owned(),
            description: String::new(),
            url: format!("https://idealista.pt/{title}"),
            image_url: None,
            price: None,
            currency: "EUR".to_owned(),
            is_rent: true,
            bedrooms: None,
            bathrooms: None,
            area_sqm: None,
            property_type: None,
            raw_markdown: String::new(),
        }
    }

    #[tokio::test]
    async fn preserves_order_and_drops_unresolvable() {
        let geocoder = ScriptedGeocoder {
            results: Mutex::new(vec![
                Ok(GeocodeResult::NotFound),
                Ok(GeocodeResult::NotFound),
                Ok(GeocodeResult::Found {
                    latitude: 37.1,
                    longitude: -8.0,
                    confidence: 0.9,
                    normalized_address: "Faro".to_owned(),
                }),
            ]),
        };
        let agent = MappingAgent::new(geocoder);
        let candidates = vec![candidate("first", "Rua A, Faro")];
        let resolved = agent.run(candidates, "Faro").await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].candidate.title, "first");
    }

    #[tokio::test]
    async fn drops_geocode_landing_outside_the_requested_municipality() {
        let out_of_bounds = || {
            Ok(GeocodeResult::Found {
                latitude: 41.15,
                longitude: -8.62,
                confidence: 0.9,
                normalized_address: "Porto".to_owned(),
            })
        };
        let geocoder = ScriptedGeocoder {
            results: Mutex::new(vec![out_of_bounds(), out_of_bounds()]),
        };
        let agent = MappingAgent::new(geocoder);
        let candidates = vec![candidate("mislocated", "Rua A, Faro")];
        let resolved = agent.run(candidates, "Faro").await;
        assert!(resolved.is_empty());
    }
}
