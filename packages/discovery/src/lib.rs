#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Attaches nearby points of interest to an ordered [`GeoCandidate`] list,
//! preserving order and always succeeding as a batch: a per-candidate POI
//! lookup failure yields an empty POI list for that candidate only.

use std::sync::Arc;

use concierge_models::EnrichedCandidate;
use concierge_poi::PoiProvider;
use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;

/// Only the top-ranked candidates get a POI lookup; the rest get an empty
/// list without spending an external call.
const TOP_N: usize = 5;
/// Bounded concurrency for POI lookups.
const CONCURRENCY: usize = 4;

pub struct LocalDiscoveryAgent<P: PoiProvider> {
    poi: P,
}

impl<P: PoiProvider> LocalDiscoveryAgent<P> {
    pub const fn new(poi: P) -> Self {
        Self { poi }
    }

    /// Enriches the top [`TOP_N`] candidates with POIs near their
    /// coordinate (radius [`concierge_poi::DEFAULT_RADIUS_METERS`]); the
    /// remainder get an empty POI list. Preserves input order; never
    /// drops a candidate.
    pub async fn run(
        &self,
        candidates: Vec<concierge_models::GeoCandidate>,
    ) -> Vec<EnrichedCandidate> {
        let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
        let poi = &self.poi;

        stream::iter(candidates.into_iter().enumerate())
            .map(|(index, geo)| {
                let semaphore = Arc::clone(&semaphore);
                async move {
                    if index >= TOP_N {
                        return EnrichedCandidate {
                            pois: Vec::new(),
                            geo,
                        };
                    }
                    let _permit = semaphore.acquire().await.ok();
                    let pois = poi
                        .pois_near(
                            geo.latitude,
                            geo.longitude,
                            concierge_poi::DEFAULT_RADIUS_METERS,
                            None,
                        )
                        .await
                        .unwrap_or_else(|err| {
                            log::warn!(
                                "poi lookup failed for '{}': {err}",
                                geo.candidate.title
                            );
                            Vec::new()
                        });
                    EnrichedCandidate { geo, pois }
                }
            })
            .buffered(CONCURRENCY)
            .collect()
            .await
    }
}
