use serde::{Deserialize, Serialize};

use crate::poi::Poi;

/// A property listing as scraped from a real-estate site, before any
/// geocoding or enrichment has happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub address: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
    pub price: Option<f64>,
    pub currency: String,
    pub is_rent: bool,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub area_sqm: Option<f64>,
    pub property_type: Option<String>,
    /// The scraped markdown the listing fields were extracted from.
    pub raw_markdown: String,
}

/// A [`Candidate`] augmented with a coordinate resolved by the mapping
/// agent. `geocode_confidence` is in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub latitude: f64,
    pub longitude: f64,
    pub geocode_confidence: f32,
}

/// A [`GeoCandidate`] with nearby points of interest attached by the local
/// discovery agent. `pois` is empty, not absent, when discovery was skipped
/// or failed for this candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    #[serde(flatten)]
    pub geo: GeoCandidate,
    pub pois: Vec<Poi>,
}
