use serde::{Deserialize, Serialize};

/// The kind of amenity a [`Poi`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoiCategory {
    School,
    Hospital,
    Grocery,
    Restaurant,
    Park,
    TransitStation,
    Cafe,
    Gym,
    Other,
}

impl PoiCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::School => "school",
            Self::Hospital => "hospital",
            Self::Grocery => "grocery",
            Self::Restaurant => "restaurant",
            Self::Park => "park",
            Self::TransitStation => "transit_station",
            Self::Cafe => "cafe",
            Self::Gym => "gym",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PoiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school" => Ok(Self::School),
            "hospital" => Ok(Self::Hospital),
            "grocery" | "supermarket" => Ok(Self::Grocery),
            "restaurant" => Ok(Self::Restaurant),
            "park" => Ok(Self::Park),
            "transit_station" | "station" => Ok(Self::TransitStation),
            "cafe" => Ok(Self::Cafe),
            "gym" => Ok(Self::Gym),
            _ => Ok(Self::Other),
        }
    }
}

/// A point of interest near a property, attached by the local discovery
/// agent. Ordering within an [`EnrichedCandidate`](crate::EnrichedCandidate)
/// is ascending `distance_meters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub name: String,
    pub category: PoiCategory,
    pub latitude: f64,
    pub longitude: f64,
    pub distance_meters: f64,
}
