#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain types shared by every agent in the concierge pipeline.
//!
//! These types carry data between stages in-process; none of them are
//! serialized over a wire between agents. The `Serialize`/`Deserialize`
//! derives exist only for the HTTP surface (`concierge_server_models`) and
//! for LLM JSON extraction in `concierge_llm`/`concierge_research`.

mod candidate;
mod community;
mod envelope;
mod municipality;
mod negotiation;
mod poi;
mod requirements;

pub use candidate::{Candidate, EnrichedCandidate, GeoCandidate};
pub use community::{CommunityReport, CommunityStory};
pub use envelope::{Envelope, EnvelopeKind};
pub use municipality::{
    coordinates_within_bounding_box, find as find_municipality, Municipality, MUNICIPALITIES,
};
pub use negotiation::NegotiationRecord;
pub use poi::{Poi, PoiCategory};
pub use requirements::Requirements;
