use concierge_models::Candidate;

use crate::allowlist::source_priority;

/// Stable sort by (coordinate-present desc, image-present desc,
/// price-present desc, source-priority desc). This runs before mapping
/// (C7) ever resolves a coordinate, so `Candidate` has no coordinate
/// field to sort on at all — the first key component is permanently a
/// tie here, leaving `(image-present, price-present, source-priority)`
/// as the sort that actually runs.
#[must_use]
pub fn rank(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        let key = |c: &Candidate| (c.image_url.is_some(), c.price.is_some(), source_priority(&c.url));
        key(b).cmp(&key(a))
    });
    candidates
}

#[cfg(test)]
mod tests {
    use concierge_models::Candidate;

    use super::rank;

    fn candidate(title: &str, image: bool, price: Option<f64>) -> Candidate {
        candidate_from(title, image, price, "idealista.pt")
    }

    fn candidate_from(title: &str, image: bool, price: Option<f64>, domain: &str) -> Candidate {
        Candidate {
            title: title.to_owned(),
            address: String::new(),
            description: String::new(),
            url: format!("https://{domain}/{title}"),
            image_url: image.then(|| "https://img".to_owned()),
            price,
            currency: "EUR".to_owned(),
            is_rent: true,
            bedrooms: None,
            bathrooms: None,
            area_sqm: None,
            property_type: None,
            raw_markdown: String::new(),
        }
    }

    #[test]
    fn prefers_candidates_with_image_and_price() {
        let candidates = vec![
            candidate("no-image-no-price", false, None),
            candidate("image-and-price", true, Some(800.0)),
            candidate("price-only", false, Some(800.0)),
        ];
        let ranked = rank(candidates);
        assert_eq!(ranked[0].title, "image-and-price");
        assert_eq!(ranked[2].title, "no-image-no-price");
    }

    #[test]
    fn breaks_ties_by_source_priority() {
        let candidates = vec![
            candidate_from("from-redfin", true, Some(800.0), "redfin.com"),
            candidate_from("from-idealista", true, Some(800.0), "idealista.pt"),
        ];
        let ranked = rank(candidates);
        assert_eq!(ranked[0].title, "from-idealista");
    }
}
