use concierge_models::{Candidate, Requirements};
use unicode_normalization::UnicodeNormalization;

/// Drops candidates whose address/title does not contain the
/// requirement's location token (case- and diacritic-insensitive) OR
/// whose coordinates fall outside a ~0.5° bounding box around a known
/// center for that location. A candidate surviving either check is kept.
pub fn apply(candidates: Vec<Candidate>, requirements: &Requirements) -> Vec<Candidate> {
    budget_and_rooms(
        candidates
            .into_iter()
            .filter(|c| location_matches(c, &requirements.location))
            .collect(),
        requirements,
    )
}

/// Same as [`apply`] but without the bedrooms filter, used for the
/// broadened retry when too few candidates survive.
pub fn apply_without_rooms(
    candidates: Vec<Candidate>,
    requirements: &Requirements,
) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| location_matches(c, &requirements.location))
        .filter(|c| within_budget(c, requirements))
        .collect()
}

fn budget_and_rooms(candidates: Vec<Candidate>, requirements: &Requirements) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| within_budget(c, requirements))
        .filter(|c| matches_bedrooms(c, requirements))
        .collect()
}

fn within_budget(candidate: &Candidate, requirements: &Requirements) -> bool {
    match (candidate.price, requirements.budget_max) {
        (Some(price), Some(max)) => price <= max,
        _ => true,
    }
}

fn matches_bedrooms(candidate: &Candidate, requirements: &Requirements) -> bool {
    match (candidate.bedrooms, requirements.bedrooms) {
        (Some(have), Some(want)) => have == want,
        (None, Some(_)) => true,
        _ => true,
    }
}

/// `true` if `candidate`'s address/title contains `location` token,
/// normalized for case and diacritics. Candidates have no coordinates at
/// this stage (mapping runs after research), so only the text signal
/// applies here; `concierge_models::coordinates_within_bounding_box` is
/// the companion check the mapping agent runs once a candidate has a
/// coordinate, and the two together implement the "either matches"
/// location law.
#[must_use]
pub fn location_matches(candidate: &Candidate, location: &str) -> bool {
    if location.is_empty() {
        return true;
    }

    normalize(&candidate.address).contains(&normalize(location))
        || normalize(&candidate.title).contains(&normalize(location))
}

fn normalize(input: &str) -> String {
    input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use concierge_models::{Candidate, Requirements};

    use super::{apply, location_matches};

    fn candidate(title: &str, address: &str, price: Option<f64>, bedrooms: Option<u32>) -> Candidate {
        Candidate {
            title: title.to_owned(),
            address: address.to_owned(),
            description: String::new(),
            url: "https://idealista.pt/x".to_owned(),
            image_url: None,
            price,
            currency: "EUR".to_owned(),
            is_rent: true,
            bedrooms,
            bathrooms: None,
            area_sqm: None,
            property_type: None,
            raw_markdown: String::new(),
        }
    }

    #[test]
    fn location_match_is_diacritic_and_case_insensitive() {
        let c = candidate("T2 em Loulé", "Rua X, LOULE", None, None);
        assert!(location_matches(&c, "loulé"));
    }

    #[test]
    fn apply_drops_over_budget_and_wrong_bedrooms() {
        let reqs = Requirements {
            location: "Faro".to_owned(),
            budget_max: Some(900.0),
            bedrooms: Some(2),
            ..Requirements::default()
        };
        let candidates = vec![
            candidate("T2 Faro", "Faro centro", Some(850.0), Some(2)),
            candidate("T3 Faro", "Faro centro", Some(850.0), Some(3)),
            candidate("T2 Faro caro", "Faro centro", Some(1200.0), Some(2)),
        ];
        let filtered = apply(candidates, &reqs);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].title, "T2 Faro");
    }
}
