use concierge_models::Requirements;

/// Builds one deterministic search string from requirements: location,
/// rent/buy verb, bedrooms, and budget. Rental intent appends rent terms,
/// sale intent appends sale terms.
pub fn synthesize(requirements: &Requirements) -> String {
    let mut parts = Vec::new();

    if let Some(bedrooms) = requirements.bedrooms {
        parts.push(format!("T{bedrooms}"));
    }

    parts.push(requirements.location.clone());

    if requirements.is_rent {
        parts.push("arrendar".to_owned());
        parts.push("rent".to_owned());
    } else {
        parts.push("comprar".to_owned());
        parts.push("for sale".to_owned());
    }

    if let Some(max) = requirements.budget_max {
        parts.push(format!("até {max:.0}€"));
    }

    parts.join(" ")
}
