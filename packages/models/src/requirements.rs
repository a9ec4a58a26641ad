use serde::{Deserialize, Serialize};

/// Structured housing criteria collected by the scoping agent.
///
/// `location` is the only field required before a search can run; everything
/// else narrows the result set when present. Fields are merged turn over
/// turn by the scoping agent (later non-null values overwrite earlier ones),
/// so every field here is optional except `location`, which starts empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub location: String,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    #[serde(default)]
    pub is_rent: bool,
    pub additional_info: Option<String>,
}

impl Requirements {
    /// Merges `other` into `self`, keeping `self`'s value for any field
    /// `other` leaves null. Used by the scoping agent to accumulate
    /// requirements across turns without discarding prior answers.
    pub fn merge(&mut self, other: Self) {
        if !other.location.is_empty() {
            self.location = other.location;
        }
        if other.bedrooms.is_some() {
            self.bedrooms = other.bedrooms;
        }
        if other.bathrooms.is_some() {
            self.bathrooms = other.bathrooms;
        }
        if other.budget_min.is_some() {
            self.budget_min = other.budget_min;
        }
        if other.budget_max.is_some() {
            self.budget_max = other.budget_max;
        }
        if other.is_rent {
            self.is_rent = true;
        }
        if other.additional_info.is_some() {
            self.additional_info = other.additional_info;
        }
    }

    /// `true` once enough fields are populated to attempt a search: a
    /// non-empty location and at least one of bedrooms/budget_max.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        !self.location.is_empty() && (self.bedrooms.is_some() || self.budget_max.is_some())
    }

    /// Rejects a budget range where `min > max`. The scoping agent calls
    /// this before accepting a merged record as `Complete`.
    ///
    /// # Errors
    ///
    /// Returns an error message when `budget_min` exceeds `budget_max`.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.budget_min, self.budget_max)
            && min > max
        {
            return Err(format!(
                "budget_min ({min}) must not exceed budget_max ({max})"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Requirements;

    #[test]
    fn merge_keeps_prior_value_when_new_is_null() {
        let mut req = Requirements {
            location: "Faro".to_owned(),
            bedrooms: Some(2),
            ..Requirements::default()
        };
        req.merge(Requirements {
            location: String::new(),
            bedrooms: None,
            budget_max: Some(900.0),
            ..Requirements::default()
        });
        assert_eq!(req.location, "Faro");
        assert_eq!(req.bedrooms, Some(2));
        assert_eq!(req.budget_max, Some(900.0));
    }

    #[test]
    fn validate_rejects_inverted_budget() {
        let req = Requirements {
            budget_min: Some(1000.0),
            budget_max: Some(500.0),
            ..Requirements::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn is_searchable_requires_location_and_one_of_bedrooms_or_budget() {
        let mut req = Requirements::default();
        assert!(!req.is_searchable());
        req.location = "Lagos".to_owned();
        assert!(!req.is_searchable());
        req.budget_max = Some(1200.0);
        assert!(req.is_searchable());
    }
}
