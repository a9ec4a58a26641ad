use serde::{Deserialize, Serialize};

/// One short narrative data point surfaced by the community agent, e.g. a
/// recent local news mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityStory {
    pub title: String,
    pub summary: String,
}

/// Neighborhood score and narrative for the top-ranked candidate in a
/// result set. Produced once per completed search by the community agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityReport {
    pub overall_score: f32,
    pub school_rating: f32,
    pub safety_score: f32,
    pub overall_explanation: String,
    pub school_explanation: String,
    pub safety_explanation: String,
    pub positive_stories: Vec<CommunityStory>,
    pub negative_stories: Vec<CommunityStory>,
}

impl CommunityReport {
    /// Clamps all three scores into `[0, 10]`, logging a warning for each
    /// one that was out of range. The community agent calls this on every
    /// report it builds from LLM output before returning it.
    pub fn clamp_scores(&mut self) {
        for (name, score) in [
            ("overall_score", &mut self.overall_score),
            ("school_rating", &mut self.school_rating),
            ("safety_score", &mut self.safety_score),
        ] {
            let clamped = score.clamp(0.0, 10.0);
            if (clamped - *score).abs() > f32::EPSILON {
                log::warn!("community report {name} out of range ({score}), clamped to {clamped}");
            }
            *score = clamped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CommunityReport;

    #[test]
    fn clamp_scores_bounds_to_zero_ten() {
        let mut report = CommunityReport {
            overall_score: 12.5,
            school_rating: -3.0,
            safety_score: 7.0,
            overall_explanation: String::new(),
            school_explanation: String::new(),
            safety_explanation: String::new(),
            positive_stories: Vec::new(),
            negative_stories: Vec::new(),
        };
        report.clamp_scores();
        assert!((report.overall_score - 10.0).abs() < f32::EPSILON);
        assert!((report.school_rating - 0.0).abs() < f32::EPSILON);
        assert!((report.safety_score - 7.0).abs() < f32::EPSILON);
    }
}
