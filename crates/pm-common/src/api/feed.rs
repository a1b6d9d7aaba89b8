use serde::{Deserialize, Serialize};

use crate::db::UserRecord;
use crate::matching::{ScoreBreakdown, ScoredCandidate};

/// Caps applied to the profile excerpts shown in the feed. The full
/// profile stays behind the pod view; the feed only needs a teaser.
const FEED_SKILLS_CAP: usize = 6;
const FEED_AVAILABILITY_CAP: usize = 3;

/// One candidate card in the recommendations feed: the ranker's verdict
/// joined back against the candidate's profile record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationEntry {
    pub user_id: String,
    pub display_name: String,
    pub role_prefs: Vec<String>,
    pub skills: Vec<String>,
    pub availability: Vec<String>,
    pub score: f64,
    pub reasons: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

impl RecommendationEntry {
    pub fn from_scored(scored: &ScoredCandidate, user: &UserRecord) -> Self {
        Self {
            user_id: scored.user_id.clone(),
            display_name: user.display_name.clone(),
            role_prefs: user.role_prefs.clone(),
            skills: user.skills.iter().take(FEED_SKILLS_CAP).cloned().collect(),
            availability: user
                .availability
                .iter()
                .take(FEED_AVAILABILITY_CAP)
                .cloned()
                .collect(),
            score: scored.score,
            reasons: scored.reasons.clone(),
            breakdown: scored.breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedResponse {
    pub course_code: String,
    pub mode: String,
    pub entries: Vec<RecommendationEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn feed_entry_caps_skills_and_availability() {
        let user = UserRecord {
            user_id: "u1".into(),
            display_name: "Ava".into(),
            role_prefs: vec!["Backend".into()],
            skills: (0..10).map(|i| format!("skill{i}")).collect(),
            availability: vec![
                "Mon evening".into(),
                "Tue evening".into(),
                "Wed evening".into(),
                "Thu evening".into(),
            ],
            course_codes: vec!["CS471".into()],
            created_at: Utc::now(),
        };
        let scored = ScoredCandidate {
            user_id: "u1".into(),
            score: 42.0,
            reasons: vec!["complements your Frontend focus with Backend".into()],
            breakdown: ScoreBreakdown::default(),
        };

        let entry = RecommendationEntry::from_scored(&scored, &user);
        assert_eq!(entry.skills.len(), 6);
        assert_eq!(entry.availability.len(), 3);
        assert_eq!(entry.display_name, "Ava");
        assert_eq!(entry.score, 42.0);
    }
}
