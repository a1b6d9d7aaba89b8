/// Skillmatch weights (default feed).
/// Purpose: targeted matching. Role coverage dominates because filling a
/// structural gap in a pod beats any single overlap signal.
pub const SKILLMATCH_WEIGHTS: RankWeights = RankWeights {
    role: 50.0,
    availability: 20.0,
    skills: 20.0,
    activity: 10.0,
    diversity_penalty: 15.0,
};

/// Quickmatch weights.
/// Purpose: surface people who are around right now. Availability and
/// recent activity dominate; role fit is secondary.
pub const QUICKMATCH_WEIGHTS: RankWeights = RankWeights {
    role: 20.0,
    availability: 40.0,
    skills: 15.0,
    activity: 35.0,
    diversity_penalty: 15.0,
};

/// Point budgets per signal. These are not probabilities: each signal
/// function yields a sub-score in [0, 1] which is multiplied by its budget,
/// and the penalty budget is subtracted rather than added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankWeights {
    pub role: f64,
    pub availability: f64,
    pub skills: f64,
    pub activity: f64,
    pub diversity_penalty: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RankMode {
    #[default]
    SkillMatch,
    QuickMatch,
}

impl RankMode {
    /// Resolve a caller-supplied mode string. Unknown values fall back to
    /// the default mode instead of failing.
    pub fn from_param(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "quickmatch" => RankMode::QuickMatch,
            _ => RankMode::SkillMatch,
        }
    }

    pub fn weights(self) -> RankWeights {
        match self {
            RankMode::SkillMatch => SKILLMATCH_WEIGHTS,
            RankMode::QuickMatch => QUICKMATCH_WEIGHTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_are_positive() {
        for weights in [SKILLMATCH_WEIGHTS, QUICKMATCH_WEIGHTS] {
            assert!(weights.role > 0.0);
            assert!(weights.availability > 0.0);
            assert!(weights.skills > 0.0);
            assert!(weights.activity > 0.0);
            assert!(weights.diversity_penalty > 0.0);
        }
    }

    #[test]
    fn modes_share_the_penalty_budget() {
        assert_eq!(
            SKILLMATCH_WEIGHTS.diversity_penalty,
            QUICKMATCH_WEIGHTS.diversity_penalty
        );
    }

    #[test]
    fn unknown_mode_falls_back_to_skillmatch() {
        assert_eq!(RankMode::from_param("quickmatch"), RankMode::QuickMatch);
        assert_eq!(RankMode::from_param("QuickMatch"), RankMode::QuickMatch);
        assert_eq!(RankMode::from_param("skillmatch"), RankMode::SkillMatch);
        assert_eq!(RankMode::from_param("speedrun"), RankMode::SkillMatch);
        assert_eq!(RankMode::from_param(""), RankMode::SkillMatch);
    }

    #[test]
    fn mode_selects_matching_weight_table() {
        assert_eq!(RankMode::QuickMatch.weights().availability, 40.0);
        assert_eq!(RankMode::SkillMatch.weights().role, 50.0);
    }
}
