pub mod activity;
pub mod availability;
pub mod profile;
pub mod ranker;
pub mod skills;
pub mod weights;

pub use activity::score_activity;
pub use availability::{AvailabilitySignal, normalize_availability, score_availability};
pub use profile::{PodSnapshot, PodState, Profile, Role, normalize_roles};
pub use ranker::{Ranker, RankerConfig, ScoreBreakdown, ScoredCandidate, rank_candidates};
pub use skills::{SYNERGY_PAIRS, SkillsSignal, normalize_skills, score_skills};
pub use weights::{QUICKMATCH_WEIGHTS, RankMode, RankWeights, SKILLMATCH_WEIGHTS};
