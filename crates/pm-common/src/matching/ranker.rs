use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::activity::score_activity;
use super::availability::{AvailabilitySignal, normalize_availability, score_availability};
use super::profile::{PodSnapshot, PodState, Profile, Role, normalize_roles};
use super::skills::{SYNERGY_PAIRS, SkillsSignal, normalize_skills, score_skills};
use super::weights::{RankMode, RankWeights};

/// Reason thresholds, in points. A signal only earns a slot in the
/// explanation when it contributed more than its threshold, so weak
/// signals don't clutter the text.
const ROLE_REASON_MIN_PTS: f64 = 10.0;
const SKILLS_REASON_MIN_PTS: f64 = 6.0;
const AVAILABILITY_REASON_MIN_PTS: f64 = 4.0;
const ACTIVITY_REASON_MIN_PTS: f64 = 3.0;

const MAX_REASONS: usize = 3;

#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub weights: RankWeights,
    pub synergy_pairs: &'static [(&'static str, &'static str)],
    pub debug: bool,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            weights: RankMode::SkillMatch.weights(),
            synergy_pairs: SYNERGY_PAIRS,
            debug: false,
        }
    }
}

impl RankerConfig {
    pub fn for_mode(mode: RankMode) -> Self {
        Self {
            weights: mode.weights(),
            ..Self::default()
        }
    }
}

/// Per-signal point contributions. The penalty is reported as a negative
/// number so the fields sum to the total score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreBreakdown {
    pub role: f64,
    pub skills: f64,
    pub availability: f64,
    pub activity: f64,
    pub diversity_penalty: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub user_id: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

/// The candidate-ranking engine. A pure transform over already-loaded
/// profiles: no I/O, no shared state, no wall-clock reads.
pub struct Ranker {
    config: RankerConfig,
}

impl Ranker {
    pub fn new(config: RankerConfig) -> Self {
        Self { config }
    }

    pub fn for_mode(mode: RankMode) -> Self {
        Self::new(RankerConfig::for_mode(mode))
    }

    /// Score and order `candidates` for `me`. The requester and anyone in
    /// `swiped` are skipped. Ties break on user id ascending so the order
    /// is total and stable across calls.
    pub fn rank(
        &self,
        me: &Profile,
        candidates: &[Profile],
        pod_state: Option<&PodState>,
        swiped: &HashSet<String>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate> {
        let weights = self.config.weights;

        let me_primary = me.primary_role();
        let me_skills = normalize_skills(&me.skills);
        let me_avail = normalize_availability(&me.availability);

        let pod = PodSnapshot::from_state(pod_state);
        let missing = pod.missing_roles();
        let in_pod = pod.in_pod();

        let mut ranked: Vec<ScoredCandidate> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.user_id.is_empty()
                || candidate.user_id == me.user_id
                || swiped.contains(&candidate.user_id)
            {
                continue;
            }

            let cand_roles = normalize_roles(&candidate.role_prefs);
            let cand_primary = cand_roles.first().copied();
            let cand_skills = normalize_skills(&candidate.skills);
            let cand_avail = normalize_availability(&candidate.availability);

            let (role_s, role_reason) = score_role(me_primary, &cand_roles, &missing, in_pod);
            let (skills_s, skills_signal) =
                score_skills(&me_skills, &cand_skills, self.config.synergy_pairs);
            let (avail_s, avail_signal) = score_availability(&me_avail, &cand_avail);
            let (activity_s, activity_reason) = score_activity(candidate.last_active_at, now);
            let penalty_s = diversity_penalty(me_primary, &me_skills, cand_primary, &cand_skills);

            let role_pts = weights.role * role_s.clamp(0.0, 1.0);
            let skills_pts = weights.skills * skills_s.clamp(0.0, 1.0);
            let avail_pts = weights.availability * avail_s.clamp(0.0, 1.0);
            let activity_pts = weights.activity * activity_s.clamp(0.0, 1.0);
            let penalty_pts = weights.diversity_penalty * penalty_s.clamp(0.0, 1.0);

            let total = role_pts + skills_pts + avail_pts + activity_pts - penalty_pts;

            let breakdown = ScoreBreakdown {
                role: round2(role_pts),
                skills: round2(skills_pts),
                availability: round2(avail_pts),
                activity: round2(activity_pts),
                diversity_penalty: round2(-penalty_pts),
            };

            let reasons = pick_reasons(
                &role_reason,
                role_pts,
                &skills_signal,
                skills_pts,
                &avail_signal,
                avail_pts,
                activity_reason,
                activity_pts,
            );

            ranked.push(ScoredCandidate {
                user_id: candidate.user_id.clone(),
                score: round2(total),
                reasons,
                breakdown,
            });
        }

        ranked.sort_by(|a, b| {
            match b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal) {
                Ordering::Equal => a.user_id.cmp(&b.user_id),
                other => other,
            }
        });

        if self.config.debug {
            for (idx, entry) in ranked.iter().take(5).enumerate() {
                debug!(
                    rank = idx + 1,
                    user_id = %entry.user_id,
                    score = entry.score,
                    reasons = ?entry.reasons,
                    "ranked candidate"
                );
            }
        }

        ranked
    }
}

/// Convenience entry point: rank with a mode's stock weight table.
pub fn rank_candidates(
    me: &Profile,
    candidates: &[Profile],
    pod_state: Option<&PodState>,
    swiped: &HashSet<String>,
    mode: RankMode,
    now: DateTime<Utc>,
) -> Vec<ScoredCandidate> {
    Ranker::for_mode(mode).rank(me, candidates, pod_state, swiped, now)
}

/// Role compatibility, first match wins.
///
/// Filling a pod's structural gap dominates everything. Once no gap is
/// fillable, a complementary primary role still outranks a duplicated
/// one, but duplication stays workable rather than exclusionary.
fn score_role(
    me_primary: Option<Role>,
    cand_roles: &[Role],
    missing: &[Role],
    in_pod: bool,
) -> (f64, String) {
    let Some(cand_primary) = cand_roles.first().copied() else {
        return (0.2, "role unspecified".to_string());
    };

    if in_pod && !missing.is_empty() {
        let fill = Role::ALL
            .iter()
            .find(|role| missing.contains(role) && cand_roles.contains(role));
        if let Some(role) = fill {
            return (1.0, format!("fills missing {role} role"));
        }
        if let Some(me) = me_primary {
            if cand_primary != me {
                return (0.55, format!("adds complementary {cand_primary} role"));
            }
        }
        return (0.25, "role is workable".to_string());
    }

    match me_primary {
        Some(me) if cand_primary == me => (0.25, format!("same role ({cand_primary})")),
        Some(me) => (
            0.85,
            format!("complements your {me} focus with {cand_primary}"),
        ),
        None => (0.55, format!("different role ({cand_primary})")),
    }
}

/// Penalize near-duplicate profiles so the feed isn't repetitive. Only
/// kicks in when both share the same primary role; ramps linearly from
/// skill similarity 0.8 up to 1.0. Two empty skill sets count as fully
/// similar here, matching how duplicate blank profiles read in the feed.
fn diversity_penalty(
    me_primary: Option<Role>,
    me_skills: &BTreeSet<String>,
    cand_primary: Option<Role>,
    cand_skills: &BTreeSet<String>,
) -> f64 {
    let (Some(me), Some(cand)) = (me_primary, cand_primary) else {
        return 0.0;
    };
    if me != cand {
        return 0.0;
    }

    let union = me_skills.union(cand_skills).count();
    let similarity = if union == 0 {
        1.0
    } else {
        me_skills.intersection(cand_skills).count() as f64 / union as f64
    };

    if similarity >= 0.8 {
        ((similarity - 0.8) / 0.2).min(1.0)
    } else {
        0.0
    }
}

#[allow(clippy::too_many_arguments)]
fn pick_reasons(
    role_reason: &str,
    role_pts: f64,
    skills_signal: &SkillsSignal,
    skills_pts: f64,
    avail_signal: &AvailabilitySignal,
    avail_pts: f64,
    activity_reason: &'static str,
    activity_pts: f64,
) -> Vec<String> {
    let mut options: Vec<(f64, String)> = Vec::new();

    if role_pts > ROLE_REASON_MIN_PTS {
        options.push((role_pts, role_reason.to_string()));
    }

    if skills_pts > SKILLS_REASON_MIN_PTS {
        if let Some((a, b)) = skills_signal.synergy.first() {
            options.push((skills_pts, format!("complementary stack: {a} + {b}")));
        } else if !skills_signal.shared.is_empty() {
            let shared = skills_signal
                .shared
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            options.push((skills_pts, format!("shared tools: {shared}")));
        }
    }

    if avail_pts > AVAILABILITY_REASON_MIN_PTS && avail_signal.overlap_blocks > 0 {
        let blocks = avail_signal.overlap_blocks;
        let plural = if blocks == 1 { "" } else { "s" };
        options.push((
            avail_pts,
            format!("overlapping availability ({blocks} block{plural})"),
        ));
    }

    if activity_pts > ACTIVITY_REASON_MIN_PTS {
        options.push((activity_pts, activity_reason.to_string()));
    }

    options.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    let reasons: Vec<String> = options
        .into_iter()
        .take(MAX_REASONS)
        .map(|(_, text)| text)
        .collect();

    if reasons.is_empty() {
        return vec![role_reason.to_string(), activity_reason.to_string()];
    }

    reasons
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
