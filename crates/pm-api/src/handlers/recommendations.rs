use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use pm_common::api::{FeedResponse, RecommendationEntry};
use pm_common::db::{
    PgPool, UserRecord, decided_user_ids, find_pod_for_user, get_user, last_seen_for_course,
    list_course_members,
};
use pm_common::matching::{
    PodState, Profile, RankMode, ScoreBreakdown, ScoredCandidate, rank_candidates,
};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub course_code: String,
    #[serde(default)]
    pub mode: String,
}

fn to_profile(user: &UserRecord, last_active_at: Option<DateTime<Utc>>) -> Profile {
    Profile {
        user_id: user.user_id.clone(),
        display_name: user.display_name.clone(),
        role_prefs: user.role_prefs.clone(),
        skills: user.skills.clone(),
        availability: user.availability.clone(),
        last_active_at,
    }
}

/// The requester's pod as the ranker sees it: every member's declared
/// roles plus the true member count.
async fn load_pod_state(
    pool: &PgPool,
    user_id: &str,
    course_code: &str,
) -> Result<Option<PodState>, ApiError> {
    let Some(pod) = find_pod_for_user(pool, user_id, course_code).await? else {
        return Ok(None);
    };

    let mut member_roles = Vec::new();
    for member_id in &pod.member_ids {
        if let Some(member) = get_user(pool, member_id).await? {
            member_roles.extend(member.role_prefs);
        }
    }

    Ok(Some(PodState::Detailed {
        member_roles,
        member_count: pod.member_ids.len() as u32,
    }))
}

/// Trivial ordering used when ranking fails: candidates by user id with
/// zeroed scores. A broken ranker must degrade the feed, never blank it.
fn fallback_ranking(candidates: &[Profile]) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = candidates
        .iter()
        .map(|candidate| ScoredCandidate {
            user_id: candidate.user_id.clone(),
            score: 0.0,
            reasons: vec!["ranking temporarily unavailable".to_string()],
            breakdown: ScoreBreakdown::default(),
        })
        .collect();
    ranked.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    ranked
}

pub async fn feed(
    State(state): State<SharedState>,
    AuthUser(me): AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let mode = RankMode::from_param(&query.mode);
    let now = Utc::now();

    let members = list_course_members(&state.pool, &query.course_code, &me.user_id).await?;
    let decided: HashSet<String> =
        decided_user_ids(&state.pool, &me.user_id, &query.course_code).await?;
    let last_seen = last_seen_for_course(&state.pool, &query.course_code).await?;
    let pod_state = load_pod_state(&state.pool, &me.user_id, &query.course_code).await?;

    let my_last_seen = last_seen.get(&me.user_id).copied();
    let me_profile = to_profile(&me, my_last_seen);
    let candidates: Vec<Profile> = members
        .iter()
        .map(|user| to_profile(user, last_seen.get(&user.user_id).copied()))
        .collect();

    let ranked = std::panic::catch_unwind(AssertUnwindSafe(|| {
        rank_candidates(
            &me_profile,
            &candidates,
            pod_state.as_ref(),
            &decided,
            mode,
            now,
        )
    }))
    .unwrap_or_else(|_| {
        warn!(
            user_id = %me.user_id,
            course_code = %query.course_code,
            "ranking panicked; serving fallback ordering"
        );
        let undecided: Vec<Profile> = candidates
            .iter()
            .filter(|candidate| !decided.contains(&candidate.user_id))
            .cloned()
            .collect();
        fallback_ranking(&undecided)
    });

    let by_id: HashMap<&str, &UserRecord> = members
        .iter()
        .map(|user| (user.user_id.as_str(), user))
        .collect();

    let entries: Vec<RecommendationEntry> = ranked
        .iter()
        .filter_map(|scored| {
            by_id
                .get(scored.user_id.as_str())
                .map(|user| RecommendationEntry::from_scored(scored, user))
        })
        .collect();

    Ok(Json(FeedResponse {
        course_code: query.course_code,
        mode: mode.as_ref().to_string(),
        entries,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(user_id: &str) -> Profile {
        Profile {
            user_id: user_id.to_string(),
            ..Profile::default()
        }
    }

    #[test]
    fn fallback_ranking_orders_by_user_id_with_zero_scores() {
        let candidates = vec![profile("zeta"), profile("alpha")];
        let ranked = fallback_ranking(&candidates);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user_id, "alpha");
        assert_eq!(ranked[1].user_id, "zeta");
        assert!(ranked.iter().all(|entry| entry.score == 0.0));
    }
}
