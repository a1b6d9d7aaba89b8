use std::collections::HashSet;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pm_common::api::{AskAnswer, MatchExplanation};
use pm_common::db::{
    fetch_explanation, get_course, get_user, last_seen_for_course, store_explanation,
};
use pm_common::explain::{PROMPT_VERSION, answer_question, generate_explanation};
use pm_common::matching::{Profile, RankMode, rank_candidates};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub candidate_user_id: String,
    pub course_code: String,
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainResponse {
    pub cached: bool,
    #[serde(flatten)]
    pub explanation: MatchExplanation,
}

fn to_profile(user: &pm_common::db::UserRecord, last_active_at: Option<DateTime<Utc>>) -> Profile {
    Profile {
        user_id: user.user_id.clone(),
        display_name: user.display_name.clone(),
        role_prefs: user.role_prefs.clone(),
        skills: user.skills.clone(),
        availability: user.availability.clone(),
        last_active_at,
    }
}

/// AI match rationale for a single pair, memoized by
/// (viewer, candidate, mode, prompt version).
pub async fn match_explain(
    State(state): State<SharedState>,
    AuthUser(me): AuthUser,
    Json(request): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>, ApiError> {
    if request.candidate_user_id == me.user_id {
        return Err(ApiError::BadRequest(
            "cannot explain a match with yourself".into(),
        ));
    }

    let mode = RankMode::from_param(&request.mode);
    let mode_str = mode.as_ref();

    if let Some(body) = fetch_explanation(
        &state.pool,
        &me.user_id,
        &request.candidate_user_id,
        mode_str,
        PROMPT_VERSION,
    )
    .await?
    {
        // An unreadable cached body is treated as a miss and regenerated.
        if let Ok(explanation) = serde_json::from_value::<MatchExplanation>(body) {
            return Ok(Json(ExplainResponse {
                cached: true,
                explanation,
            }));
        }
    }

    let candidate = get_user(&state.pool, &request.candidate_user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Candidate not found".into()))?;
    let course = get_course(&state.pool, &request.course_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    // Same presence join as the feed, so the breakdown behind the
    // explanation matches what the feed scored for this pair.
    let last_seen = last_seen_for_course(&state.pool, &request.course_code).await?;

    let scored = rank_candidates(
        &to_profile(&me, last_seen.get(&me.user_id).copied()),
        &[to_profile(&candidate, last_seen.get(&candidate.user_id).copied())],
        None,
        &HashSet::new(),
        mode,
        Utc::now(),
    )
    .into_iter()
    .next()
    .ok_or_else(|| ApiError::Internal("candidate produced no score".into()))?;

    let explanation =
        generate_explanation(&state.ai, &me, &candidate, &scored, &course.title).await;

    let body = serde_json::to_value(&explanation)
        .map_err(|err| ApiError::Internal(format!("failed to encode explanation: {err}")))?;
    store_explanation(
        &state.pool,
        &me.user_id,
        &candidate.user_id,
        mode_str,
        PROMPT_VERSION,
        &body,
    )
    .await?;

    Ok(Json(ExplainResponse {
        cached: false,
        explanation,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    pub course_code: String,
    pub question: String,
}

/// Syllabus Q&A over the course description.
pub async fn ask(
    State(state): State<SharedState>,
    AuthUser(_me): AuthUser,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskAnswer>, ApiError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question is required".into()));
    }

    let course = get_course(&state.pool, &request.course_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    let answer = answer_question(&state.ai, &course, question).await;
    Ok(Json(answer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_carries_presence_into_the_ranker_input() {
        let seen = Utc::now();
        let user = pm_common::db::UserRecord {
            user_id: "demo-ava".into(),
            display_name: "Ava".into(),
            role_prefs: vec!["Backend".into()],
            skills: vec!["Python".into()],
            availability: vec!["Mon evening".into()],
            course_codes: vec!["CS471".into()],
            created_at: seen,
        };

        assert_eq!(to_profile(&user, Some(seen)).last_active_at, Some(seen));
        assert_eq!(to_profile(&user, None).last_active_at, None);
    }

    #[test]
    fn explain_response_flattens_the_explanation() {
        let response = ExplainResponse {
            cached: true,
            explanation: MatchExplanation {
                headline: "Noah: fills missing Backend role".into(),
                prompt_version: PROMPT_VERSION.into(),
                ..MatchExplanation::default()
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["cached"], true);
        assert_eq!(json["headline"], "Noah: fills missing Backend role");
        assert_eq!(json["promptVersion"], "v1");
    }
}
