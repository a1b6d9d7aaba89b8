use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use pm_common::db::{
    PodRecord, SwipeDecision, add_pod_member, create_pod, find_pod_for_user, get_user,
    has_accepted, upsert_swipe,
};
use pm_common::warehouse::{WarehouseEvent, spawn_sync};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub target_user_id: String,
    pub course_code: String,
    pub decision: SwipeDecision,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeResponse {
    pub ok: bool,
    pub mutual: bool,
    pub pod_updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_id: Option<String>,
}

/// Record a swipe; on mutual accept, form or grow a pod.
pub async fn swipe(
    State(state): State<SharedState>,
    AuthUser(me): AuthUser,
    Json(request): Json<SwipeRequest>,
) -> Result<Json<SwipeResponse>, ApiError> {
    if request.target_user_id == me.user_id {
        return Err(ApiError::BadRequest("cannot swipe on yourself".into()));
    }

    let target = get_user(&state.pool, &request.target_user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Target user not found".into()))?;

    upsert_swipe(
        &state.pool,
        &me.user_id,
        &target.user_id,
        &request.course_code,
        request.decision,
    )
    .await?;

    spawn_sync(
        &state.warehouse,
        WarehouseEvent::SwipeRecorded {
            from_user: me.user_id.clone(),
            to_user: target.user_id.clone(),
            course_code: request.course_code.clone(),
            decision: request.decision.as_ref().to_string(),
        },
    );

    let mutual = request.decision == SwipeDecision::Accept
        && has_accepted(&state.pool, &target.user_id, &me.user_id, &request.course_code).await?;

    let mut pod_updated = false;
    let mut pod_id = None;

    if mutual {
        if let Some(pod) =
            update_pods_on_match(&state, &me.user_id, &target.user_id, &request.course_code)
                .await?
        {
            pod_updated = true;
            pod_id = Some(pod.pod_id.clone());

            spawn_sync(
                &state.warehouse,
                WarehouseEvent::PodUpdated {
                    pod_id: pod.pod_id,
                    course_code: pod.course_code,
                    member_count: pod.member_ids.len(),
                },
            );
        }
    }

    Ok(Json(SwipeResponse {
        ok: true,
        mutual,
        pod_updated,
        pod_id,
    }))
}

/// Pod formation on mutual accept:
/// - neither in a pod: create one, requester leads;
/// - exactly one in a pod with room: the other joins;
/// - both already in the same pod: nothing to do;
/// - both in different pods, or the pod is full: conflict.
async fn update_pods_on_match(
    state: &SharedState,
    me: &str,
    target: &str,
    course_code: &str,
) -> Result<Option<PodRecord>, ApiError> {
    let my_pod = find_pod_for_user(&state.pool, me, course_code).await?;
    let their_pod = find_pod_for_user(&state.pool, target, course_code).await?;

    match (my_pod, their_pod) {
        (Some(mine), Some(theirs)) if mine.pod_id == theirs.pod_id => Ok(None),
        (Some(_), Some(_)) => Err(ApiError::Conflict(
            "Both users already in different pods".into(),
        )),
        (Some(mine), None) => {
            if !mine.has_room() {
                return Err(ApiError::Conflict("Pod is full".into()));
            }
            Ok(Some(add_pod_member(&state.pool, &mine.pod_id, target).await?))
        }
        (None, Some(theirs)) => {
            if !theirs.has_room() {
                return Err(ApiError::Conflict("Pod is full".into()));
            }
            Ok(Some(add_pod_member(&state.pool, &theirs.pod_id, me).await?))
        }
        (None, None) => {
            let members = vec![me.to_string(), target.to_string()];
            Ok(Some(create_pod(&state.pool, course_code, me, &members).await?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swipe_request_parses_camel_case_decisions() {
        let request: SwipeRequest = serde_json::from_str(
            r#"{"targetUserId": "u2", "courseCode": "CS471", "decision": "accept"}"#,
        )
        .unwrap();
        assert_eq!(request.decision, SwipeDecision::Accept);

        let pass: SwipeRequest = serde_json::from_str(
            r#"{"targetUserId": "u2", "courseCode": "CS471", "decision": "pass"}"#,
        )
        .unwrap();
        assert_eq!(pass.decision, SwipeDecision::Pass);
    }

    #[test]
    fn response_omits_pod_id_when_absent() {
        let json = serde_json::to_value(SwipeResponse {
            ok: true,
            mutual: false,
            pod_updated: false,
            pod_id: None,
        })
        .unwrap();
        assert!(json.get("podId").is_none());
        assert_eq!(json["podUpdated"], false);
    }
}
