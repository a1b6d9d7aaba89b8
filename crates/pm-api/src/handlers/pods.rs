use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use pm_common::db::{find_pod_for_user, get_user, mutual_accepts, set_hub_link};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

const HUB_LINK_PREFIX: &str = "https://docs.google.com/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodQuery {
    pub course_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodMemberView {
    pub user_id: String,
    pub display_name: String,
    pub role_prefs: Vec<String>,
    /// Whether the viewer and this member have mutually accepted; gates
    /// contact-detail visibility in the client.
    pub unlocked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodView {
    pub pod_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leader_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hub_link: Option<String>,
    pub members: Vec<PodMemberView>,
}

pub async fn pod_view(
    State(state): State<SharedState>,
    AuthUser(me): AuthUser,
    Query(query): Query<PodQuery>,
) -> Result<Json<PodView>, ApiError> {
    let Some(pod) = find_pod_for_user(&state.pool, &me.user_id, &query.course_code).await? else {
        return Ok(Json(PodView {
            pod_id: None,
            leader_id: None,
            hub_link: None,
            members: Vec::new(),
        }));
    };

    let unlocked_ids = mutual_accepts(&state.pool, &me.user_id, &query.course_code).await?;

    let mut members = Vec::with_capacity(pod.member_ids.len());
    for member_id in &pod.member_ids {
        // A member row deleted out from under the pod is skipped rather
        // than failing the whole view.
        let Some(member) = get_user(&state.pool, member_id).await? else {
            continue;
        };
        members.push(PodMemberView {
            unlocked: member.user_id == me.user_id || unlocked_ids.contains(&member.user_id),
            user_id: member.user_id,
            display_name: member.display_name,
            role_prefs: member.role_prefs,
        });
    }

    Ok(Json(PodView {
        pod_id: Some(pod.pod_id),
        leader_id: Some(pod.leader_id),
        hub_link: pod.hub_link,
        members,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubRequest {
    pub course_code: String,
    pub hub_link: String,
}

fn valid_hub_link(link: &str) -> bool {
    link.starts_with(HUB_LINK_PREFIX)
}

/// Leader-only: attach the shared collaboration-hub link to the pod.
pub async fn set_hub(
    State(state): State<SharedState>,
    AuthUser(me): AuthUser,
    Json(request): Json<HubRequest>,
) -> Result<Json<Value>, ApiError> {
    let pod = find_pod_for_user(&state.pool, &me.user_id, &request.course_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Pod not found".into()))?;

    if pod.leader_id != me.user_id {
        return Err(ApiError::Forbidden(
            "Only the pod leader can set the hub link".into(),
        ));
    }

    if !valid_hub_link(&request.hub_link) {
        return Err(ApiError::Unprocessable(format!(
            "hubLink must start with {HUB_LINK_PREFIX}"
        )));
    }

    set_hub_link(&state.pool, &pod.pod_id, &request.hub_link).await?;

    Ok(Json(json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_links_must_point_at_the_hub() {
        assert!(valid_hub_link("https://docs.google.com/document/d/abc"));
        assert!(!valid_hub_link("https://example.com/doc"));
        assert!(!valid_hub_link("http://docs.google.com/document"));
        assert!(!valid_hub_link(""));
    }

    #[test]
    fn empty_pod_view_serializes_a_null_pod_id() {
        let json = serde_json::to_value(PodView {
            pod_id: None,
            leader_id: None,
            hub_link: None,
            members: Vec::new(),
        })
        .unwrap();
        assert!(json["podId"].is_null());
        assert!(json.get("leaderId").is_none());
    }
}
