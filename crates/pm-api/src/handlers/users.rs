use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use pm_common::db::{
    ProfileUpdate, add_course_to_user, create_user, get_course, record_heartbeat, upsert_profile,
    user_course_codes,
};
use pm_common::run_id;
use pm_common::warehouse::{WarehouseEvent, spawn_sync};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoLoginRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoLoginResponse {
    pub user_id: String,
    pub display_name: String,
}

/// Demo login: mint an opaque user id and create the row. No password,
/// no session; the id itself is the credential for this demo tier.
pub async fn demo_login(
    State(state): State<SharedState>,
    Json(request): Json<DemoLoginRequest>,
) -> Result<Json<DemoLoginResponse>, ApiError> {
    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest("displayName is required".into()));
    }

    let user_id = run_id::generate();
    let user = create_user(&state.pool, &user_id, display_name).await?;

    spawn_sync(
        &state.warehouse,
        WarehouseEvent::UserUpserted {
            user_id: user.user_id.clone(),
        },
    );

    Ok(Json(DemoLoginResponse {
        user_id: user.user_id,
        display_name: user.display_name,
    }))
}

pub async fn list_courses(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, ApiError> {
    let courses = user_course_codes(&state.pool, &user.user_id).await?;
    Ok(Json(json!({ "courses": courses })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCourseRequest {
    pub course_code: String,
}

pub async fn add_course(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Json(request): Json<AddCourseRequest>,
) -> Result<Json<Value>, ApiError> {
    get_course(&state.pool, &request.course_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    let courses = add_course_to_user(&state.pool, &user.user_id, &request.course_code).await?;

    Ok(Json(json!({ "ok": true, "courses": courses })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub display_name: Option<String>,
    pub role_prefs: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub availability: Option<Vec<String>>,
    pub course_code: String,
}

/// Upsert the caller's profile fields and enroll them in the course.
pub async fn update_profile(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    get_course(&state.pool, &request.course_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    let update = ProfileUpdate {
        display_name: request
            .display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        role_prefs: request.role_prefs,
        skills: request.skills,
        availability: request.availability,
        course_code: Some(request.course_code),
    };

    let updated = upsert_profile(&state.pool, &user.user_id, &update).await?;

    spawn_sync(
        &state.warehouse,
        WarehouseEvent::UserUpserted {
            user_id: updated.user_id,
        },
    );

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub course_code: String,
}

pub async fn heartbeat(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Json(request): Json<HeartbeatRequest>,
) -> Result<Json<Value>, ApiError> {
    record_heartbeat(&state.pool, &user.user_id, &request.course_code, Utc::now()).await?;
    Ok(Json(json!({ "ok": true })))
}
