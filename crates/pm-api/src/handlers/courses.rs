use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use pm_common::db::get_course;

use crate::SharedState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseQuery {
    pub course_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseMeta {
    pub course_code: String,
    pub title: String,
    pub description: String,
}

pub async fn course_meta(
    State(state): State<SharedState>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<CourseMeta>, ApiError> {
    let course = get_course(&state.pool, &query.course_code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Course not found".into()))?;

    Ok(Json(CourseMeta {
        course_code: course.course_code,
        title: course.title,
        description: course.description,
    }))
}
