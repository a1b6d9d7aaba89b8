use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum UserStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("user not found: {0}")]
    NotFound(String),
}

/// A user row as stored. Profile fields are defaulted to empty arrays at
/// insert time so downstream code never sees NULL lists.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user_id: String,
    pub display_name: String,
    pub role_prefs: Vec<String>,
    pub skills: Vec<String>,
    pub availability: Vec<String>,
    pub course_codes: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Profile fields accepted from the client. `None` leaves the stored
/// value untouched; an empty list clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub role_prefs: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub availability: Option<Vec<String>>,
    pub course_code: Option<String>,
}

const USER_COLUMNS: &str =
    "user_id, display_name, role_prefs, skills, availability, course_codes, created_at";

fn map_user_row(row: &Row) -> UserRecord {
    UserRecord {
        user_id: row.get("user_id"),
        display_name: row.get("display_name"),
        role_prefs: row.get("role_prefs"),
        skills: row.get("skills"),
        availability: row.get("availability"),
        course_codes: row.get("course_codes"),
        created_at: row.get("created_at"),
    }
}

#[instrument(skip(pool))]
pub async fn get_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<UserRecord>, UserStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {USER_COLUMNS} FROM pm.users WHERE user_id = $1"
        ))
        .await?;

    let row = client.query_opt(&stmt, &[&user_id]).await?;
    Ok(row.as_ref().map(map_user_row))
}

#[instrument(skip(pool))]
pub async fn create_user(
    pool: &PgPool,
    user_id: &str,
    display_name: &str,
) -> Result<UserRecord, UserStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "INSERT INTO pm.users (user_id, display_name)\
             VALUES ($1, $2)\
             ON CONFLICT (user_id) DO UPDATE SET display_name = EXCLUDED.display_name\
             RETURNING {USER_COLUMNS}"
        ))
        .await?;

    let row = client.query_one(&stmt, &[&user_id, &display_name]).await?;
    Ok(map_user_row(&row))
}

/// Upsert the caller-editable profile fields. COALESCE keeps untouched
/// columns as they are, so partial updates never wipe data.
#[instrument(skip(pool, update))]
pub async fn upsert_profile(
    pool: &PgPool,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<UserRecord, UserStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "UPDATE pm.users SET\
                display_name = COALESCE($2, display_name),\
                role_prefs = COALESCE($3, role_prefs),\
                skills = COALESCE($4, skills),\
                availability = COALESCE($5, availability),\
                course_codes = CASE\
                    WHEN $6::TEXT IS NULL OR $6 = ANY(course_codes) THEN course_codes\
                    ELSE array_append(course_codes, $6)\
                END\
             WHERE user_id = $1\
             RETURNING {USER_COLUMNS}"
        ))
        .await?;

    let row = client
        .query_opt(
            &stmt,
            &[
                &user_id,
                &update.display_name,
                &update.role_prefs,
                &update.skills,
                &update.availability,
                &update.course_code,
            ],
        )
        .await?
        .ok_or_else(|| UserStorageError::NotFound(user_id.to_string()))?;

    Ok(map_user_row(&row))
}

/// Add a course code to the user's set, returning the updated list.
/// Idempotent: re-adding an existing code is a no-op.
#[instrument(skip(pool))]
pub async fn add_course_to_user(
    pool: &PgPool,
    user_id: &str,
    course_code: &str,
) -> Result<Vec<String>, UserStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "UPDATE pm.users SET course_codes = CASE\
                WHEN $2 = ANY(course_codes) THEN course_codes\
                ELSE array_append(course_codes, $2)\
             END\
             WHERE user_id = $1\
             RETURNING course_codes",
        )
        .await?;

    let row = client
        .query_opt(&stmt, &[&user_id, &course_code])
        .await?
        .ok_or_else(|| UserStorageError::NotFound(user_id.to_string()))?;

    Ok(row.get("course_codes"))
}

#[instrument(skip(pool))]
pub async fn user_course_codes(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<String>, UserStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("SELECT course_codes FROM pm.users WHERE user_id = $1")
        .await?;

    let row = client
        .query_opt(&stmt, &[&user_id])
        .await?
        .ok_or_else(|| UserStorageError::NotFound(user_id.to_string()))?;

    Ok(row.get("course_codes"))
}

/// Everyone enrolled in the course except `exclude_user`. Ordered by
/// user id so callers start from a deterministic snapshot.
#[instrument(skip(pool))]
pub async fn list_course_members(
    pool: &PgPool,
    course_code: &str,
    exclude_user: &str,
) -> Result<Vec<UserRecord>, UserStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {USER_COLUMNS} FROM pm.users\
             WHERE $1 = ANY(course_codes) AND user_id <> $2\
             ORDER BY user_id"
        ))
        .await?;

    let rows = client.query(&stmt, &[&course_code, &exclude_user]).await?;
    Ok(rows.iter().map(map_user_row).collect())
}
