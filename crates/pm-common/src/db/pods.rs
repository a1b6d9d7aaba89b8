use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;
use ulid::Ulid;

use crate::db::PgPool;

pub const POD_CAPACITY: usize = 4;

#[derive(Debug, Error)]
pub enum PodStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("pod not found: {0}")]
    NotFound(String),
    #[error("pod is full")]
    Full,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodRecord {
    pub pod_id: String,
    pub course_code: String,
    pub leader_id: String,
    pub member_ids: Vec<String>,
    pub hub_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PodRecord {
    pub fn has_room(&self) -> bool {
        self.member_ids.len() < POD_CAPACITY
    }
}

const POD_COLUMNS: &str = "pod_id, course_code, leader_id, member_ids, hub_link, created_at";

fn map_pod_row(row: &Row) -> PodRecord {
    PodRecord {
        pod_id: row.get("pod_id"),
        course_code: row.get("course_code"),
        leader_id: row.get("leader_id"),
        member_ids: row.get("member_ids"),
        hub_link: row.get("hub_link"),
        created_at: row.get("created_at"),
    }
}

#[instrument(skip(pool))]
pub async fn find_pod_for_user(
    pool: &PgPool,
    user_id: &str,
    course_code: &str,
) -> Result<Option<PodRecord>, PodStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "SELECT {POD_COLUMNS} FROM pm.pods\
             WHERE course_code = $1 AND $2 = ANY(member_ids)"
        ))
        .await?;

    let row = client.query_opt(&stmt, &[&course_code, &user_id]).await?;
    Ok(row.as_ref().map(map_pod_row))
}

/// Create a pod with the given members; the first member leads.
#[instrument(skip(pool))]
pub async fn create_pod(
    pool: &PgPool,
    course_code: &str,
    leader_id: &str,
    member_ids: &[String],
) -> Result<PodRecord, PodStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "INSERT INTO pm.pods (pod_id, course_code, leader_id, member_ids)\
             VALUES ($1, $2, $3, $4)\
             RETURNING {POD_COLUMNS}"
        ))
        .await?;

    let pod_id = Ulid::new().to_string();
    let row = client
        .query_one(&stmt, &[&pod_id, &course_code, &leader_id, &member_ids])
        .await?;

    Ok(map_pod_row(&row))
}

/// Add a member, guarded by the capacity check in SQL so two concurrent
/// joins cannot overfill the pod.
#[instrument(skip(pool))]
pub async fn add_pod_member(
    pool: &PgPool,
    pod_id: &str,
    user_id: &str,
) -> Result<PodRecord, PodStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(&format!(
            "UPDATE pm.pods\
             SET member_ids = array_append(member_ids, $2)\
             WHERE pod_id = $1\
               AND NOT ($2 = ANY(member_ids))\
               AND cardinality(member_ids) < $3\
             RETURNING {POD_COLUMNS}"
        ))
        .await?;

    let capacity = POD_CAPACITY as i32;
    match client
        .query_opt(&stmt, &[&pod_id, &user_id, &capacity])
        .await?
    {
        Some(row) => Ok(map_pod_row(&row)),
        None => {
            // Distinguish "full" from "gone" for the API's conflict codes.
            let exists_stmt = client
                .prepare_cached("SELECT EXISTS (SELECT 1 FROM pm.pods WHERE pod_id = $1)")
                .await?;
            let exists: bool = client.query_one(&exists_stmt, &[&pod_id]).await?.get(0);
            if exists {
                Err(PodStorageError::Full)
            } else {
                Err(PodStorageError::NotFound(pod_id.to_string()))
            }
        }
    }
}

#[instrument(skip(pool, hub_link))]
pub async fn set_hub_link(
    pool: &PgPool,
    pod_id: &str,
    hub_link: &str,
) -> Result<(), PodStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("UPDATE pm.pods SET hub_link = $2 WHERE pod_id = $1")
        .await?;

    let updated = client.execute(&stmt, &[&pod_id, &hub_link]).await?;
    if updated == 0 {
        return Err(PodStorageError::NotFound(pod_id.to_string()));
    }

    Ok(())
}
