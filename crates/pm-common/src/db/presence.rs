use std::collections::HashMap;

use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum PresenceStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

#[instrument(skip(pool))]
pub async fn record_heartbeat(
    pool: &PgPool,
    user_id: &str,
    course_code: &str,
    seen_at: DateTime<Utc>,
) -> Result<(), PresenceStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "INSERT INTO pm.presence (user_id, course_code, last_seen_at)\
             VALUES ($1, $2, $3)\
             ON CONFLICT (user_id, course_code) DO UPDATE\
             SET last_seen_at = EXCLUDED.last_seen_at",
        )
        .await?;

    client
        .execute(&stmt, &[&user_id, &course_code, &seen_at])
        .await?;

    Ok(())
}

/// Last-heartbeat timestamps for everyone in the course. The feed joins
/// this against candidate profiles before ranking.
#[instrument(skip(pool))]
pub async fn last_seen_for_course(
    pool: &PgPool,
    course_code: &str,
) -> Result<HashMap<String, DateTime<Utc>>, PresenceStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("SELECT user_id, last_seen_at FROM pm.presence WHERE course_code = $1")
        .await?;

    let rows = client.query(&stmt, &[&course_code]).await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.get("user_id"), row.get("last_seen_at")))
        .collect())
}
