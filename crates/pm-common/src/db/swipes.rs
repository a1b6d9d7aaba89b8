use std::collections::HashSet;

use deadpool_postgres::PoolError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum SwipeStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SwipeDecision {
    Accept,
    Pass,
}

/// Record a decision. Re-swiping overwrites the previous decision and
/// refreshes the timestamp; a pass can become an accept later.
#[instrument(skip(pool))]
pub async fn upsert_swipe(
    pool: &PgPool,
    from_user: &str,
    to_user: &str,
    course_code: &str,
    decision: SwipeDecision,
) -> Result<(), SwipeStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "INSERT INTO pm.swipes (from_user, to_user, course_code, decision)\
             VALUES ($1, $2, $3, $4)\
             ON CONFLICT (from_user, to_user, course_code) DO UPDATE\
             SET decision = EXCLUDED.decision,\
                 decided_at = NOW()",
        )
        .await?;

    client
        .execute(&stmt, &[&from_user, &to_user, &course_code, &decision.as_ref()])
        .await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn has_accepted(
    pool: &PgPool,
    from_user: &str,
    to_user: &str,
    course_code: &str,
) -> Result<bool, SwipeStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT EXISTS (\
                SELECT 1 FROM pm.swipes\
                WHERE from_user = $1 AND to_user = $2 AND course_code = $3\
                  AND decision = 'accept'\
             )",
        )
        .await?;

    let row = client
        .query_one(&stmt, &[&from_user, &to_user, &course_code])
        .await?;
    Ok(row.get(0))
}

/// User ids the requester already decided on (accept or pass) in the
/// course. The feed excludes these before ranking.
#[instrument(skip(pool))]
pub async fn decided_user_ids(
    pool: &PgPool,
    from_user: &str,
    course_code: &str,
) -> Result<HashSet<String>, SwipeStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("SELECT to_user FROM pm.swipes WHERE from_user = $1 AND course_code = $2")
        .await?;

    let rows = client.query(&stmt, &[&from_user, &course_code]).await?;
    Ok(rows.into_iter().map(|row| row.get("to_user")).collect())
}

/// Users with whom `user_id` has a mutual accept in the course. Contact
/// details unlock for these pairs.
#[instrument(skip(pool))]
pub async fn mutual_accepts(
    pool: &PgPool,
    user_id: &str,
    course_code: &str,
) -> Result<HashSet<String>, SwipeStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "SELECT mine.to_user\
             FROM pm.swipes mine\
             JOIN pm.swipes theirs\
               ON theirs.from_user = mine.to_user\
              AND theirs.to_user = mine.from_user\
              AND theirs.course_code = mine.course_code\
              AND theirs.decision = 'accept'\
             WHERE mine.from_user = $1\
               AND mine.course_code = $2\
               AND mine.decision = 'accept'",
        )
        .await?;

    let rows = client.query(&stmt, &[&user_id, &course_code]).await?;
    Ok(rows.into_iter().map(|row| row.get("to_user")).collect())
}
