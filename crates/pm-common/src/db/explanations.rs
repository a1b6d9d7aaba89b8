use deadpool_postgres::PoolError;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;

#[derive(Debug, Error)]
pub enum ExplanationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
}

/// Cache key for a memoized explanation. The digest keeps the primary
/// key a single fixed-width column; the components are stored alongside
/// for inspection.
pub fn explanation_cache_key(
    viewer_id: &str,
    candidate_id: &str,
    mode: &str,
    prompt_version: &str,
) -> String {
    let mut hasher = Sha256::new();
    for part in [viewer_id, candidate_id, mode, prompt_version] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

#[instrument(skip(pool))]
pub async fn fetch_explanation(
    pool: &PgPool,
    viewer_id: &str,
    candidate_id: &str,
    mode: &str,
    prompt_version: &str,
) -> Result<Option<Value>, ExplanationStorageError> {
    let key = explanation_cache_key(viewer_id, candidate_id, mode, prompt_version);

    let client = pool.get().await?;
    let stmt = client
        .prepare_cached("SELECT body FROM pm.explanations WHERE cache_key = $1")
        .await?;

    let row = client.query_opt(&stmt, &[&key]).await?;
    Ok(row.map(|row| row.get("body")))
}

#[instrument(skip(pool, body))]
pub async fn store_explanation(
    pool: &PgPool,
    viewer_id: &str,
    candidate_id: &str,
    mode: &str,
    prompt_version: &str,
    body: &Value,
) -> Result<(), ExplanationStorageError> {
    let key = explanation_cache_key(viewer_id, candidate_id, mode, prompt_version);

    let client = pool.get().await?;
    let stmt = client
        .prepare_cached(
            "INSERT INTO pm.explanations\
                (cache_key, viewer_id, candidate_id, mode, prompt_version, body)\
             VALUES ($1, $2, $3, $4, $5, $6)\
             ON CONFLICT (cache_key) DO UPDATE SET body = EXCLUDED.body",
        )
        .await?;

    client
        .execute(
            &stmt,
            &[&key, &viewer_id, &candidate_id, &mode, &prompt_version, body],
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_and_component_sensitive() {
        let base = explanation_cache_key("viewer", "cand", "skillmatch", "v1");
        assert_eq!(
            base,
            explanation_cache_key("viewer", "cand", "skillmatch", "v1")
        );
        assert_ne!(
            base,
            explanation_cache_key("viewer", "cand", "quickmatch", "v1")
        );
        assert_ne!(base, explanation_cache_key("viewer", "cand", "skillmatch", "v2"));
        // The separator keeps adjacent components from gluing together.
        assert_ne!(
            explanation_cache_key("ab", "c", "m", "v1"),
            explanation_cache_key("a", "bc", "m", "v1")
        );
    }
}
