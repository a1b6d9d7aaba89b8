use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::json;
use tokio::time::{Duration, timeout};

use crate::SharedState;
use crate::error::ApiError;

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

/// Liveness plus a config summary for the frontend's status badge.
pub async fn health(State(state): State<SharedState>) -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "aiConfigured": state.ai.configured(),
        "time": Utc::now(),
    }))
}

pub async fn livez() -> &'static str {
    "ok"
}

pub async fn readyz(State(state): State<SharedState>) -> Result<&'static str, ApiError> {
    if !state.readiness.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(ApiError::ServiceUnavailable("shutting_down".into()));
    }

    let client = timeout(READINESS_TIMEOUT, state.pool.get())
        .await
        .map_err(|_| ApiError::ServiceUnavailable("db_pool_timeout".into()))
        .and_then(|result| {
            result.map_err(|err| {
                ApiError::ServiceUnavailable(format!("failed to check out pool connection: {err}"))
            })
        })?;

    timeout(READINESS_TIMEOUT, client.simple_query("SELECT 1"))
        .await
        .map_err(|_| ApiError::ServiceUnavailable("db_ping_timeout".into()))
        .and_then(|result| {
            result
                .map_err(|err| ApiError::ServiceUnavailable(format!("health check failed: {err}")))
        })?;

    Ok("ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_state;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn readyz_rejects_when_readiness_disabled() {
        let state = test_state();
        state.readiness.store(false, Ordering::SeqCst);

        let result = readyz(State(state)).await;

        match result {
            Err(ApiError::ServiceUnavailable(code)) => {
                assert!(code.contains("shutting_down"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn health_reports_ai_configuration() {
        let state = test_state();
        let Json(body) = health(State(state)).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["aiConfigured"], false);
    }
}
