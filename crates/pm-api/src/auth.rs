use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use pm_common::db::{UserRecord, get_user};

use crate::SharedState;
use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user, identified by the `X-User-Id` header and
/// resolved against the user store. Demo-grade auth: possession of a
/// user id is the credential, as minted by `/auth/demo`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserRecord);

#[async_trait]
impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Id header".into()))?;

        let user = get_user(&state.pool, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unknown user".into()))?;

        Ok(AuthUser(user))
    }
}
