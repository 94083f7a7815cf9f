//! Axum extractors for caller identity
//!
//! Authentication itself lives at the upstream gateway; by the time a
//! request reaches this service the caller's id arrives in a trusted header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use haru_types::UserId;

use crate::error::ApiError;

/// Header the upstream gateway puts the authenticated user id in
pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated caller extracted from the request
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser {
    pub user_id: UserId,
}

impl AuthedUser {
    /// Raw uuid of the caller
    pub fn uuid(&self) -> Uuid {
        self.user_id.0
    }
}

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let user_id = UserId::parse(value).map_err(|_| ApiError::Unauthorized)?;

        Ok(Self { user_id })
    }
}
