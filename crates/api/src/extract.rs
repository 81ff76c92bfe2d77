//! Caller identity extraction.
//!
//! Auth mechanics live in an upstream collaborator; requests arrive here
//! with the authenticated caller's id in the `X-User-Id` header. Requests
//! without a valid header are rejected before any handler logic runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use common::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated caller's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, as asserted by the upstream auth layer.
#[derive(Debug, Clone, Copy)]
pub struct AuthedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("missing X-User-Id header".to_string()))?;
        let raw = value
            .to_str()
            .map_err(|_| ApiError::Unauthorized("invalid X-User-Id header".to_string()))?;
        let uuid = Uuid::parse_str(raw)
            .map_err(|e| ApiError::Unauthorized(format!("invalid X-User-Id header: {e}")))?;
        Ok(AuthedUser(UserId::from_uuid(uuid)))
    }
}
