//! Session authentication extractors.
//!
//! Requests carry `Authorization: Bearer <token>` where the token was issued
//! by `POST /api/v1/auth/login`. Expired sessions and deactivated users are
//! rejected with 401.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use quire_core::{SessionRepository, User};

use crate::{ApiError, AppState};

/// Raw bearer token from the request, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated user making the request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        match state.db.sessions.resolve(token).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(ApiError::Unauthorized(
                "Session expired or invalid. Please log in again.".to_string(),
            )),
        }
    }
}

/// An authenticated administrator.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(ApiError::Forbidden(
                "Administrator access required".to_string(),
            ));
        }
        Ok(RequireAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(auth: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = auth {
            headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        }
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers_with(Some("Bearer qs_abc"))), Some("qs_abc"));
        assert_eq!(bearer_token(&headers_with(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&headers_with(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&headers_with(None)), None);
    }
}
