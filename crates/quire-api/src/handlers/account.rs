//! Login, logout, self-registration and the current-user endpoint.

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use quire_core::{
    verify_password, CreateUserRequest, LoginRequest, RegisterRequest, SessionRepository, User,
    UserRepository,
};

use crate::auth::{bearer_token, CurrentUser};
use crate::{ApiError, AppState};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const ACCOUNT_DEACTIVATED: &str =
    "Your account has been deactivated. Please contact an administrator.";

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Opaque bearer token for the `Authorization` header.
    pub token: String,
    pub expires_at_utc: DateTime<Utc>,
    pub user: User,
}

/// Exchange credentials for a session token.
///
/// # Returns
/// - 200 OK with the token and user
/// - 400 Bad Request if a field is missing
/// - 401 Unauthorized for wrong credentials or a deactivated account
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    req.validate()?;

    let user = match state.db.users.get_by_email(&req.email).await? {
        Some(user) if verify_password(&req.password, &user.password_hash) => user,
        _ => {
            warn!(subsystem = "api", op = "login", "Rejected login attempt");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };
    if !user.can_authenticate() {
        return Err(ApiError::Unauthorized(ACCOUNT_DEACTIVATED.to_string()));
    }

    let ttl = state.config.session_ttl();
    let token = state.db.sessions.create(user.id, ttl).await?;
    state.db.users.record_login(user.id).await?;

    match state.db.sessions.purge_expired().await {
        Ok(0) => {}
        Ok(purged) => debug!(subsystem = "api", op = "login", purged, "Expired sessions purged"),
        Err(e) => warn!(subsystem = "api", op = "login", error = %e, "Failed to purge expired sessions"),
    }

    info!(subsystem = "api", op = "login", user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        token,
        expires_at_utc: Utc::now() + ttl,
        user,
    }))
}

/// End the session the request was made with.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = bearer_token(&headers) {
        state.db.sessions.revoke(token).await?;
    }
    info!(subsystem = "api", op = "logout", user_id = %user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Create a regular account, when self-registration is enabled.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if !state.config.allow_self_register {
        return Err(ApiError::Forbidden(
            "Self-registration is disabled".to_string(),
        ));
    }
    req.validate()?;

    let user = state.db.users.create(CreateUserRequest::from(req)).await?;
    info!(subsystem = "api", op = "register", user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
