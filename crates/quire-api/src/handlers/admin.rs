//! Administrator-only user management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use quire_core::{CreateUserRequest, ResetPasswordRequest, User, UserRepository};

use crate::auth::RequireAdmin;
use crate::{ApiError, AppState};

/// List all users, newest first.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.db.users.list().await?))
}

/// Create a user. A duplicate email is a 409.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    req.validate()?;
    let user = state.db.users.create(req).await?;
    info!(
        subsystem = "api",
        op = "create_user",
        user_id = %user.id,
        admin_id = %admin.id,
        "User created by administrator"
    );
    Ok((StatusCode::CREATED, Json(user)))
}

/// Deactivate a user and end their sessions. Administrators cannot
/// deactivate themselves.
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    if id == admin.id {
        return Err(ApiError::BadRequest(
            "You cannot deactivate your own account.".to_string(),
        ));
    }
    Ok(Json(state.db.users.set_active(id, false).await?))
}

pub async fn activate_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.db.users.set_active(id, true).await?))
}

pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    req.validate()?;
    state.db.users.set_password(id, &req.password).await?;
    info!(
        subsystem = "api",
        op = "reset_password",
        user_id = %id,
        admin_id = %admin.id,
        "Password reset by administrator"
    );
    Ok(StatusCode::NO_CONTENT)
}
