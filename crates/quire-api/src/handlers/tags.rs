//! Tag HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use quire_core::{RenameTagRequest, Tag, TagRepository, TagWithCount};

use crate::auth::CurrentUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    /// Case-insensitive substring filter.
    pub q: Option<String>,
}

/// List tags alphabetically with the number of notes using each.
pub async fn list_tags(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(query): Query<ListTagsQuery>,
) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    let filter = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    Ok(Json(state.db.tags.list(filter).await?))
}

pub async fn get_tag(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Tag>, ApiError> {
    Ok(Json(state.db.tags.get(id).await?))
}

/// Rename a tag. The new name is trimmed and lower-cased.
///
/// # Returns
/// - 200 OK with the renamed tag
/// - 400 Bad Request if the name is blank
/// - 409 Conflict if another tag already has the name
pub async fn rename_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<RenameTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    req.validate()?;
    let tag = state.db.tags.rename(id, &req.name).await?;
    info!(
        subsystem = "api",
        op = "rename_tag",
        tag_id = id,
        user_id = %user.id,
        name = %tag.name,
        "Tag renamed"
    );
    Ok(Json(tag))
}

/// Delete a tag no note uses.
///
/// # Returns
/// - 204 No Content on success
/// - 404 Not Found if the tag doesn't exist
/// - 409 Conflict with the note count while notes still use it
pub async fn delete_tag(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.db.tags.delete(id).await?;
    info!(
        subsystem = "api",
        op = "delete_tag",
        tag_id = id,
        user_id = %user.id,
        "Tag deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
