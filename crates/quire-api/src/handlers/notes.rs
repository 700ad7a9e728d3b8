//! Note HTTP handlers: search, CRUD, archive toggle and Markdown preview.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use quire_core::defaults::NO_NOTES_FOUND;
use quire_core::{
    ArchiveToggle, CreateNoteRequest, Note, NoteRepository, NoteSearch, NoteSearchParams,
    NoteSummary, SearchMode, UpdateNoteRequest,
};

use crate::auth::CurrentUser;
use crate::config::is_truthy;
use crate::{ApiError, AppState};

/// Search results with the ordering that produced them.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub notes: Vec<NoteSummary>,
    pub total: usize,
    pub mode: SearchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// A note plus its rendered body.
#[derive(Debug, Serialize)]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    pub body_html: String,
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub markdown: String,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub html: String,
}

/// Build search criteria from query pairs.
///
/// `tag` may repeat; `archived` accepts the usual truthy flags; a missing
/// `sort` means most recently updated first.
pub fn search_params(pairs: &[(String, String)]) -> NoteSearchParams {
    let mut query = None;
    let mut tags = Vec::new();
    let mut include_archived = false;
    let mut sort = None;

    for (key, value) in pairs {
        match key.as_str() {
            "q" => query = Some(value.as_str()),
            "tag" => tags.push(value.as_str()),
            "archived" => include_archived = is_truthy(value),
            "sort" => sort = Some(value.as_str()),
            _ => {}
        }
    }

    NoteSearchParams::from_raw(query, tags, include_archived, sort)
}

/// Search notes by text relevance or explicit sort.
///
/// # Query Parameters
/// - `q`: free-text query; when present, results are ranked by relevance
/// - `tag`: required tag, repeatable (every tag must match)
/// - `archived`: `1` to include archived notes
/// - `sort`: `updated_desc` (default), `updated_asc`, `title_asc`,
///   `title_desc`, `created_desc`
pub async fn search_notes(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<SearchResponse>, ApiError> {
    let params = search_params(&pairs);
    let notes = state.db.search.search(&params).await?;

    Ok(Json(SearchResponse {
        total: notes.len(),
        mode: params.mode(),
        message: notes.is_empty().then_some(NO_NOTES_FOUND),
        notes,
    }))
}

pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteView>), ApiError> {
    let note = state.db.notes.create(req, user.id).await?;
    info!(
        subsystem = "api",
        op = "create_note",
        note_id = %note.id,
        user_id = %user.id,
        "Note created"
    );
    Ok((StatusCode::CREATED, Json(view(&state, note))))
}

pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<NoteView>, ApiError> {
    let note = state.db.notes.fetch(id).await?;
    Ok(Json(view(&state, note)))
}

/// Overwrite a note. The tag set is replaced by the request's tag text.
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<NoteView>, ApiError> {
    let note = state.db.notes.update(id, req, user.id).await?;
    info!(
        subsystem = "api",
        op = "update_note",
        note_id = %id,
        user_id = %user.id,
        "Note updated"
    );
    Ok(Json(view(&state, note)))
}

pub async fn toggle_archive(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ArchiveToggle>, ApiError> {
    let toggled = state.db.notes.toggle_archive(id, user.id).await?;
    Ok(Json(toggled))
}

pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.notes.delete(id).await?;
    info!(
        subsystem = "api",
        op = "delete_note",
        note_id = %id,
        user_id = %user.id,
        "Note deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Render arbitrary Markdown through the note pipeline.
pub async fn render_preview(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Json(req): Json<RenderRequest>,
) -> Json<RenderResponse> {
    Json(RenderResponse {
        html: state.renderer.render(&req.markdown),
    })
}

fn view(state: &AppState, note: Note) -> NoteView {
    let body_html = state.renderer.render(&note.body);
    NoteView { note, body_html }
}
