//! Core traits for quire abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, keeping handlers and the importer independent of the store.

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::search::NoteSearchParams;

// =============================================================================
// NOTE REPOSITORY TRAITS
// =============================================================================

/// Request for creating a new note.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    /// Markdown source.
    pub body: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// Raw comma-separated tag text.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Request for editing a note. Every field is overwritten and the tag set is
/// replaced by the normalized `tags` text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: String,
}

/// Repository for note CRUD operations.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note attributed to `actor` (creator and updater).
    async fn create(&self, req: CreateNoteRequest, actor: Uuid) -> Result<Note>;

    /// Fetch a note with its tags.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// Overwrite a note's fields and replace its tag set.
    async fn update(&self, id: Uuid, req: UpdateNoteRequest, actor: Uuid) -> Result<Note>;

    /// Flip the archived flag, recording `actor` as updater.
    async fn toggle_archive(&self, id: Uuid, actor: Uuid) -> Result<ArchiveToggle>;

    /// Delete a note and its tag associations (tags themselves remain).
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Check whether a note exists.
    async fn exists(&self, id: Uuid) -> Result<bool>;
}

/// Read-only note retrieval by search criteria.
#[async_trait]
pub trait NoteSearch: Send + Sync {
    /// Return every matching note, ordered per the search mode.
    async fn search(&self, params: &NoteSearchParams) -> Result<Vec<NoteSummary>>;
}

// =============================================================================
// TAG REPOSITORY TRAITS
// =============================================================================

/// Request for renaming a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameTagRequest {
    pub name: String,
}

/// Repository for tag operations.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List tags alphabetically with note counts, optionally filtered by a
    /// case-insensitive substring.
    async fn list(&self, filter: Option<&str>) -> Result<Vec<TagWithCount>>;

    /// Get a tag by id.
    async fn get(&self, id: i64) -> Result<Tag>;

    /// Resolve canonical names to tags, creating missing ones.
    async fn resolve(&self, names: &[String]) -> Result<Vec<Tag>>;

    /// Rename a tag (name is canonicalized).
    async fn rename(&self, id: i64, name: &str) -> Result<Tag>;

    /// Delete a tag that no note references.
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count notes referencing a tag.
    async fn note_count(&self, id: i64) -> Result<i64>;

    /// Tags attached to a note, ordered by name.
    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<Tag>>;
}

// =============================================================================
// USER REPOSITORY TRAITS
// =============================================================================

/// Request for creating a user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Request for self-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

impl From<RegisterRequest> for CreateUserRequest {
    fn from(req: RegisterRequest) -> Self {
        Self {
            email: req.email,
            display_name: req.display_name,
            password: req.password,
            is_admin: false,
            is_active: true,
        }
    }
}

/// Credentials for login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request for an admin password reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user; a duplicate email is a conflict.
    async fn create(&self, req: CreateUserRequest) -> Result<User>;

    /// Get a user by id.
    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    /// Get a user by email.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List all users, newest first.
    async fn list(&self) -> Result<Vec<User>>;

    /// Activate or deactivate a user.
    async fn set_active(&self, id: Uuid, active: bool) -> Result<User>;

    /// Replace a user's password.
    async fn set_password(&self, id: Uuid, password: &str) -> Result<()>;

    /// The oldest administrator account, if any.
    async fn first_admin(&self) -> Result<Option<User>>;

    /// Record a successful login.
    async fn record_login(&self, id: Uuid) -> Result<()>;
}

/// Repository for login sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Issue a new opaque session token for a user.
    async fn create(&self, user_id: Uuid, ttl: Duration) -> Result<String>;

    /// Resolve a token to its active, unexpired user.
    async fn resolve(&self, token: &str) -> Result<Option<User>>;

    /// Revoke a token.
    async fn revoke(&self, token: &str) -> Result<()>;

    /// Delete expired sessions, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64>;
}
