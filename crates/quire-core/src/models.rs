//! Domain models for quire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// USERS
// =============================================================================

/// An account that can author notes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// Argon2 PHC string. Never serialized to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub last_login_at_utc: Option<DateTime<Utc>>,
}

impl User {
    /// Whether this account may authenticate.
    pub fn can_authenticate(&self) -> bool {
        self.is_active
    }
}

/// The identity attached to a mutating operation.
///
/// Supplied by the session layer (or the import CLI) and trusted by the core
/// without re-validating credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub is_admin: bool,
    pub is_active: bool,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            is_admin: user.is_admin,
            is_active: user.is_active,
        }
    }
}

// =============================================================================
// TAGS
// =============================================================================

/// A canonical (trimmed, lower-cased) label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A tag with the number of notes referencing it.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagWithCount {
    pub id: i64,
    pub name: String,
    /// Number of notes with this tag (computed)
    pub note_count: i64,
}

// =============================================================================
// NOTES
// =============================================================================

/// A full note as stored, with its tag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    /// Markdown source.
    pub body: String,
    pub summary: Option<String>,
    /// Original file path for imported notes; the import dedup key.
    pub source: Option<String>,
    pub archived: bool,
    pub metadata: JsonValue,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    /// Tags ordered by name.
    pub tags: Vec<Tag>,
}

impl Note {
    /// Tag names in display order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}

/// A note row as returned by search and listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSummary {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub archived: bool,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub tags: Vec<String>,
    /// Relevance score; present only for free-text searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// Result of toggling a note's archived flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveToggle {
    pub id: Uuid,
    pub archived: bool,
}

// =============================================================================
// IMPORT
// =============================================================================

/// What reconciling an external file did (or would do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportAction {
    Created,
    Updated,
}

impl std::fmt::Display for ImportAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportAction::Created => write!(f, "created"),
            ImportAction::Updated => write!(f, "updated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::nil(),
            email: "admin@test.com".to_string(),
            display_name: "Admin User".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            is_admin: true,
            is_active: true,
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
            last_login_at_utc: None,
        }
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "admin@test.com");
    }

    #[test]
    fn test_deactivated_user_cannot_authenticate() {
        let mut user = sample_user();
        assert!(user.can_authenticate());
        user.is_active = false;
        assert!(!user.can_authenticate());
    }

    #[test]
    fn test_actor_from_user() {
        let user = sample_user();
        let actor = Actor::from(&user);
        assert_eq!(actor.id, user.id);
        assert!(actor.is_admin);
    }

    #[test]
    fn test_note_summary_omits_score_when_absent() {
        let summary = NoteSummary {
            id: Uuid::nil(),
            title: "t".to_string(),
            summary: None,
            source: None,
            archived: false,
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
            created_by: Uuid::nil(),
            updated_by: Uuid::nil(),
            tags: vec![],
            score: None,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("score").is_none());
    }

    #[test]
    fn test_import_action_display() {
        assert_eq!(ImportAction::Created.to_string(), "created");
        assert_eq!(ImportAction::Updated.to_string(), "updated");
        assert_eq!(
            serde_json::to_value(ImportAction::Updated).unwrap(),
            "updated"
        );
    }
}
