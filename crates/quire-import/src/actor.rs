//! Choosing the user an import batch is attributed to.

use tracing::debug;
use uuid::Uuid;

use quire_core::{Error, Result, User, UserRepository};

/// Resolve the acting user for a batch.
///
/// An explicit id wins. Without one, the first active administrator is used.
/// Fails with [`Error::MissingActor`] when neither yields a user.
pub async fn resolve_actor(users: &dyn UserRepository, user_id: Option<Uuid>) -> Result<User> {
    if let Some(id) = user_id {
        return users
            .get(id)
            .await?
            .ok_or_else(|| Error::MissingActor(format!("User {} not found.", id)));
    }

    let admin = users.first_admin().await?.ok_or_else(|| {
        Error::MissingActor(
            "No user found. Provide --user-id or create an admin user first.".to_string(),
        )
    })?;

    debug!(
        subsystem = "import",
        component = "actor",
        user_id = %admin.id,
        "Defaulting import actor to first administrator"
    );
    Ok(admin)
}
