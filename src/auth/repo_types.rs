use std::fmt;

use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the credential store.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub email: String,              // login identity, lowercased
    pub display_name: String,       // shown to other users
    pub password_hash: String,      // Argon2 PHC string, never exposed
    pub created_at: OffsetDateTime, // creation timestamp
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("password_hash", &"<REDACTED>")
            .field("created_at", &self.created_at)
            .finish()
    }
}
