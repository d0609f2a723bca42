//! User entity model.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;

/// A registered AskHub user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Public display name.
    pub username: String,
    /// Unique email address; also the subject of every token.
    pub email: String,
    /// Argon2 password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the email address has been verified.
    pub email_confirmed: bool,
    /// Banned users cannot log in or authenticate.
    pub banned: bool,
    /// User role (RBAC).
    pub role: UserRole,
    /// Delay before the auto-answer task replies on this user's behalf.
    pub answer_delay_seconds: Option<i64>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The auto-answer delay, if the user opted in.
    pub fn answer_delay(&self) -> Option<Duration> {
        self.answer_delay_seconds
            .filter(|secs| *secs >= 0)
            .map(|secs| Duration::from_secs(secs as u64))
    }

    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Assigned role.
    pub role: UserRole,
}
