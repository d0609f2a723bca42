//! JWT claims carried by every AskHub token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed payload of access, refresh, and mail tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's email address.
    pub sub: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// What the token may be used for.
    pub scope: TokenScope,
    /// Random token id; keeps two tokens minted in the same second distinct.
    pub jti: Uuid,
}

/// Purpose a token was minted for.
///
/// A token is only accepted by the operation whose scope it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    /// Short-lived API credential.
    AccessToken,
    /// Single-use credential exchanged for a fresh pair.
    RefreshToken,
    /// Mailed link that verifies an email address.
    EmailConfirmToken,
    /// Mailed link that triggers a password reset.
    PasswordResetToken,
}

impl TokenScope {
    /// Wire name of the scope.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::EmailConfirmToken => "email_confirm_token",
            Self::PasswordResetToken => "password_reset_token",
        }
    }
}

impl std::fmt::Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Claims {
    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
