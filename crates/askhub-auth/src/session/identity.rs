//! Values handed back to callers of the session layer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use askhub_entity::user::{User, UserRole};

/// The authenticated principal behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id.
    pub user_id: Uuid,
    /// Email address (the token subject).
    pub email: String,
    /// Role at the time of authentication.
    pub role: UserRole,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Token pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Short-lived access token.
    pub access_token: String,
    /// Single-use refresh token.
    pub refresh_token: String,
    /// Always `"bearer"`.
    pub token_type: String,
}

impl SessionTokens {
    /// Wrap a freshly minted pair.
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}
