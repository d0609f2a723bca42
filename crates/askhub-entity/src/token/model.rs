//! Token record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted access or refresh token.
///
/// Rows are only ever mutated to flip `blocked` to `true`, and only
/// deleted by the expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TokenRecord {
    /// The full signed token string (primary key).
    pub token: String,
    /// Owner of the token.
    pub user_id: Uuid,
    /// Copied from the token's `exp` claim.
    pub expires_at: DateTime<Utc>,
    /// Revoked before its natural expiry.
    pub blocked: bool,
}

impl TokenRecord {
    /// Check whether the token's natural lifetime is over.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Data required to persist a freshly minted token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewToken {
    /// The full signed token string.
    pub token: String,
    /// Owner of the token.
    pub user_id: Uuid,
    /// Expiry copied from the token's claims.
    pub expires_at: DateTime<Utc>,
}

impl NewToken {
    /// Turn the insert payload into the row it creates.
    pub fn into_record(self) -> TokenRecord {
        TokenRecord {
            token: self.token,
            user_id: self.user_id,
            expires_at: self.expires_at,
            blocked: false,
        }
    }
}
