//! Persisted token bookkeeping.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use askhub_core::error::AppError;
use askhub_database::repositories::TokenRepository;
use askhub_entity::token::{NewToken, TokenRecord};

use crate::error::{AuthError, AuthResult};

/// Record of every issued access and refresh token and its revocation state.
///
/// Wraps a [`TokenRepository`] and translates storage conflicts into
/// [`AuthError::DuplicateToken`].
#[derive(Debug, Clone)]
pub struct TokenStore {
    repo: Arc<dyn TokenRepository>,
}

fn map_conflict(e: AppError) -> AuthError {
    if e.is_conflict() {
        AuthError::DuplicateToken
    } else {
        AuthError::App(e)
    }
}

impl TokenStore {
    /// Creates a new token store.
    pub fn new(repo: Arc<dyn TokenRepository>) -> Self {
        Self { repo }
    }

    /// Persist a freshly minted token.
    pub async fn add(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> AuthResult<()> {
        let row = NewToken {
            token: token.to_string(),
            user_id,
            expires_at,
        };
        self.repo.add(&row).await.map_err(map_conflict)
    }

    /// Look up a token record.
    pub async fn get(&self, token: &str) -> AuthResult<Option<TokenRecord>> {
        Ok(self.repo.get(token).await?)
    }

    /// Revoke one token. Idempotent.
    pub async fn block(&self, token: &str) -> AuthResult<()> {
        Ok(self.repo.block(token).await?)
    }

    /// Revoke every live token of a user; returns how many were revoked.
    pub async fn block_all_for_user(&self, user_id: Uuid) -> AuthResult<u64> {
        Ok(self.repo.block_all_for_user(user_id, Utc::now()).await?)
    }

    /// Unknown tokens are reported as not blocked.
    pub async fn is_blocked(&self, token: &str) -> AuthResult<bool> {
        Ok(self.repo.is_blocked(token).await?)
    }

    /// Consume `consumed` and persist `replacements` as one atomic step.
    ///
    /// Returns `false` when `consumed` was already blocked, is unknown, or
    /// belongs to another user.
    pub async fn rotate(
        &self,
        consumed: &str,
        owner: Uuid,
        replacements: &[NewToken],
    ) -> AuthResult<bool> {
        self.repo
            .rotate(consumed, owner, replacements)
            .await
            .map_err(map_conflict)
    }

    /// Delete every expired record; returns the number removed.
    pub async fn sweep_expired(&self) -> AuthResult<u64> {
        let removed = self.repo.sweep_expired(Utc::now()).await?;
        tracing::info!(removed = removed, "Expired token sweep completed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use askhub_database::repositories::MemoryTokenRepository;

    use super::*;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryTokenRepository::new()))
    }

    #[tokio::test]
    async fn test_duplicate_add_is_duplicate_token() {
        let store = store();
        let user = Uuid::new_v4();
        let exp = Utc::now() + Duration::hours(1);

        store.add("tok", user, exp).await.unwrap();
        assert!(matches!(
            store.add("tok", user, exp).await,
            Err(AuthError::DuplicateToken)
        ));
    }

    #[tokio::test]
    async fn test_block_is_idempotent() {
        let store = store();
        let user = Uuid::new_v4();
        store
            .add("tok", user, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        store.block("tok").await.unwrap();
        store.block("tok").await.unwrap();
        store.block("unknown").await.unwrap();

        assert!(store.is_blocked("tok").await.unwrap());
        assert!(!store.is_blocked("unknown").await.unwrap());
        assert!(store.get("tok").await.unwrap().unwrap().blocked);
    }

    #[tokio::test]
    async fn test_sweep_counts_expired_only() {
        let store = store();
        let user = Uuid::new_v4();
        store
            .add("old", user, Utc::now() - Duration::seconds(10))
            .await
            .unwrap();
        store
            .add("new", user, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.sweep_expired().await.unwrap(), 1);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("new").await.unwrap().is_some());
    }
}
