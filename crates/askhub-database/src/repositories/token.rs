//! Token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use askhub_core::error::{AppError, ErrorKind};
use askhub_core::result::AppResult;
use askhub_entity::token::{NewToken, TokenRecord};

/// Persistence operations on issued access and refresh tokens.
#[async_trait]
pub trait TokenRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new token row. Fails with a conflict if the string exists.
    async fn add(&self, token: &NewToken) -> AppResult<()>;

    /// Look up a token row.
    async fn get(&self, token: &str) -> AppResult<Option<TokenRecord>>;

    /// Mark a token as blocked. No-op if absent or already blocked.
    async fn block(&self, token: &str) -> AppResult<()>;

    /// Block every token of `user_id` that has not expired at `now`.
    ///
    /// Returns the number of rows that changed state.
    async fn block_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64>;

    /// Whether the token is known and blocked. Unknown tokens are not blocked.
    async fn is_blocked(&self, token: &str) -> AppResult<bool>;

    /// Atomically consume `consumed` and persist its replacements.
    ///
    /// The consumed row is flipped from unblocked to blocked only if it is
    /// owned by `owner`; the replacements are inserted in the same unit of
    /// work. Returns `false`, writing nothing, when that compare-and-set
    /// does not match a row.
    async fn rotate(
        &self,
        consumed: &str,
        owner: Uuid,
        replacements: &[NewToken],
    ) -> AppResult<bool>;

    /// Delete every token whose expiry lies before `now`.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL-backed [`TokenRepository`].
#[derive(Debug, Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_TOKEN: &str =
    "INSERT INTO tokens (token, user_id, expires_at, blocked) VALUES ($1, $2, $3, FALSE)";

fn map_insert_error(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::conflict("Token already exists")
        }
        _ => AppError::with_source(ErrorKind::Database, "Failed to store token", e),
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    async fn add(&self, token: &NewToken) -> AppResult<()> {
        sqlx::query(INSERT_TOKEN)
            .bind(&token.token)
            .bind(token.user_id)
            .bind(token.expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn get(&self, token: &str) -> AppResult<Option<TokenRecord>> {
        sqlx::query_as::<_, TokenRecord>("SELECT * FROM tokens WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find token", e))
    }

    async fn block(&self, token: &str) -> AppResult<()> {
        sqlx::query("UPDATE tokens SET blocked = TRUE WHERE token = $1 AND blocked = FALSE")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to block token", e))?;
        Ok(())
    }

    async fn block_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE tokens SET blocked = TRUE \
             WHERE user_id = $1 AND blocked = FALSE AND expires_at >= $2",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to block user tokens", e)
        })?;
        Ok(result.rows_affected())
    }

    async fn is_blocked(&self, token: &str) -> AppResult<bool> {
        let blocked: Option<bool> =
            sqlx::query_scalar("SELECT blocked FROM tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to read token state", e)
                })?;
        Ok(blocked.unwrap_or(false))
    }

    async fn rotate(
        &self,
        consumed: &str,
        owner: Uuid,
        replacements: &[NewToken],
    ) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to open transaction", e)
        })?;

        let claimed = sqlx::query(
            "UPDATE tokens SET blocked = TRUE \
             WHERE token = $1 AND user_id = $2 AND blocked = FALSE",
        )
        .bind(consumed)
        .bind(owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to consume token", e))?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to roll back rotation", e)
            })?;
            return Ok(false);
        }

        // A failed insert drops `tx`, which rolls the consumption back too.
        for token in replacements {
            sqlx::query(INSERT_TOKEN)
                .bind(&token.token)
                .bind(token.user_id)
                .bind(token.expires_at)
                .execute(&mut *tx)
                .await
                .map_err(map_insert_error)?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit rotation", e)
        })?;
        Ok(true)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM tokens WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to sweep expired tokens", e)
            })?;
        Ok(result.rows_affected())
    }
}
