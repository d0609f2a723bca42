//! User repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use askhub_core::error::{AppError, ErrorKind};
use askhub_core::result::AppResult;
use askhub_entity::user::{CreateUser, User, UserRole};

/// Persistence operations on user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug + 'static {
    /// Find a user by email (case-insensitive).
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find a user by primary key.
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Create a new user. Fails with a conflict if the email is taken.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Replace a user's password hash.
    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()>;

    /// Mark a user's email address as verified.
    async fn set_email_confirmed(&self, user_id: Uuid) -> AppResult<()>;

    /// Ban or unban a user.
    async fn set_banned(&self, user_id: Uuid, banned: bool) -> AppResult<()>;

    /// Change a user's role.
    async fn update_role(&self, user_id: Uuid, role: UserRole) -> AppResult<User>;

    /// Set or clear the auto-answer delay.
    async fn set_answer_delay(
        &self,
        user_id: Uuid,
        delay_seconds: Option<i64>,
    ) -> AppResult<User>;

    /// List users, newest first.
    async fn list(&self, limit: u32, offset: u32) -> AppResult<Vec<User>>;
}

/// PostgreSQL-backed [`UserRepository`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run a single-row `UPDATE`, mapping zero affected rows to not-found.
    async fn execute_update(
        &self,
        query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>,
        user_id: Uuid,
        what: &str,
    ) -> AppResult<()> {
        let result = query.execute(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, format!("Failed to {what}"), e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("User {user_id} not found")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict("Email already in use")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create user", e),
        })
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let query =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(user_id)
                .bind(password_hash.to_string());
        self.execute_update(query, user_id, "update password").await
    }

    async fn set_email_confirmed(&self, user_id: Uuid) -> AppResult<()> {
        let query = sqlx::query(
            "UPDATE users SET email_confirmed = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(user_id);
        self.execute_update(query, user_id, "confirm email").await
    }

    async fn set_banned(&self, user_id: Uuid, banned: bool) -> AppResult<()> {
        let query = sqlx::query("UPDATE users SET banned = $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(banned);
        self.execute_update(query, user_id, "update ban flag").await
    }

    async fn update_role(&self, user_id: Uuid, role: UserRole) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update role", e))?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    async fn set_answer_delay(
        &self,
        user_id: Uuid,
        delay_seconds: Option<i64>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET answer_delay_seconds = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(delay_seconds)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update answer delay", e)
        })?
        .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    async fn list(&self, limit: u32, offset: u32) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }
}
