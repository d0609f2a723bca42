//! In-process repository implementations.
//!
//! Used by the test suites and by `database.backend = "memory"`. Each
//! repository keeps its rows behind a single async mutex, so every
//! operation (including token rotation) is atomic with respect to the
//! others.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use askhub_core::error::AppError;
use askhub_core::result::AppResult;
use askhub_entity::token::{NewToken, TokenRecord};
use askhub_entity::user::{CreateUser, User, UserRole};

use super::token::TokenRepository;
use super::user::UserRepository;

/// Map-backed [`UserRepository`].
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, user_id: Uuid, apply: F) -> AppResult<User>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut users = self.users.lock().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut users = self.users.lock().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(AppError::conflict("Email already in use"));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: data.username.clone(),
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            email_confirmed: false,
            banned: false,
            role: data.role,
            answer_delay_seconds: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> AppResult<()> {
        let hash = password_hash.to_string();
        self.modify(user_id, move |u| u.password_hash = hash).await?;
        Ok(())
    }

    async fn set_email_confirmed(&self, user_id: Uuid) -> AppResult<()> {
        self.modify(user_id, |u| u.email_confirmed = true).await?;
        Ok(())
    }

    async fn set_banned(&self, user_id: Uuid, banned: bool) -> AppResult<()> {
        self.modify(user_id, move |u| u.banned = banned).await?;
        Ok(())
    }

    async fn update_role(&self, user_id: Uuid, role: UserRole) -> AppResult<User> {
        self.modify(user_id, move |u| u.role = role).await
    }

    async fn set_answer_delay(
        &self,
        user_id: Uuid,
        delay_seconds: Option<i64>,
    ) -> AppResult<User> {
        self.modify(user_id, move |u| u.answer_delay_seconds = delay_seconds)
            .await
    }

    async fn list(&self, limit: u32, offset: u32) -> AppResult<Vec<User>> {
        let users = self.users.lock().await;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

/// Map-backed [`TokenRepository`].
#[derive(Debug, Default)]
pub struct MemoryTokenRepository {
    tokens: Mutex<HashMap<String, TokenRecord>>,
}

impl MemoryTokenRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows, blocked or not.
    pub async fn len(&self) -> usize {
        self.tokens.lock().await.len()
    }

    /// Whether no rows are stored.
    pub async fn is_empty(&self) -> bool {
        self.tokens.lock().await.is_empty()
    }
}

#[async_trait]
impl TokenRepository for MemoryTokenRepository {
    async fn add(&self, token: &NewToken) -> AppResult<()> {
        let mut tokens = self.tokens.lock().await;
        if tokens.contains_key(&token.token) {
            return Err(AppError::conflict("Token already exists"));
        }
        tokens.insert(token.token.clone(), token.clone().into_record());
        Ok(())
    }

    async fn get(&self, token: &str) -> AppResult<Option<TokenRecord>> {
        Ok(self.tokens.lock().await.get(token).cloned())
    }

    async fn block(&self, token: &str) -> AppResult<()> {
        if let Some(record) = self.tokens.lock().await.get_mut(token) {
            record.blocked = true;
        }
        Ok(())
    }

    async fn block_all_for_user(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.tokens.lock().await;
        let mut blocked = 0;
        for record in tokens.values_mut() {
            if record.user_id == user_id && !record.blocked && !record.is_expired_at(now) {
                record.blocked = true;
                blocked += 1;
            }
        }
        Ok(blocked)
    }

    async fn is_blocked(&self, token: &str) -> AppResult<bool> {
        Ok(self
            .tokens
            .lock()
            .await
            .get(token)
            .is_some_and(|record| record.blocked))
    }

    async fn rotate(
        &self,
        consumed: &str,
        owner: Uuid,
        replacements: &[NewToken],
    ) -> AppResult<bool> {
        let mut tokens = self.tokens.lock().await;

        match tokens.get(consumed) {
            Some(record) if record.user_id == owner && !record.blocked => {}
            _ => return Ok(false),
        }
        if replacements
            .iter()
            .any(|t| tokens.contains_key(&t.token))
        {
            return Err(AppError::conflict("Token already exists"));
        }

        if let Some(record) = tokens.get_mut(consumed) {
            record.blocked = true;
        }
        for token in replacements {
            tokens.insert(token.token.clone(), token.clone().into_record());
        }
        Ok(true)
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        tokens.retain(|_, record| !record.is_expired_at(now));
        Ok((before - tokens.len()) as u64)
    }
}
