//! Session lifecycle manager: login, refresh, logout, and the mail-token flows.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use askhub_core::config::AuthConfig;
use askhub_core::error::AppError;
use askhub_database::repositories::UserRepository;
use askhub_entity::token::NewToken;
use askhub_entity::user::User;

use crate::error::{AuthError, AuthResult};
use crate::jwt::{TokenCodec, TokenScope};
use crate::password::{PasswordGenerator, PasswordHasher, PasswordValidator};
use crate::token::{SweepTrigger, TokenStore};

use super::identity::{Identity, SessionTokens};

/// How many times a colliding token is re-minted before giving up.
const MAX_MINT_ATTEMPTS: u32 = 3;

/// Converts a configured TTL, rejecting values `chrono` cannot represent.
fn ttl(name: &str, value: u64, unit: fn(i64) -> Option<Duration>) -> Result<Duration, AppError> {
    i64::try_from(value)
        .ok()
        .and_then(unit)
        .ok_or_else(|| AppError::configuration(format!("auth.{name} is out of range: {value}")))
}

/// Orchestrates the token lifecycle on top of the codec, store, and user repository.
#[derive(Clone)]
pub struct SessionManager {
    /// Token signing and verification.
    codec: Arc<TokenCodec>,
    /// Persisted token records.
    store: Arc<TokenStore>,
    /// User repository.
    users: Arc<dyn UserRepository>,
    /// Password hasher.
    hasher: PasswordHasher,
    /// Policy for user-chosen passwords.
    validator: PasswordValidator,
    /// Generator for reset passwords.
    generator: PasswordGenerator,
    /// Probabilistic sweep fired after logins.
    sweeper: SweepTrigger,
    access_ttl: Duration,
    refresh_ttl: Duration,
    email_ttl: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("codec", &self.codec)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("email_ttl", &self.email_ttl)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    pub fn new(
        config: &AuthConfig,
        codec: Arc<TokenCodec>,
        store: Arc<TokenStore>,
        users: Arc<dyn UserRepository>,
        sweeper: SweepTrigger,
    ) -> Result<Self, AppError> {
        Ok(Self {
            codec,
            store,
            users,
            hasher: PasswordHasher::new(),
            validator: PasswordValidator::new(config),
            generator: PasswordGenerator::from_config(config)?,
            sweeper,
            access_ttl: ttl(
                "access_token_ttl_minutes",
                config.access_token_ttl_minutes,
                Duration::try_minutes,
            )?,
            refresh_ttl: ttl(
                "refresh_token_ttl_days",
                config.refresh_token_ttl_days,
                Duration::try_days,
            )?,
            email_ttl: ttl(
                "email_token_ttl_days",
                config.email_token_ttl_days,
                Duration::try_days,
            )?,
        })
    }

    /// Performs the login flow.
    ///
    /// Checks run in a fixed order: user lookup, email confirmed,
    /// password, banned.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<SessionTokens> {
        // Step 1: Find user
        let Some(user) = self.users.get_by_email(email).await? else {
            warn!("Login failed: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        // Step 2: Email must be verified
        if !user.email_confirmed {
            warn!(user_id = %user.id, "Login refused: email not confirmed");
            return Err(AuthError::EmailNotConfirmed);
        }

        // Step 3: Verify password
        if !self.hasher.verify(password, &user.password_hash) {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        // Step 4: Banned users cannot start sessions
        if user.banned {
            warn!(user_id = %user.id, "Login refused: user is banned");
            return Err(AuthError::UserBanned);
        }

        // Step 5: Mint and persist a fresh pair
        let tokens = self.issue_pair(&user).await?;

        self.sweeper.maybe_sweep();

        info!(user_id = %user.id, "Login successful");
        Ok(tokens)
    }

    /// Exchanges a refresh token for a new pair, consuming it.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<SessionTokens> {
        // Step 1: Verify signature, expiry, and scope
        let claims = self.codec.decode(refresh_token, TokenScope::RefreshToken)?;

        // Step 2: Resolve the subject
        let user = self
            .users
            .get_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Step 3: The record must exist, be live, and belong to the subject
        let Some(record) = self.store.get(refresh_token).await? else {
            warn!(user_id = %user.id, "Refresh token has no record");
            return Err(AuthError::InvalidRefreshToken);
        };
        if record.user_id != user.id {
            warn!(
                user_id = %user.id,
                owner_id = %record.user_id,
                "Refresh token owner does not match subject"
            );
            return Err(AuthError::InvalidRefreshToken);
        }
        if record.blocked {
            warn!(user_id = %user.id, "Blocked refresh token presented again");
            return Err(AuthError::InvalidRefreshToken);
        }

        if user.banned {
            return Err(AuthError::UserBanned);
        }

        // Step 4: Block the old token and persist the new pair atomically
        for attempt in 1..=MAX_MINT_ATTEMPTS {
            let access = self.mint(&user, TokenScope::AccessToken, self.access_ttl)?;
            let refresh = self.mint(&user, TokenScope::RefreshToken, self.refresh_ttl)?;

            match self
                .store
                .rotate(refresh_token, user.id, &[access.clone(), refresh.clone()])
                .await
            {
                Ok(true) => {
                    info!(user_id = %user.id, "Refresh token rotated");
                    return Ok(SessionTokens::bearer(access.token, refresh.token));
                }
                Ok(false) => {
                    warn!(user_id = %user.id, "Lost refresh race for an already consumed token");
                    return Err(AuthError::InvalidRefreshToken);
                }
                Err(AuthError::DuplicateToken) if attempt < MAX_MINT_ATTEMPTS => {
                    warn!(user_id = %user.id, attempt, "Minted token collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AuthError::DuplicateToken)
    }

    /// Blocks every live token of the user.
    pub async fn logout(&self, user_id: Uuid) -> AuthResult<u64> {
        let blocked = self.store.block_all_for_user(user_id).await?;
        info!(user_id = %user_id, blocked, "Logout completed");
        Ok(blocked)
    }

    /// Resolves a bearer access token to the identity behind it.
    pub async fn authenticate(&self, bearer: &str) -> AuthResult<Identity> {
        let claims = self.codec.decode(bearer, TokenScope::AccessToken)?;

        if self.store.is_blocked(bearer).await? {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .users
            .get_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if user.banned {
            return Err(AuthError::UserBanned);
        }

        Ok(Identity::from(&user))
    }

    /// Mints an email-confirmation token. Not persisted.
    pub fn request_email_confirmation(&self, user: &User) -> AuthResult<String> {
        self.codec
            .mint(&user.email, TokenScope::EmailConfirmToken, self.email_ttl)
    }

    /// Marks the token subject's email as confirmed.
    pub async fn confirm_email(&self, token: &str) -> AuthResult<()> {
        let user = self.resolve_mail_token(token, TokenScope::EmailConfirmToken).await?;
        self.users.set_email_confirmed(user.id).await?;
        info!(user_id = %user.id, "Email confirmed");
        Ok(())
    }

    /// Replaces the password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;

        if !self.hasher.verify(old_password, &user.password_hash) {
            warn!(user_id = %user.id, "Password change refused: wrong current password");
            return Err(AuthError::InvalidPassword);
        }

        self.validator.validate(new_password)?;
        self.validator.validate_not_same(old_password, new_password)?;
        let hash = self.hasher.hash(new_password)?;
        self.users.update_password(user.id, &hash).await?;

        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Mints a password-reset token. Not persisted.
    pub fn request_password_reset(&self, user: &User) -> AuthResult<String> {
        self.codec
            .mint(&user.email, TokenScope::PasswordResetToken, self.email_ttl)
    }

    /// Sets a freshly generated password and returns it in plaintext once.
    pub async fn reset_password(&self, token: &str) -> AuthResult<(User, String)> {
        let user = self
            .resolve_mail_token(token, TokenScope::PasswordResetToken)
            .await?;

        let password = self.generator.generate();
        let hash = self.hasher.hash(&password)?;
        self.users.update_password(user.id, &hash).await?;

        info!(user_id = %user.id, "Password reset");
        Ok((user, password))
    }

    /// Bans a user and revokes all of their tokens.
    pub async fn ban(&self, user_id: Uuid) -> AuthResult<()> {
        self.users.set_banned(user_id, true).await?;
        let blocked = self.store.block_all_for_user(user_id).await?;
        info!(user_id = %user_id, blocked, "User banned");
        Ok(())
    }

    /// Lifts a ban. Previously revoked tokens stay revoked.
    pub async fn unban(&self, user_id: Uuid) -> AuthResult<()> {
        self.users.set_banned(user_id, false).await?;
        info!(user_id = %user_id, "User unbanned");
        Ok(())
    }

    async fn resolve_mail_token(&self, token: &str, scope: TokenScope) -> AuthResult<User> {
        let claims = self.codec.decode(token, scope)?;
        self.users
            .get_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::VerificationError)
    }

    fn mint(&self, user: &User, scope: TokenScope, ttl: Duration) -> AuthResult<NewToken> {
        let token = self.codec.mint(&user.email, scope, ttl)?;
        let expires_at = self.codec.expiry_of(&token)?;
        Ok(NewToken {
            token,
            user_id: user.id,
            expires_at,
        })
    }

    /// Mint and persist one token, re-minting on collision.
    async fn mint_persisted(
        &self,
        user: &User,
        scope: TokenScope,
        ttl: Duration,
    ) -> AuthResult<String> {
        let mut attempt = 1;
        loop {
            let minted = self.mint(user, scope, ttl)?;
            match self
                .store
                .add(&minted.token, minted.user_id, minted.expires_at)
                .await
            {
                Ok(()) => return Ok(minted.token),
                Err(AuthError::DuplicateToken) if attempt < MAX_MINT_ATTEMPTS => {
                    warn!(user_id = %user.id, %scope, attempt, "Minted token collided, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn issue_pair(&self, user: &User) -> AuthResult<SessionTokens> {
        let access = self
            .mint_persisted(user, TokenScope::AccessToken, self.access_ttl)
            .await?;
        let refresh = self
            .mint_persisted(user, TokenScope::RefreshToken, self.refresh_ttl)
            .await?;
        Ok(SessionTokens::bearer(access, refresh))
    }
}
