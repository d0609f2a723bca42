//! Account flows that end in an outgoing mail: signup, confirmation, reset.

use std::sync::Arc;

use tracing::{error, info};
use validator::ValidateEmail;

use askhub_core::config::{AuthConfig, MailConfig};
use askhub_core::error::AppError;
use askhub_core::traits::{Mailer, OutgoingMail};
use askhub_database::repositories::UserRepository;
use askhub_entity::user::{CreateUser, User, UserRole};

use crate::error::{AuthError, AuthResult};
use crate::password::{PasswordHasher, PasswordValidator};
use crate::session::SessionManager;

/// Signup and the mail-driven verification and recovery flows.
///
/// Mails are sent from background tasks. A delivery failure is logged
/// and never undoes the state change that triggered it.
#[derive(Clone)]
pub struct AccountService {
    sessions: Arc<SessionManager>,
    users: Arc<dyn UserRepository>,
    mailer: Arc<dyn Mailer>,
    hasher: PasswordHasher,
    validator: PasswordValidator,
    base_url: String,
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService")
            .field("mailer", &self.mailer)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(
        auth_config: &AuthConfig,
        mail_config: &MailConfig,
        sessions: Arc<SessionManager>,
        users: Arc<dyn UserRepository>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            sessions,
            users,
            mailer,
            hasher: PasswordHasher::new(),
            validator: PasswordValidator::new(auth_config),
            base_url: mail_config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Registers an unconfirmed account and mails a confirmation link.
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> AuthResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::validation("Username must not be empty").into());
        }
        if !email.validate_email() {
            return Err(AppError::validation("Invalid email address").into());
        }
        self.validator.validate(password)?;

        if self.users.get_by_email(email).await?.is_some() {
            return Err(AuthError::AccountExists);
        }

        let user = self
            .users
            .create(&CreateUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: self.hasher.hash(password)?,
                role: UserRole::User,
            })
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AuthError::AccountExists
                } else {
                    AuthError::App(e)
                }
            })?;

        info!(user_id = %user.id, "User signed up");

        self.send_confirmation(&user)?;
        Ok(user)
    }

    /// Mails a new confirmation link. Unknown or confirmed emails are ignored.
    pub async fn resend_confirmation(&self, email: &str) -> AuthResult<()> {
        match self.users.get_by_email(email).await? {
            Some(user) if !user.email_confirmed => {
                self.send_confirmation(&user)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Mails a reset link. Unknown emails are ignored.
    pub async fn forgot_password(&self, email: &str) -> AuthResult<()> {
        if let Some(user) = self.users.get_by_email(email).await? {
            let token = self.sessions.request_password_reset(&user)?;
            let mail = OutgoingMail::new(&user.email, "Reset your password", "reset_password.html")
                .with_variable("username", &user.username)
                .with_variable("link", self.link("reset-password", &token));
            self.dispatch(mail);
        }
        Ok(())
    }

    /// Consumes a reset token and mails the generated password.
    pub async fn reset_password(&self, token: &str) -> AuthResult<()> {
        let (user, password) = self.sessions.reset_password(token).await?;
        let mail = OutgoingMail::new(&user.email, "Your new password", "new_password.html")
            .with_variable("username", &user.username)
            .with_variable("password", password);
        self.dispatch(mail);
        Ok(())
    }

    fn send_confirmation(&self, user: &User) -> AuthResult<()> {
        let token = self.sessions.request_email_confirmation(user)?;
        let mail = OutgoingMail::new(&user.email, "Confirm your email", "verify_email.html")
            .with_variable("username", &user.username)
            .with_variable("link", self.link("confirm-email", &token));
        self.dispatch(mail);
        Ok(())
    }

    fn link(&self, path: &str, token: &str) -> String {
        format!("{}/auth/{path}?token={token}", self.base_url)
    }

    fn dispatch(&self, mail: OutgoingMail) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            let recipient = mail.recipient.clone();
            let template = mail.template.clone();
            if let Err(e) = mailer.send(mail).await {
                error!(
                    recipient = %recipient,
                    template = %template,
                    error = %e,
                    "Failed to deliver account mail"
                );
            }
        });
    }
}
