//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use askhub_auth::{AccountService, PasswordHasher, SessionManager, SweepTrigger, TokenCodec, TokenStore};
use askhub_core::config::{AuthConfig, MailConfig};
use askhub_core::result::AppResult;
use askhub_core::traits::{Mailer, OutgoingMail};
use askhub_database::repositories::{
    MemoryTokenRepository, MemoryUserRepository, TokenRepository, UserRepository,
};
use askhub_entity::user::{CreateUser, User, UserRole};

/// Mailer that keeps every message for inspection.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        self.sent.lock().await.push(mail);
        Ok(())
    }
}

impl RecordingMailer {
    /// Yield until `count` mails arrived, then return everything sent so far.
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingMail> {
        for _ in 0..100 {
            if self.sent.lock().await.len() >= count {
                break;
            }
            tokio::task::yield_now().await;
        }
        self.sent.lock().await.clone()
    }
}

/// Extract the token query parameter from a mailed link.
pub fn token_from(mail: &OutgoingMail) -> String {
    mail.variables["link"]
        .split("token=")
        .nth(1)
        .expect("link carries a token")
        .to_string()
}

/// Fully wired auth core over in-memory repositories.
pub struct TestApp {
    pub config: AuthConfig,
    pub codec: Arc<TokenCodec>,
    pub tokens: Arc<MemoryTokenRepository>,
    pub store: Arc<TokenStore>,
    pub users: Arc<MemoryUserRepository>,
    pub sessions: Arc<SessionManager>,
    pub accounts: AccountService,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    /// Create a new test application; sweeps never fire on login.
    pub fn new() -> Self {
        Self::with_sweep_probability(0.0)
    }

    /// Create a test application with a custom login sweep probability.
    pub fn with_sweep_probability(probability: f64) -> Self {
        let config = AuthConfig::with_secret("integration-test-secret");
        let codec = Arc::new(TokenCodec::new(&config).expect("codec"));
        let tokens = Arc::new(MemoryTokenRepository::new());
        let token_repo: Arc<dyn TokenRepository> = tokens.clone();
        let store = Arc::new(TokenStore::new(token_repo));
        let users = Arc::new(MemoryUserRepository::new());
        let user_repo: Arc<dyn UserRepository> = users.clone();

        let sessions = Arc::new(
            SessionManager::new(
                &config,
                Arc::clone(&codec),
                Arc::clone(&store),
                Arc::clone(&user_repo),
                SweepTrigger::new(Arc::clone(&store), probability),
            )
            .expect("session manager"),
        );

        let mailer = Arc::new(RecordingMailer::default());
        let accounts = AccountService::new(
            &config,
            &MailConfig::default(),
            Arc::clone(&sessions),
            user_repo,
            mailer.clone(),
        );

        Self {
            config,
            codec,
            tokens,
            store,
            users,
            sessions,
            accounts,
            mailer,
        }
    }

    /// Insert a confirmed, unbanned user with the given role.
    pub async fn create_user(&self, email: &str, password: &str, role: UserRole) -> User {
        let user = self
            .users
            .create(&CreateUser {
                username: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: PasswordHasher::new().hash(password).expect("hash"),
                role,
            })
            .await
            .expect("create user");
        self.users
            .set_email_confirmed(user.id)
            .await
            .expect("confirm");
        self.users
            .get_by_id(user.id)
            .await
            .expect("lookup")
            .expect("user exists")
    }
}
