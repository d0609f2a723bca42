//! AskHub Server: authentication and session core
//!
//! Main entry point that wires all crates together and keeps the background
//! tasks running until shutdown.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use askhub_auth::{AccountService, SessionManager, SweepTrigger, TokenCodec, TokenStore};
use askhub_core::config::{AppConfig, DatabaseBackend, LogFormat};
use askhub_core::error::AppError;
use askhub_database::repositories::{
    MemoryTokenRepository, MemoryUserRepository, PgTokenRepository, PgUserRepository,
    TokenRepository, UserRepository,
};
use askhub_database::{DatabasePool, migration};
use askhub_worker::{CronScheduler, LogMailer};

#[tokio::main]
async fn main() {
    let env = std::env::var("ASKHUB_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %env, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        LogFormat::Pretty => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Services shared by every request handler.
#[derive(Debug, Clone)]
struct AuthServices {
    sessions: Arc<SessionManager>,
    accounts: Arc<AccountService>,
    store: Arc<TokenStore>,
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AskHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Repositories ─────────────────────────────────────
    let (users, tokens, db_pool) = init_repositories(&config).await?;

    // ── Step 2: Auth system ──────────────────────────────────────
    tracing::info!(algorithm = %config.auth.algorithm, "Initializing authentication system...");
    // Held until shutdown.
    let AuthServices {
        sessions: _sessions,
        accounts: _accounts,
        store,
    } = init_auth(&config, users, tokens)?;

    // ── Step 3: Scheduled sweep ──────────────────────────────────
    let mut scheduler = CronScheduler::new(Arc::clone(&store)).await?;
    scheduler.register_default_tasks(&config.sweep).await?;
    scheduler.start().await?;

    // Expired rows left over from the previous run.
    let removed = store.sweep_expired().await?;
    tracing::info!(removed, "AskHub authentication core ready");

    // ── Step 4: Wait for shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");

    scheduler.shutdown().await?;
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("AskHub shut down gracefully");
    Ok(())
}

/// Pick the repository backend named in the configuration.
async fn init_repositories(
    config: &AppConfig,
) -> Result<
    (
        Arc<dyn UserRepository>,
        Arc<dyn TokenRepository>,
        Option<DatabasePool>,
    ),
    AppError,
> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_pool = DatabasePool::connect(&config.database).await?;
            db_pool.health_check().await?;

            tracing::info!("Running database migrations...");
            migration::run_migrations(db_pool.pool()).await?;
            tracing::info!("Database migrations complete");

            let users: Arc<dyn UserRepository> =
                Arc::new(PgUserRepository::new(db_pool.pool().clone()));
            let tokens: Arc<dyn TokenRepository> =
                Arc::new(PgTokenRepository::new(db_pool.pool().clone()));
            Ok((users, tokens, Some(db_pool)))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("Using in-memory repositories; state is lost on restart");
            let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
            let tokens: Arc<dyn TokenRepository> = Arc::new(MemoryTokenRepository::new());
            Ok((users, tokens, None))
        }
    }
}

fn init_auth(
    config: &AppConfig,
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn TokenRepository>,
) -> Result<AuthServices, AppError> {
    let codec = Arc::new(TokenCodec::new(&config.auth)?);
    let store = Arc::new(TokenStore::new(tokens));
    let sweeper = SweepTrigger::new(Arc::clone(&store), config.sweep.probability);

    let sessions = Arc::new(SessionManager::new(
        &config.auth,
        codec,
        Arc::clone(&store),
        Arc::clone(&users),
        sweeper,
    )?);

    let mailer = Arc::new(LogMailer::new(&config.mail));
    let accounts = Arc::new(AccountService::new(
        &config.auth,
        &config.mail,
        Arc::clone(&sessions),
        users,
        mailer,
    ));

    Ok(AuthServices {
        sessions,
        accounts,
        store,
    })
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
