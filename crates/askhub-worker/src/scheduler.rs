//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use askhub_auth::TokenStore;
use askhub_core::config::SweepConfig;
use askhub_core::error::AppError;

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Token store swept on schedule
    store: Arc<TokenStore>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(store: Arc<TokenStore>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler, store })
    }

    /// Register the tasks enabled by configuration
    pub async fn register_default_tasks(&self, sweep: &SweepConfig) -> Result<(), AppError> {
        if sweep.scheduled {
            self.register_token_sweep(&sweep.cron).await?;
        } else {
            tracing::info!("Scheduled token sweep disabled");
        }
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Expired token sweep on the configured schedule
    async fn register_token_sweep(&self, cron: &str) -> Result<(), AppError> {
        let store = Arc::clone(&self.store);
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let store = Arc::clone(&store);
            Box::pin(async move {
                tracing::debug!("Running scheduled token sweep");
                if let Err(e) = store.sweep_expired().await {
                    tracing::error!(error = %e, "Scheduled token sweep failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid token sweep schedule '{cron}': {e}"))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add token sweep schedule: {e}")))?;

        tracing::info!(cron = %cron, "Registered: token_sweep");
        Ok(())
    }
}
