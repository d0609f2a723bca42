//! Probabilistic expired-token sweep.

use std::sync::Arc;

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::store::TokenStore;

/// Occasionally schedules [`TokenStore::sweep_expired`] in the background.
///
/// Called on hot paths such as login; the caller never waits for the sweep.
#[derive(Debug, Clone)]
pub struct SweepTrigger {
    store: Arc<TokenStore>,
    probability: f64,
}

impl SweepTrigger {
    /// Creates a trigger firing with `probability`, clamped to `[0, 1]`.
    pub fn new(store: Arc<TokenStore>, probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { store, probability }
    }

    /// Draw once; on a hit, spawn a sweep and return its handle.
    pub fn maybe_sweep(&self) -> Option<JoinHandle<()>> {
        if !rand::thread_rng().gen_bool(self.probability) {
            return None;
        }

        debug!("Scheduling background token sweep");
        let store = Arc::clone(&self.store);
        Some(tokio::spawn(async move {
            if let Err(e) = store.sweep_expired().await {
                error!(error = %e, "Background token sweep failed");
            }
        }))
    }
}
