//! Expired-token sweep configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Controls both the probabilistic and the scheduled token sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Chance that a successful login triggers a background sweep.
    #[serde(default = "default_probability")]
    pub probability: f64,
    /// Whether the cron-driven sweep is registered at startup.
    #[serde(default = "default_true")]
    pub scheduled: bool,
    /// Six-field cron expression for the scheduled sweep.
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl SweepConfig {
    /// Ensure the probability is a usable Bernoulli parameter.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(AppError::configuration(format!(
                "sweep.probability must be within [0, 1], got {}",
                self.probability
            )));
        }
        Ok(())
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            probability: default_probability(),
            scheduled: default_true(),
            cron: default_cron(),
        }
    }
}

fn default_probability() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

fn default_cron() -> String {
    "0 0 * * * *".to_string()
}
