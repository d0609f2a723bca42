//! Authentication configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// HMAC algorithm used to sign every token.
///
/// Only the two HMAC-SHA variants are accepted; any other value fails
/// deserialization and therefore aborts startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    #[default]
    #[serde(rename = "HS256")]
    Hs256,
    /// HMAC with SHA-512.
    #[serde(rename = "HS512")]
    Hs512,
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hs256 => write!(f, "HS256"),
            Self::Hs512 => write!(f, "HS512"),
        }
    }
}

/// Upper bound for `access_token_ttl_minutes` (one week).
pub const MAX_ACCESS_TTL_MINUTES: u64 = 7 * 24 * 60;
/// Upper bound for `refresh_token_ttl_days` (ten years).
pub const MAX_REFRESH_TTL_DAYS: u64 = 3650;
/// Upper bound for `email_token_ttl_days`.
pub const MAX_EMAIL_TTL_DAYS: u64 = 365;

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for token signing.
    pub secret_key: String,
    /// Signing algorithm.
    #[serde(default)]
    pub algorithm: SigningAlgorithm,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token TTL in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Email confirmation and password reset token TTL in days.
    #[serde(default = "default_email_ttl")]
    pub email_token_ttl_days: u64,
    /// Minimum length of a user-chosen password.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum length of a user-chosen password.
    #[serde(default = "default_password_max")]
    pub password_max_length: usize,
    /// Length of passwords generated on reset.
    #[serde(default = "default_generated_length")]
    pub generated_password_length: usize,
    /// Minimum number of digits in a generated password.
    #[serde(default = "default_generated_digits")]
    pub generated_password_min_digits: usize,
}

impl AuthConfig {
    /// Build a config with the given secret and every other field defaulted.
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            algorithm: SigningAlgorithm::default(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            email_token_ttl_days: default_email_ttl(),
            password_min_length: default_password_min(),
            password_max_length: default_password_max(),
            generated_password_length: default_generated_length(),
            generated_password_min_digits: default_generated_digits(),
        }
    }

    /// Reject configurations that would produce unusable tokens or passwords.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.secret_key.trim().is_empty() {
            return Err(AppError::configuration("auth.secret_key must not be empty"));
        }
        check_ttl(
            "access_token_ttl_minutes",
            self.access_token_ttl_minutes,
            MAX_ACCESS_TTL_MINUTES,
        )?;
        check_ttl(
            "refresh_token_ttl_days",
            self.refresh_token_ttl_days,
            MAX_REFRESH_TTL_DAYS,
        )?;
        check_ttl(
            "email_token_ttl_days",
            self.email_token_ttl_days,
            MAX_EMAIL_TTL_DAYS,
        )?;
        // One slot is reserved for the mandatory punctuation character.
        if self.generated_password_min_digits + 1 > self.generated_password_length {
            return Err(AppError::configuration(format!(
                "generated_password_length ({}) cannot hold {} digits and a symbol",
                self.generated_password_length, self.generated_password_min_digits
            )));
        }
        if self.password_min_length > self.password_max_length {
            return Err(AppError::configuration(
                "password_min_length exceeds password_max_length",
            ));
        }
        Ok(())
    }
}

fn check_ttl(name: &str, value: u64, max: u64) -> Result<(), AppError> {
    if value == 0 || value > max {
        return Err(AppError::configuration(format!(
            "auth.{name} must be within 1..={max}, got {value}"
        )));
    }
    Ok(())
}

fn default_access_ttl() -> u64 {
    60
}

fn default_refresh_ttl() -> u64 {
    7
}

fn default_email_ttl() -> u64 {
    7
}

fn default_password_min() -> usize {
    3
}

fn default_password_max() -> usize {
    255
}

fn default_generated_length() -> usize {
    12
}

fn default_generated_digits() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_rejects_unknown() {
        let ok: SigningAlgorithm = serde_json::from_str("\"HS512\"").expect("HS512 is accepted");
        assert_eq!(ok, SigningAlgorithm::Hs512);
        assert!(serde_json::from_str::<SigningAlgorithm>("\"RS256\"").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(AuthConfig::with_secret("secret key").validate().is_ok());
        assert!(AuthConfig::with_secret("  ").validate().is_err());

        let mut config = AuthConfig::with_secret("secret key");
        config.generated_password_length = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ttl_bounds() {
        let mut config = AuthConfig::with_secret("secret key");
        config.email_token_ttl_days = 0;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::with_secret("secret key");
        config.refresh_token_ttl_days = 200_000_000;
        assert!(config.validate().is_err());

        let mut config = AuthConfig::with_secret("secret key");
        config.access_token_ttl_minutes = MAX_ACCESS_TTL_MINUTES;
        config.refresh_token_ttl_days = MAX_REFRESH_TTL_DAYS;
        config.email_token_ttl_days = MAX_EMAIL_TTL_DAYS;
        assert!(config.validate().is_ok());
    }
}
