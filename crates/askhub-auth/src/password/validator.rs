//! Password policy for user-chosen passwords.

use askhub_core::config::AuthConfig;
use askhub_core::error::AppError;

/// Validates user-chosen passwords against the configured length bounds.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    /// Minimum password length.
    min_length: usize,
    /// Maximum password length.
    max_length: usize,
}

impl PasswordValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
            max_length: config.password_max_length,
        }
    }

    /// Returns a validation error describing the first violation found.
    pub fn validate(&self, password: &str) -> Result<(), AppError> {
        let length = password.chars().count();

        if length < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if length > self.max_length {
            return Err(AppError::validation(format!(
                "Password must be at most {} characters long",
                self.max_length
            )));
        }

        Ok(())
    }

    /// Validates that a new password differs from the old one.
    pub fn validate_not_same(&self, old_password: &str, new_password: &str) -> Result<(), AppError> {
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must be different from the current password",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        let validator = PasswordValidator::new(&AuthConfig::with_secret("s"));
        assert!(validator.validate("ab").is_err());
        assert!(validator.validate("abc").is_ok());
        assert!(validator.validate(&"x".repeat(255)).is_ok());
        assert!(validator.validate(&"x".repeat(256)).is_err());
    }

    #[test]
    fn test_not_same() {
        let validator = PasswordValidator::new(&AuthConfig::with_secret("s"));
        assert!(validator.validate_not_same("old", "old").is_err());
        assert!(validator.validate_not_same("old", "new").is_ok());
    }
}
