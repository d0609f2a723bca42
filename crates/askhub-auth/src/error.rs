//! Authentication error taxonomy.

use askhub_core::error::{AppError, ErrorKind};

/// Result alias for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Every failure the authentication core surfaces to its callers.
///
/// The transport layer picks status codes from [`AuthError::kind`]; the
/// core only distinguishes kinds.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,
    /// The account exists but its email address is not verified.
    #[error("Email address has not been confirmed")]
    EmailNotConfirmed,
    /// The account is banned.
    #[error("User is banned")]
    UserBanned,
    /// Bad signature, malformed, expired, or revoked token.
    #[error("Invalid or expired token")]
    InvalidToken,
    /// Correctly signed token presented for the wrong purpose.
    #[error("Token scope does not match this operation")]
    InvalidScope,
    /// Refresh token unknown, already consumed, or owned by someone else.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    /// Email or reset token whose subject no longer resolves to a user.
    #[error("Could not verify the token subject")]
    VerificationError,
    /// Current password did not match during a password change.
    #[error("Current password is incorrect")]
    InvalidPassword,
    /// Identity lacks every role the operation allows.
    #[error("Insufficient permissions")]
    Forbidden,
    /// A freshly minted token collided with a stored one.
    #[error("Token already exists")]
    DuplicateToken,
    /// Signup with an email that is already registered.
    #[error("An account with this email already exists")]
    AccountExists,
    /// Storage, hashing, or input validation failure.
    #[error(transparent)]
    App(#[from] AppError),
}

impl AuthError {
    /// Map this error onto the application-wide error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials
            | Self::EmailNotConfirmed
            | Self::UserBanned
            | Self::InvalidToken
            | Self::InvalidScope
            | Self::InvalidRefreshToken
            | Self::VerificationError
            | Self::InvalidPassword => ErrorKind::Authentication,
            Self::Forbidden => ErrorKind::Authorization,
            Self::DuplicateToken | Self::AccountExists => ErrorKind::Conflict,
            Self::App(err) => err.kind,
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(inner) => inner,
            other => AppError::new(other.kind(), other.to_string()),
        }
    }
}
