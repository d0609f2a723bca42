//! Signing and verification of scope-tagged JWTs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use askhub_core::config::{AuthConfig, SigningAlgorithm};
use askhub_core::error::AppError;

use crate::error::{AuthError, AuthResult};

use super::claims::{Claims, TokenScope};

/// Mints and verifies every token the service hands out.
///
/// Built once at startup from the immutable [`AuthConfig`] and shared
/// read-only afterwards.
#[derive(Clone)]
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

impl TokenCodec {
    /// Creates a codec from auth configuration.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        if config.secret_key.is_empty() {
            return Err(AppError::configuration("auth.secret_key must not be empty"));
        }

        let algorithm = match config.algorithm {
            SigningAlgorithm::Hs256 => Algorithm::HS256,
            SigningAlgorithm::Hs512 => Algorithm::HS512,
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            validation,
        })
    }

    /// Sign a token for `subject` valid for `ttl` from now.
    ///
    /// A negative `ttl` yields an already-expired token.
    pub fn mint(&self, subject: &str, scope: TokenScope, ttl: Duration) -> AuthResult<String> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or_else(|| {
            AuthError::App(AppError::internal(format!(
                "{scope} token lifetime overflows the clock"
            )))
        })?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            scope,
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            AuthError::App(AppError::internal(format!(
                "Failed to encode {scope} token: {e}"
            )))
        })
    }

    /// Verify signature and expiry, then require `expected` scope.
    pub fn decode(&self, token: &str, expected: TokenScope) -> AuthResult<Claims> {
        let claims = self.verify(token, &self.validation)?;
        if claims.scope != expected {
            tracing::debug!(
                expected = %expected,
                actual = %claims.scope,
                "Rejected token with mismatched scope"
            );
            return Err(AuthError::InvalidScope);
        }
        Ok(claims)
    }

    /// Read the `exp` claim of a correctly signed token, expired or not.
    pub fn expiry_of(&self, token: &str) -> AuthResult<DateTime<Utc>> {
        let mut validation = self.validation.clone();
        validation.validate_exp = false;

        let claims = self.verify(token, &validation)?;
        claims.expires_at().ok_or(AuthError::InvalidToken)
    }

    fn verify(&self, token: &str, validation: &Validation) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, validation)
            .map(|data| data.claims)
            .map_err(|e| {
                match e.kind() {
                    JwtErrorKind::ExpiredSignature => tracing::debug!("Token has expired"),
                    JwtErrorKind::InvalidSignature => tracing::debug!("Invalid token signature"),
                    _ => tracing::debug!(error = %e, "Token validation failed"),
                }
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use askhub_core::error::ErrorKind;

    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::with_secret("test-secret")).unwrap()
    }

    #[test]
    fn test_roundtrip_returns_subject() {
        let codec = codec();
        let token = codec
            .mint("alice@example.com", TokenScope::AccessToken, Duration::hours(1))
            .unwrap();

        let claims = codec.decode(&token, TokenScope::AccessToken).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.scope, TokenScope::AccessToken);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_scope_mismatch_is_invalid_scope() {
        let codec = codec();
        let token = codec
            .mint("alice@example.com", TokenScope::EmailConfirmToken, Duration::days(7))
            .unwrap();

        for scope in [
            TokenScope::AccessToken,
            TokenScope::RefreshToken,
            TokenScope::PasswordResetToken,
        ] {
            assert!(matches!(
                codec.decode(&token, scope),
                Err(AuthError::InvalidScope)
            ));
        }
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let codec = codec();
        let token = codec
            .mint("alice@example.com", TokenScope::AccessToken, Duration::seconds(-1))
            .unwrap();

        assert!(matches!(
            codec.decode(&token, TokenScope::AccessToken),
            Err(AuthError::InvalidToken)
        ));
        // Bookkeeping still works on expired tokens.
        assert!(codec.expiry_of(&token).unwrap() < Utc::now());
    }

    #[test]
    fn test_foreign_secret_and_garbage_are_invalid() {
        let other = TokenCodec::new(&AuthConfig::with_secret("other-secret")).unwrap();
        let token = other
            .mint("alice@example.com", TokenScope::AccessToken, Duration::hours(1))
            .unwrap();

        let codec = codec();
        assert!(matches!(
            codec.decode(&token, TokenScope::AccessToken),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            codec.expiry_of("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_algorithm_is_pinned() {
        let mut config = AuthConfig::with_secret("test-secret");
        config.algorithm = SigningAlgorithm::Hs512;
        let hs512 = TokenCodec::new(&config).unwrap();
        let token = hs512
            .mint("alice@example.com", TokenScope::AccessToken, Duration::hours(1))
            .unwrap();

        assert!(hs512.decode(&token, TokenScope::AccessToken).is_ok());
        assert!(matches!(
            codec().decode(&token, TokenScope::AccessToken),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_same_second_tokens_differ() {
        let codec = codec();
        let a = codec
            .mint("alice@example.com", TokenScope::RefreshToken, Duration::days(7))
            .unwrap();
        let b = codec
            .mint("alice@example.com", TokenScope::RefreshToken, Duration::days(7))
            .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_overflowing_ttl_is_an_error() {
        let codec = codec();
        let result = codec.mint("alice@example.com", TokenScope::RefreshToken, Duration::MAX);
        assert!(matches!(result, Err(AuthError::App(ref e)) if e.kind == ErrorKind::Internal));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenCodec::new(&AuthConfig::with_secret("")).is_err());
    }
}
