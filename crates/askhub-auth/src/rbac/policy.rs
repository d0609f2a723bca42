//! Role-set authorization for resolved identities.

use askhub_entity::user::UserRole;

use crate::error::{AuthError, AuthResult};
use crate::session::Identity;

/// A set of roles allowed to perform an operation.
///
/// Evaluated only after the identity has been authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: &'static [UserRole],
}

impl AccessPolicy {
    /// Administrators only.
    pub const ADMIN: Self = Self::new(&[UserRole::Admin]);
    /// Administrators and moderators.
    pub const STAFF: Self = Self::new(&[UserRole::Admin, UserRole::Moderator]);
    /// Any authenticated user.
    pub const AUTHENTICATED: Self = Self::new(&UserRole::ALL);

    /// Creates a policy allowing exactly `allowed`.
    pub const fn new(allowed: &'static [UserRole]) -> Self {
        Self { allowed }
    }

    /// Whether `role` is in the allowed set.
    pub fn allows(&self, role: UserRole) -> bool {
        self.allowed.contains(&role)
    }

    /// Returns `Err(Forbidden)` unless the identity's role is allowed.
    pub fn authorize(&self, identity: &Identity) -> AuthResult<()> {
        authorize(identity, self.allowed)
    }
}

/// Fails with [`AuthError::Forbidden`] if `identity.role` is not in `allowed`.
pub fn authorize(identity: &Identity, allowed: &[UserRole]) -> AuthResult<()> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %identity.user_id,
            role = %identity.role,
            "Role not permitted for operation"
        );
        Err(AuthError::Forbidden)
    }
}
