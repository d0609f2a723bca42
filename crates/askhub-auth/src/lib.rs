//! # askhub-auth
//!
//! Authentication and session lifecycle for AskHub.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing, reset-password generation, length policy
//! - `jwt`: scope-tagged token minting and verification
//! - `token`: persisted token records, revocation, and expiry sweeping
//! - `session`: login, refresh rotation, logout, and the mail-token flows
//! - `rbac`: role-set authorization of resolved identities
//! - `account`: signup plus the confirmation and recovery mails

pub mod account;
pub mod error;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;
pub mod token;

pub use account::AccountService;
pub use error::{AuthError, AuthResult};
pub use jwt::{Claims, TokenCodec, TokenScope};
pub use password::{PasswordGenerator, PasswordHasher, PasswordValidator};
pub use rbac::{AccessPolicy, authorize};
pub use session::{Identity, SessionManager, SessionTokens};
pub use token::{SweepTrigger, TokenStore};
