//! Repository traits and their implementations.
//!
//! The auth core depends only on the [`UserRepository`] and
//! [`TokenRepository`] traits; the PostgreSQL and in-memory variants are
//! chosen once at startup.

pub mod memory;
pub mod token;
pub mod user;

pub use memory::{MemoryTokenRepository, MemoryUserRepository};
pub use token::{PgTokenRepository, TokenRepository};
pub use user::{PgUserRepository, UserRepository};
