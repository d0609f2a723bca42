//! # askhub-database
//!
//! PostgreSQL connection management plus the user and token repositories.
//! Each repository is a capability trait with a PostgreSQL implementation
//! and an in-memory implementation for tests and local development.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{
    MemoryTokenRepository, MemoryUserRepository, PgTokenRepository, PgUserRepository,
    TokenRepository, UserRepository,
};
