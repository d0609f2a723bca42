//! Session lifecycle management.

pub mod identity;
pub mod manager;

pub use identity::{Identity, SessionTokens};
pub use manager::SessionManager;
