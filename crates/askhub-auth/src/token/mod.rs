//! Token persistence and expiry sweeping.

pub mod store;
pub mod sweeper;

pub use store::TokenStore;
pub use sweeper::SweepTrigger;
