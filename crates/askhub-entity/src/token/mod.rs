//! Persisted token records.

pub mod model;

pub use model::{NewToken, TokenRecord};
