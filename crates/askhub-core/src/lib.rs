//! # askhub-core
//!
//! Core crate for AskHub. Contains configuration schemas, the unified
//! error system, and the traits for collaborators that live outside the
//! authentication core (such as outbound mail).
//!
//! This crate has **no** internal dependencies on other AskHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
