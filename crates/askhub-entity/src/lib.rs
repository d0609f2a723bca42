//! # askhub-entity
//!
//! Domain entity models for AskHub. Every struct in this crate represents
//! a database table row or a domain value object. Database entities
//! additionally derive `sqlx::FromRow`.

pub mod token;
pub mod user;
