//! Core traits defined in `askhub-core` and implemented by other crates.

pub mod mailer;

pub use mailer::{Mailer, OutgoingMail};
