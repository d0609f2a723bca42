//! Background tasks for AskHub.
//!
//! This crate provides:
//! - A cron scheduler running the periodic expired-token sweep
//! - A logging mail sender for the account flows

pub mod mail;
pub mod scheduler;

pub use mail::LogMailer;
pub use scheduler::CronScheduler;
