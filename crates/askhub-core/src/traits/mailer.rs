//! Outbound mail collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::result::AppResult;

/// A templated message ready to hand to a mail transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMail {
    /// Recipient address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Template file name, e.g. `"verify_email.html"`.
    pub template: String,
    /// Values substituted into the template.
    pub variables: BTreeMap<String, String>,
}

impl OutgoingMail {
    /// Start a mail for `recipient` rendered from `template`.
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            template: template.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Add a template variable.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

/// Best-effort mail delivery.
///
/// Callers never await this on a request path; it is driven from
/// background tasks and its failures are only logged.
#[async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug + 'static {
    /// Deliver a single message.
    async fn send(&self, mail: OutgoingMail) -> AppResult<()>;
}
