//! Mail sender that records messages in the log instead of delivering them.

use async_trait::async_trait;

use askhub_core::config::MailConfig;
use askhub_core::result::AppResult;
use askhub_core::traits::{Mailer, OutgoingMail};

/// [`Mailer`] that emits one `tracing` event per message.
///
/// Template variables carry tokens and generated passwords, so only the
/// envelope is logged.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    /// Creates a mailer sending as the configured identity.
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from: format!("{} <{}>", config.from_name, config.from_address),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        tracing::info!(
            from = %self.from,
            recipient = %mail.recipient,
            subject = %mail.subject,
            template = %mail.template,
            variables = mail.variables.len(),
            "Mail dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_succeeds() {
        let mailer = LogMailer::new(&MailConfig::default());
        assert_eq!(mailer.from, "PostsAIcomments <noreply@askhub.local>");

        let mail = OutgoingMail::new("alice@example.com", "Confirm your email", "verify_email.html")
            .with_variable("link", "http://localhost/auth/confirm-email?token=x");
        mailer.send(mail).await.unwrap();
    }
}
