//! Outbound mail configuration.

use serde::{Deserialize, Serialize};

/// Sender identity and link base for account mails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Envelope sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Display name of the sender.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Public base URL used to build confirmation and reset links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: default_from_address(),
            from_name: default_from_name(),
            base_url: default_base_url(),
        }
    }
}

fn default_from_address() -> String {
    "noreply@askhub.local".to_string()
}

fn default_from_name() -> String {
    "PostsAIcomments".to_string()
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}
