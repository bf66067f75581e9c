//! Telegram Bot API client: contact-form relay and channel-membership
//! lookups.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::sanitize::clean_field;
use crate::service::MembershipVerifier;

const API_BASE: &str = "https://api.telegram.org";

/// Chat-member statuses that count as channel membership.
const MEMBER_STATUSES: [&str; 3] = ["member", "administrator", "creator"];

/// Errors from the Telegram Bot API client.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Bot token or destination chat is not configured.
    #[error("telegram credentials not configured: {0}")]
    NotConfigured(&'static str),

    /// Transport-level failure.
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("telegram api returned {status}: {body}")]
    Api {
        /// HTTP status of the response.
        status: u16,
        /// Error body as returned by the API.
        body: String,
    },
}

/// A contact-form submission to relay.
#[derive(Debug, Clone, Default)]
pub struct ContactMessage {
    /// Sender's name.
    pub name: String,
    /// Sender's reply address.
    pub email: String,
    /// Company name, if any.
    pub company_name: Option<String>,
    /// Company website.
    pub website: Option<String>,
    /// What the sender wants to achieve.
    pub goals: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMemberEnvelope {
    ok: bool,
    result: Option<ChatMember>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
}

/// Outbound Telegram client.
///
/// All credentials are optional: an unconfigured notifier logs and skips
/// the contact relay instead of failing the request, while membership
/// checks do fail since they gate a reward.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
    channel_id: Option<String>,
}

impl TelegramNotifier {
    /// Builds the client with the given credentials and request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] when the HTTP client cannot be built.
    pub fn new(
        bot_token: Option<String>,
        chat_id: Option<String>,
        channel_id: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            bot_token,
            chat_id,
            channel_id,
        })
    }

    /// Relays a contact-form submission to the configured chat. Fields
    /// are scrubbed of markup and truncated before sending. A missing
    /// token or chat id logs and returns without error.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Http`] on transport failure or
    /// [`NotifyError::Api`] on a non-success response.
    pub async fn send_contact_message(&self, message: &ContactMessage) -> Result<(), NotifyError> {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            tracing::info!("telegram relay not configured, dropping contact message");
            return Ok(());
        };

        let mut text = format!(
            "New contact form submission\nFrom: {}\nEmail: {}",
            clean_field(&message.name),
            clean_field(&message.email),
        );
        for (label, value) in [
            ("Company", &message.company_name),
            ("Website", &message.website),
            ("Goals", &message.goals),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
                text.push_str(&format!("\n{label}: {}", clean_field(value)));
            }
        }

        let response = self
            .client
            .post(format!("{API_BASE}/bot{token}/sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("contact message relayed");
        Ok(())
    }

    /// Looks up a member's status in the configured channel.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotConfigured`] without credentials,
    /// [`NotifyError::Http`] on transport failure, or [`NotifyError::Api`]
    /// when the API rejects the lookup.
    pub async fn chat_member_status(&self, chat_member_id: i64) -> Result<String, NotifyError> {
        let Some(token) = &self.bot_token else {
            return Err(NotifyError::NotConfigured("bot token"));
        };
        let Some(channel_id) = &self.channel_id else {
            return Err(NotifyError::NotConfigured("channel id"));
        };

        let response = self
            .client
            .get(format!("{API_BASE}/bot{token}/getChatMember"))
            .query(&[
                ("chat_id", channel_id.as_str()),
                ("user_id", &chat_member_id.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ChatMemberEnvelope = response.json().await?;
        if !envelope.ok {
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body: envelope.description.unwrap_or_default(),
            });
        }
        Ok(envelope
            .result
            .map(|member| member.status)
            .unwrap_or_default())
    }
}

#[async_trait]
impl MembershipVerifier for TelegramNotifier {
    async fn is_member(&self, chat_member_id: i64) -> anyhow::Result<bool> {
        let status = self.chat_member_status(chat_member_id).await?;
        Ok(MEMBER_STATUSES.contains(&status.as_str()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_notifier(token: Option<&str>, chat: Option<&str>) -> TelegramNotifier {
        let notifier = TelegramNotifier::new(
            token.map(str::to_string),
            chat.map(str::to_string),
            None,
            Duration::from_secs(1),
        );
        let Ok(notifier) = notifier else {
            panic!("client build failed");
        };
        notifier
    }

    #[tokio::test]
    async fn unconfigured_relay_is_a_silent_skip() {
        let notifier = make_notifier(None, None);
        let message = ContactMessage {
            name: "Jane".to_string(),
            email: "jane@example.com".to_string(),
            ..ContactMessage::default()
        };
        assert!(notifier.send_contact_message(&message).await.is_ok());
    }

    #[tokio::test]
    async fn membership_check_requires_credentials() {
        let notifier = make_notifier(None, None);
        let result = notifier.chat_member_status(42).await;
        assert!(matches!(result, Err(NotifyError::NotConfigured(_))));
    }

    #[test]
    fn member_statuses_cover_admin_roles() {
        for status in ["member", "administrator", "creator"] {
            assert!(MEMBER_STATUSES.contains(&status));
        }
        assert!(!MEMBER_STATUSES.contains(&"left"));
        assert!(!MEMBER_STATUSES.contains(&"kicked"));
    }
}
