//! Telegram Bot API delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::TelegramConfig;
use crate::notify::{Delivery, Notifier};

/// Bot token and target chat.
#[derive(Clone)]
pub struct TelegramCredentials {
    pub token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredentials")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramCredentials {
    /// Read credentials from the environment variables named in `config`.
    ///
    /// Returns `None` when either value is missing or blank.
    pub fn from_env(config: &TelegramConfig) -> Option<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self::from_parts(read(&config.token_env), read(&config.chat_id_env))
    }

    fn from_parts(token: Option<String>, chat_id: Option<String>) -> Option<Self> {
        Some(Self {
            token: token?,
            chat_id: chat_id?,
        })
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

/// Sends messages through the Bot API `sendMessage` method.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    credentials: Option<TelegramCredentials>,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig, credentials: Option<TelegramCredentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Build a notifier with credentials taken from the environment.
    pub fn from_env(config: &TelegramConfig) -> Result<Self> {
        Self::new(config, TelegramCredentials::from_env(config))
    }

    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    fn endpoint(&self, token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<Delivery> {
        let Some(credentials) = &self.credentials else {
            log::info!("Telegram credentials not set; skipping message");
            return Ok(Delivery::Skipped);
        };

        let payload = SendMessage {
            chat_id: &credentials.chat_id,
            text,
            disable_web_page_preview: true,
        };

        // The endpoint embeds the token, so keep URLs out of error text.
        let response = self
            .client
            .post(self.endpoint(&credentials.token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::notify(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("status {status}: {body}")));
        }

        log::info!("Telegram message delivered");
        Ok(Delivery::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_parts() {
        assert!(TelegramCredentials::from_parts(Some("t".into()), None).is_none());
        assert!(TelegramCredentials::from_parts(None, Some("c".into())).is_none());
        assert!(TelegramCredentials::from_parts(Some("t".into()), Some("c".into())).is_some());
    }

    #[test]
    fn test_credentials_from_unset_env() {
        let config = TelegramConfig {
            token_env: "PULSEWATCH_TEST_UNSET_TOKEN".into(),
            chat_id_env: "PULSEWATCH_TEST_UNSET_CHAT".into(),
            ..TelegramConfig::default()
        };
        assert!(TelegramCredentials::from_env(&config).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = TelegramCredentials {
            token: "secret-token".into(),
            chat_id: "42".into(),
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("42"));
    }

    #[test]
    fn test_endpoint() {
        let config = TelegramConfig {
            api_base: "https://api.telegram.org/".into(),
            ..TelegramConfig::default()
        };
        let notifier = TelegramNotifier::new(&config, None).unwrap();
        assert_eq!(
            notifier.endpoint("abc"),
            "https://api.telegram.org/botabc/sendMessage"
        );
    }

    #[test]
    fn test_payload_disables_previews() {
        let payload = SendMessage {
            chat_id: "42",
            text: "hello",
            disable_web_page_preview: true,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "chat_id": "42",
                "text": "hello",
                "disable_web_page_preview": true
            })
        );
    }

    #[tokio::test]
    async fn test_send_without_credentials_is_skipped() {
        let notifier = TelegramNotifier::new(&TelegramConfig::default(), None).unwrap();
        assert!(!notifier.is_configured());
        assert_eq!(notifier.send("hello").await.unwrap(), Delivery::Skipped);
    }
}
