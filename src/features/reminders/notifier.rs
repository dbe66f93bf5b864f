//! # Notifier
//!
//! Outbound delivery of reminder text to a chat.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use crate::core::{chunk_for_message, VocabError, VocabResult};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver HTML-formatted `text` to the user's chat
    async fn send(&self, user_id: i64, text: &str) -> VocabResult<()>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error_code: Option<u16>,
    #[serde(default)]
    description: Option<String>,
}

impl ApiResponse {
    fn into_error(self) -> VocabError {
        let description = self
            .description
            .unwrap_or_else(|| "sendMessage returned ok=false".to_string());
        match self.error_code {
            // 429 is flood control and clears on its own
            Some(code) if (400..500).contains(&code) && code != 429 => {
                VocabError::Rejected(format!("{code} {description}"))
            }
            _ => VocabError::Delivery(description),
        }
    }
}

/// Telegram Bot API `sendMessage`
#[derive(Clone)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl TelegramNotifier {
    pub fn new(token: &str, api_base: &str) -> VocabResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}/sendMessage", api_base.trim_end_matches('/')),
        })
    }

    async fn send_chunk(&self, user_id: i64, text: &str) -> VocabResult<()> {
        let body = SendMessage {
            chat_id: user_id,
            text,
            parse_mode: "HTML",
        };
        let response: ApiResponse = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            Ok(())
        } else {
            Err(response.into_error())
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// Long text goes out in several messages. Once the first one is
    /// delivered the send counts as done, so a retry never repeats it.
    async fn send(&self, user_id: i64, text: &str) -> VocabResult<()> {
        let chunks = chunk_for_message(text);
        let total = chunks.len();
        for (index, chunk) in chunks.iter().enumerate() {
            match self.send_chunk(user_id, chunk).await {
                Ok(()) => debug!("Delivered {} bytes to chat {user_id}", chunk.len()),
                Err(e) if index > 0 => {
                    warn!("Message to chat {user_id} cut short after {index} of {total} parts: {e}");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Dry-run notifier: logs instead of sending
#[derive(Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, user_id: i64, text: &str) -> VocabResult<()> {
        info!("[dry run] reminder for user {user_id}:\n{text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MESSAGE_LIMIT;
    use crate::features::reminders::fake_telegram::{accepted, refused, FakeTelegram};

    #[test]
    fn test_endpoint() {
        let notifier = TelegramNotifier::new("123:abc", "https://api.telegram.org/").unwrap();
        assert_eq!(
            notifier.endpoint,
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_request_body() {
        let body = SendMessage {
            chat_id: 42,
            text: "<b>hi</b>",
            parse_mode: "HTML",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["chat_id"], 42);
        assert_eq!(json["parse_mode"], "HTML");
    }

    #[test]
    fn test_error_classification() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"ok":false,"error_code":403,"description":"Forbidden: bot was blocked by the user"}"#,
        )
        .unwrap();
        assert!(!response.ok);
        match response.into_error() {
            VocabError::Rejected(msg) => assert!(msg.contains("blocked by the user")),
            other => panic!("expected Rejected, got {other:?}"),
        }

        let flood: ApiResponse =
            serde_json::from_str(r#"{"ok":false,"error_code":429,"description":"Too Many Requests"}"#)
                .unwrap();
        assert!(matches!(flood.into_error(), VocabError::Delivery(_)));

        let server: ApiResponse = serde_json::from_str(r#"{"ok":false,"error_code":502}"#).unwrap();
        assert!(matches!(server.into_error(), VocabError::Delivery(_)));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        let notifier = TelegramNotifier::new("SECRET123:tok", "http://127.0.0.1:1").unwrap();
        let err = notifier.send(7, "hello").await.unwrap_err();
        assert!(matches!(err, VocabError::Delivery(_)));
        assert!(!err.to_string().contains("SECRET123"));
    }

    fn long_text() -> String {
        (0..400)
            .map(|i| format!("<code>{i}.</code> line"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_multi_part_message() {
        let server = FakeTelegram::start(|_, _| accepted()).await;
        let notifier = TelegramNotifier::new("1:t", &server.base_url).unwrap();

        notifier.send(7, &long_text()).await.unwrap();
        let delivered = server.delivered();
        assert!(delivered.len() > 1);
        assert!(delivered.iter().all(|part| part.len() <= MESSAGE_LIMIT));
    }

    #[tokio::test]
    async fn test_partial_delivery_counts_as_sent() {
        let server = FakeTelegram::start(|index, _| {
            if index == 0 {
                accepted()
            } else {
                refused(400, "Bad Request: can't parse entities")
            }
        })
        .await;
        let notifier = TelegramNotifier::new("1:t", &server.base_url).unwrap();

        assert!(notifier.send(7, &long_text()).await.is_ok());
        assert_eq!(server.requests(), 2);
        assert_eq!(server.delivered().len(), 1);
    }

    #[tokio::test]
    async fn test_first_part_refused() {
        let server = FakeTelegram::start(|_, _| refused(403, "Forbidden: bot was blocked by the user")).await;
        let notifier = TelegramNotifier::new("1:t", &server.base_url).unwrap();

        let err = notifier.send(7, "hi").await.unwrap_err();
        assert!(matches!(err, VocabError::Rejected(_)));
        assert_eq!(server.requests(), 1);
        assert!(server.delivered().is_empty());
    }

    #[tokio::test]
    async fn test_log_notifier_succeeds() {
        assert!(LogNotifier.send(1, "hello").await.is_ok());
    }
}
