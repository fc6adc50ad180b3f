//! Bot API client over reqwest

use super::types::{reply_markup, ApiResponse, Update};
use super::TransportError;
use crate::render::Prompt;
use crate::runtime::Transport;
use crate::services::{PollPublisher, ServiceError};
use crate::state_machine::{ChatId, MessageId, PollDraft};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Telegram Bot API client
pub struct TelegramClient {
    client: Client,
    token: String,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramClient {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Call a Bot API method and unwrap its envelope
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, TransportError> {
        let mut request = self.client.post(self.method_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let body = request.send().await?.text().await?;
        parse_envelope(method, &body)
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(
        &self,
        offset: i64,
        poll_timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        let payload = json!({
            "offset": offset,
            "timeout": poll_timeout.as_secs(),
            "allowed_updates": ["message", "callback_query"],
        });
        // The HTTP request must outlive the server-side wait
        self.call(
            "getUpdates",
            &payload,
            Some(poll_timeout + Duration::from_secs(10)),
        )
        .await
    }

    /// Switch to polling, optionally discarding updates that queued up while offline
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "deleteWebhook",
                &json!({ "drop_pending_updates": drop_pending_updates }),
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TransportError> {
        let mut payload = json!({
            "url": url,
            "allowed_updates": ["message", "callback_query"],
            "drop_pending_updates": true,
        });
        if let Some(secret) = secret {
            payload["secret_token"] = json!(secret);
        }
        let _: bool = self.call("setWebhook", &payload, None).await?;
        Ok(())
    }

    /// Stop the client-side spinner on a pressed inline button
    pub async fn answer_callback_query(&self, query_id: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({ "callback_query_id": query_id }),
                None,
            )
            .await?;
        Ok(())
    }

    async fn send_poll(&self, poll: &PollDraft) -> Result<(), TransportError> {
        let options: Vec<Value> = poll
            .answers
            .iter()
            .map(|answer| json!({ "text": answer }))
            .collect();
        let payload = json!({
            "chat_id": poll.chat_id,
            "question": poll.question,
            "options": options,
            "is_anonymous": poll.is_anonymous,
            "allows_multiple_answers": poll.allows_multiple_answers,
        });
        let _: Value = self.call("sendPoll", &payload, None).await?;
        Ok(())
    }
}

/// Decode a Bot API envelope, turning `ok: false` into an API error
fn parse_envelope<T: DeserializeOwned>(method: &str, body: &str) -> Result<T, TransportError> {
    let response: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| TransportError::Decode(format!("{method}: {e} - body: {body}")))?;

    if !response.ok {
        return Err(TransportError::Api {
            code: response.error_code.unwrap_or_default(),
            description: response.description.unwrap_or_default(),
        });
    }

    response
        .result
        .ok_or_else(|| TransportError::Decode(format!("{method}: missing result")))
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_prompt(&self, chat_id: ChatId, prompt: &Prompt) -> Result<(), TransportError> {
        let mut payload = json!({
            "chat_id": chat_id.0,
            "text": prompt.text,
        });
        if let Some(markup) = reply_markup(&prompt.keyboard) {
            payload["reply_markup"] = markup;
        }
        let sent: SentMessage = self.call("sendMessage", &payload, None).await?;
        tracing::debug!(chat_id = %chat_id, message_id = sent.message_id, "Prompt sent");
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, url: &str) -> Result<(), TransportError> {
        let payload = json!({ "chat_id": chat_id.0, "photo": url });
        let _: SentMessage = self.call("sendPhoto", &payload, None).await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        let payload = json!({ "chat_id": chat_id.0, "message_id": message_id.0 });
        let _: bool = self.call("deleteMessage", &payload, None).await?;
        Ok(())
    }
}

#[async_trait]
impl PollPublisher for TelegramClient {
    async fn publish_poll(&self, poll: &PollDraft) -> Result<(), ServiceError> {
        self.send_poll(poll).await.map_err(|e| {
            if e.is_chat_not_found() {
                ServiceError::chat_not_found(e.to_string())
            } else {
                ServiceError::unavailable(e.to_string())
            }
        })
    }
}
