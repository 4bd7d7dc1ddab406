//! OpenAI chat completions 어댑터.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::warn;

use crate::application::ports::ChatAgent;
use crate::domain::review::{ChatIds, ChatReply};

use super::api_runner::{build_api_client, is_retryable_status};

pub struct OpenAiChatClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    system_message: String,
    retries: u32,
}

impl OpenAiChatClient {
    pub fn new(
        api_base: Option<String>,
        api_key: String,
        model: String,
        temperature: f32,
        system_message: String,
        timeout_ms: u64,
        retries: u32,
    ) -> Self {
        Self {
            client: build_api_client(timeout_ms),
            api_base: api_base.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key,
            model,
            temperature,
            system_message,
            retries,
        }
    }

    /// 일시 오류(429/5xx/타임아웃)에 한해 지수 백오프로 재시도한다.
    async fn post_chat(&self, payload: &Value) -> Result<Value> {
        let endpoint = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let request = self
                .client
                .post(&endpoint)
                .bearer_auth(&self.api_key)
                .json(payload);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .context("OpenAI: failed to read chat response body")?;

                    if status.is_success() {
                        return serde_json::from_str(&body)
                            .context("OpenAI: invalid JSON chat response");
                    }
                    if is_retryable_status(status.as_u16()) && attempt <= self.retries {
                        warn!("OpenAI: chat request failed ({status}); retrying ({attempt})");
                        sleep(backoff(attempt)).await;
                        continue;
                    }
                    bail!("OpenAI: chat request failed ({status}): {body}");
                }
                Err(err) if attempt <= self.retries => {
                    warn!("OpenAI: chat request error: {err}; retrying ({attempt})");
                    sleep(backoff(attempt)).await;
                }
                Err(err) => {
                    return Err(err).context("OpenAI: chat request failed after retries");
                }
            }
        }
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(5))
}

#[async_trait]
impl ChatAgent for OpenAiChatClient {
    async fn send_message(&self, prompt: &str, _ids: &ChatIds) -> Result<ChatReply> {
        // chat completions는 무상태라 부모 메시지 id는 응답 체이닝
        // 식별용으로만 쓰인다. 맥락은 프롬프트에 직접 실어 보낸다.
        let payload = json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "system", "content": self.system_message },
                { "role": "user", "content": prompt }
            ]
        });

        let response = self.post_chat(&payload).await?;

        let text = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();
        if text.is_empty() {
            bail!("OpenAI: empty response content");
        }

        let id = response
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(ChatReply { text, id })
    }
}
