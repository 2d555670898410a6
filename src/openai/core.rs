use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tiktoken_rs::CoreBPE;

use crate::ai::chat::{CompletionProvider, Message, ModelConfig, Role, TranscriptionProvider};

/// A message as it's sent over the wire to an OpenAI compatible API.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        Self::new(msg.role, &msg.content)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response: {0}")]
    Malformed(String),
}

impl RequestError {
    /// Rate limits, server errors, and connection problems are worth
    /// another try. Anything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            Self::Transport(_) => true,
            Self::Malformed(_) => false,
        }
    }
}

/// Builds the messages array: the system message followed by the
/// conversation in order.
pub fn payload_messages(system_message: &str, messages: &[Message]) -> Vec<WireMessage> {
    std::iter::once(WireMessage::new(Role::System, system_message))
        .chain(messages.iter().map(WireMessage::from))
        .collect()
}

pub async fn completion(
    client: &reqwest::Client,
    messages: &[WireMessage],
    config: &ModelConfig,
    api_hostname: &str,
    api_key: &str,
) -> Result<String, RequestError> {
    let payload = json!({
        "model": config.model,
        "temperature": config.temperature,
        "messages": messages,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60))
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestError::Status { status, body });
    }

    let resp: Value = response.json().await?;
    resp["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| RequestError::Malformed(format!("No message received. Resp:\n\n {}", resp)))
}

pub async fn transcription(
    client: &reqwest::Client,
    audio: &[u8],
    model: &str,
    api_hostname: &str,
    api_key: &str,
) -> Result<String, RequestError> {
    let file = Part::bytes(audio.to_vec()).file_name("audio.wav");
    let form = Form::new()
        .text("model", model.to_string())
        .text("response_format", "json")
        .part("file", file);
    let url = format!(
        "{}/v1/audio/transcriptions",
        api_hostname.trim_end_matches("/")
    );
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .timeout(Duration::from_secs(60))
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RequestError::Status { status, body });
    }

    let resp: Value = response.json().await?;
    resp["text"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| RequestError::Malformed(format!("No transcription received. Resp:\n\n {}", resp)))
}

/// Completion and transcription against an OpenAI compatible API
/// (OpenAI, Groq, a local llama.cpp server, etc).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    transcription_model: String,
    retry_backoff: Duration,
    tokenizer: Option<CoreBPE>,
}

impl OpenAiProvider {
    pub fn new(api_hostname: &str, api_key: &str, transcription_model: &str) -> Self {
        // Not every hosted model uses this encoding but it's a much
        // closer estimate than counting words
        let tokenizer = tiktoken_rs::cl100k_base()
            .inspect_err(|e| {
                tracing::warn!("Tokenizer unavailable, falling back to word counts: {}", e)
            })
            .ok();

        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            transcription_model: transcription_model.to_string(),
            retry_backoff: Duration::from_millis(500),
            tokenizer,
        }
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn without_tokenizer(mut self) -> Self {
        self.tokenizer = None;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        system_message: &str,
        messages: &[Message],
        config: &ModelConfig,
    ) -> Result<String, Error> {
        let payload = payload_messages(system_message, messages);
        let mut attempt = 0;
        loop {
            match completion(
                &self.client,
                &payload,
                config,
                &self.api_hostname,
                &self.api_key,
            )
            .await
            {
                Ok(content) => return Ok(content),
                Err(e) if e.is_retryable() && attempt < config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Completion failed, retrying ({}/{}): {}",
                        attempt,
                        config.max_retries,
                        e
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => {
                    tracing::error!("Completion failed after {} attempt(s): {}", attempt + 1, e);
                    return Err(anyhow!(e));
                }
            }
        }
    }

    fn count_tokens(&self, text: &str) -> Option<usize> {
        self.tokenizer
            .as_ref()
            .map(|bpe| bpe.encode_with_special_tokens(text).len())
    }
}

#[async_trait]
impl TranscriptionProvider for OpenAiProvider {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, Error> {
        let text = transcription(
            &self.client,
            audio,
            &self.transcription_model,
            &self.api_hostname,
            &self.api_key,
        )
        .await?;
        Ok(text)
    }
}
