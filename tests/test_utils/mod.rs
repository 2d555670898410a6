//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use anyhow::{Result, bail};
use async_trait::async_trait;
use axum::{Router, body::Body};

use charchat::ai::chat::{CompletionProvider, Message, ModelConfig, TranscriptionProvider};
use charchat::api::AppState;
use charchat::api::app;
use charchat::core::AppConfig;

/// Replies by echoing the last message it was sent. Any message
/// containing "fail" makes the call fail like an unavailable API.
pub struct EchoProvider;

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn complete(
        &self,
        system_message: &str,
        messages: &[Message],
        _config: &ModelConfig,
    ) -> Result<String> {
        let Some(last) = messages.last() else {
            return Ok(format!("({}) ...", system_message.len()));
        };
        if last.content.contains("fail") {
            bail!("Service unavailable");
        }
        Ok(format!("echo: {}", last.content))
    }
}

pub struct FixedTranscriber;

#[async_trait]
impl TranscriptionProvider for FixedTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        if audio == b"silence" {
            return Ok(String::new());
        }
        Ok("what's cooking".to_string())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        api_hostname: String::from("http://localhost:9999"),
        api_key: String::from("test-api-key"),
        model: String::from("llama-3.3-70b-versatile"),
        temperature: 0.4,
        max_retries: 0,
        token_budget: 10_000,
        structured_persona: false,
        transcription_model: String::from("whisper-large-v3"),
    }
}

/// Creates a test application router backed by in-process providers.
pub fn test_app() -> Router {
    let app_state = AppState::new(
        test_config(),
        Arc::new(EchoProvider),
        Some(Arc::new(FixedTranscriber)),
    );
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf8")
}
