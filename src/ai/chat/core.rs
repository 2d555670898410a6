use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use uuid::Uuid;

use super::error::{ChatError, Result};
use super::models::{Message, Role, Transcript, UserInput};
use super::trim::{DEFAULT_TOKEN_BUDGET, TokenCounter, WhitespaceTokenCounter, apply_trim_policy};
use crate::ai::character::{Character, CharacterCatalog};
use crate::ai::prompt::SystemPromptRenderer;

/// Settings passed through to the completion provider on every call.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: String::from("llama-3.3-70b-versatile"),
            temperature: 0.4,
            max_retries: 2,
        }
    }
}

/// Produces the next assistant message. Retries and timeouts are the
/// provider's concern, a session never retries on its own.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system_message: &str,
        messages: &[Message],
        config: &ModelConfig,
    ) -> AnyResult<String>;

    /// Token count using the provider's own tokenizer. Returns `None`
    /// when the provider doesn't have one.
    fn count_tokens(&self, _text: &str) -> Option<usize> {
        None
    }
}

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> AnyResult<String>;
}

pub type BoxedCompletionProvider = Arc<dyn CompletionProvider>;
pub type BoxedTranscriptionProvider = Arc<dyn TranscriptionProvider>;

// Prefer the provider's tokenizer and fall back to counting words
struct ProviderTokenCounter<'a> {
    provider: &'a dyn CompletionProvider,
}

impl TokenCounter for ProviderTokenCounter<'_> {
    fn count_tokens(&self, text: &str) -> usize {
        self.provider
            .count_tokens(text)
            .unwrap_or_else(|| WhitespaceTokenCounter.count_tokens(text))
    }
}

/// The result of a single turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// What was submitted as the user's message. For audio input this
    /// is the transcription.
    pub user_text: String,
    pub reply: String,
}

/// One linear, append-only conversation between a user and a
/// character.
///
/// Operations take `&mut self` so callers that share a session
/// between tasks need to serialize access themselves, e.g. with a
/// `tokio::sync::Mutex` per session.
///
/// Use `ConversationSession::builder()` to construct a session.
pub struct ConversationSession {
    thread_id: Uuid,
    user_id: Option<String>,
    catalog: CharacterCatalog,
    active_character: Option<Character>,
    transcript: Transcript,
    renderer: SystemPromptRenderer,
    token_budget: usize,
    model_config: ModelConfig,
    completion: BoxedCompletionProvider,
    transcription: Option<BoxedTranscriptionProvider>,
}

impl ConversationSession {
    pub fn builder(completion: BoxedCompletionProvider) -> SessionBuilder {
        SessionBuilder::new(completion)
    }

    pub fn thread_id(&self) -> Uuid {
        self.thread_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn active_character(&self) -> Option<&Character> {
        self.active_character.as_ref()
    }

    pub fn history(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn catalog(&self) -> &CharacterCatalog {
        &self.catalog
    }

    /// Sets the user once. Later calls are ignored.
    pub fn set_user(&mut self, id: &str) -> Result<()> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ChatError::InvalidInput("Username is required".to_string()));
        }
        if self.user_id.is_none() {
            tracing::debug!("Session {} user set to {}", self.thread_id, id);
            self.user_id = Some(id.to_string());
        }
        Ok(())
    }

    /// Makes `name` the active character. A name that is already in
    /// the catalog always wins and `custom_prompt` is ignored, otherwise
    /// a non-blank `custom_prompt` registers a new custom character.
    /// Returns `true` when this started a new conversation (history was
    /// cleared).
    pub fn select_character(&mut self, name: &str, custom_prompt: Option<&str>) -> Result<bool> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidInput(
                "Character name is required".to_string(),
            ));
        }
        let custom_prompt = custom_prompt.map(str::trim).filter(|p| !p.is_empty());

        let next = if let Some(existing) = self.catalog.resolve(name) {
            existing.clone()
        } else if let Some(prompt) = custom_prompt {
            self.catalog.register_custom(name, prompt)?.clone()
        } else {
            return Err(ChatError::InvalidInput(format!(
                "Unknown character: {}",
                name
            )));
        };

        // Re-selecting the active character keeps the conversation going
        if self.active_character.as_ref() == Some(&next) {
            return Ok(false);
        }

        let had_history = !self.transcript.is_empty();
        self.transcript.clear();
        tracing::debug!(
            "Session {} switched character to {} (cleared history: {})",
            self.thread_id,
            next.name,
            had_history
        );
        self.active_character = Some(next);

        Ok(true)
    }

    /// The system message for `character` as it will be sent.
    pub fn render_system_prompt(&self, character: &Character) -> Result<String> {
        self.renderer
            .render(character)
            .map_err(|e| ChatError::InvalidState(format!("Failed to render system prompt: {}", e)))
    }

    /// History that would be sent with the next call, after trimming.
    pub fn effective_history(&self, system_message: &str) -> &[Message] {
        let counter = ProviderTokenCounter {
            provider: self.completion.as_ref(),
        };
        let system_cost = counter.count_tokens(system_message);
        apply_trim_policy(
            self.transcript.messages(),
            self.token_budget,
            system_cost,
            &counter,
        )
    }

    /// Runs the next turn of the conversation.
    ///
    /// The user's message is appended before calling the provider and
    /// the reply only after it succeeds. If the provider fails, or
    /// this future is dropped before it resolves, the history ends
    /// with the user's message so a retry picks up from there.
    /// Submitting that same text again resends the dangling turn.
    pub async fn submit_user_turn(&mut self, text: &str) -> Result<String> {
        if self.user_id.is_none() {
            return Err(ChatError::InvalidState(
                "A username must be set before chatting".to_string(),
            ));
        }
        let character = self.active_character.clone().ok_or_else(|| {
            ChatError::InvalidState("A character must be selected before chatting".to_string())
        })?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::InvalidInput("Message is empty".to_string()));
        }

        let system_message = self.render_system_prompt(&character)?;

        // A failed turn leaves the user's message dangling at the end of
        // the history. Sending the same text again retries that turn
        // instead of repeating it.
        let is_retry = self
            .transcript
            .messages()
            .last()
            .is_some_and(|m| m.role == Role::User && m.content == text);
        if is_retry {
            tracing::debug!("Session {} retrying last turn", self.thread_id);
        } else {
            self.transcript.push(Role::User, text);
        }

        let messages = self.effective_history(&system_message);
        tracing::debug!(
            "Session {} sending {} of {} messages as {}",
            self.thread_id,
            messages.len(),
            self.transcript.len(),
            character.name
        );

        let reply = self
            .completion
            .complete(&system_message, messages, &self.model_config)
            .await
            .map_err(ChatError::provider)?;

        if reply.trim().is_empty() {
            return Err(ChatError::Provider("No message received".to_string()));
        }

        self.transcript.push(Role::Assistant, &reply);
        Ok(reply)
    }

    /// Handles the next input from a UI surface. Audio is transcribed
    /// first and then submitted like typed text.
    pub async fn handle_turn(&mut self, input: UserInput) -> Result<TurnOutcome> {
        let user_text = match input {
            UserInput::Text(text) => text,
            UserInput::Audio(audio) => self.transcribe(&audio).await?,
        };
        let reply = self.submit_user_turn(&user_text).await?;
        Ok(TurnOutcome {
            user_text: user_text.trim().to_string(),
            reply,
        })
    }

    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let transcriber = self.transcription.as_ref().ok_or_else(|| {
            ChatError::InvalidState("Audio input is not enabled".to_string())
        })?;
        if audio.is_empty() {
            return Err(ChatError::InvalidInput("Audio is empty".to_string()));
        }
        let text = transcriber
            .transcribe(audio)
            .await
            .map_err(ChatError::provider)?;
        if text.trim().is_empty() {
            return Err(ChatError::InvalidInput(
                "No speech found in audio".to_string(),
            ));
        }
        Ok(text)
    }
}

pub struct SessionBuilder {
    completion: BoxedCompletionProvider,
    transcription: Option<BoxedTranscriptionProvider>,
    catalog: CharacterCatalog,
    token_budget: usize,
    structured_persona: bool,
    model_config: ModelConfig,
    user_id: Option<String>,
    character: Option<String>,
}

impl SessionBuilder {
    pub fn new(completion: BoxedCompletionProvider) -> Self {
        Self {
            completion,
            transcription: None,
            catalog: CharacterCatalog::builtin(),
            token_budget: DEFAULT_TOKEN_BUDGET,
            structured_persona: false,
            model_config: ModelConfig::default(),
            user_id: None,
            character: None,
        }
    }

    pub fn build(self) -> Result<ConversationSession> {
        let renderer = SystemPromptRenderer::new(self.structured_persona)
            .map_err(|e| ChatError::InvalidState(format!("Failed to load templates: {}", e)))?;
        let mut session = ConversationSession {
            thread_id: Uuid::new_v4(),
            user_id: None,
            catalog: self.catalog,
            active_character: None,
            transcript: Transcript::new(),
            renderer,
            token_budget: self.token_budget,
            model_config: self.model_config,
            completion: self.completion,
            transcription: self.transcription,
        };
        if let Some(user_id) = self.user_id {
            session.set_user(&user_id)?;
        }
        if let Some(name) = self.character {
            session.select_character(&name, None)?;
        }
        Ok(session)
    }

    pub fn transcription(mut self, transcription: BoxedTranscriptionProvider) -> Self {
        self.transcription = Some(transcription);
        self
    }

    pub fn token_budget(mut self, budget: usize) -> Self {
        self.token_budget = budget;
        self
    }

    pub fn structured_persona(mut self, structured: bool) -> Self {
        self.structured_persona = structured;
        self
    }

    pub fn model_config(mut self, config: ModelConfig) -> Self {
        self.model_config = config;
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn character(mut self, name: &str) -> Self {
        self.character = Some(name.to_string());
        self
    }
}
