use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::ai::chat::{
    BoxedCompletionProvider, BoxedTranscriptionProvider, ChatError, ConversationSession,
};
use crate::core::AppConfig;

/// Each session gets its own lock so turns for one user never block
/// another and turns within a session run one at a time.
///
/// Sessions live in memory until a client deletes them. There is no idle
/// eviction, so abandoned sessions are only freed when the process exits.
pub type SharedSession = Arc<Mutex<ConversationSession>>;

#[derive(Debug, thiserror::Error)]
#[error("Chat session {0} not found")]
pub struct SessionNotFound(pub String);

pub struct AppState {
    pub config: AppConfig,
    completion: BoxedCompletionProvider,
    transcription: Option<BoxedTranscriptionProvider>,
    // Only shrinks on `remove_session`
    sessions: HashMap<Uuid, SharedSession>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        completion: BoxedCompletionProvider,
        transcription: Option<BoxedTranscriptionProvider>,
    ) -> Self {
        Self {
            config,
            completion,
            transcription,
            sessions: HashMap::new(),
        }
    }

    /// Builds a session for `user_id` using the deployment's settings.
    /// Nothing is stored until `insert_session` is called.
    pub fn build_session(
        &self,
        user_id: &str,
        character: Option<&str>,
    ) -> Result<ConversationSession, ChatError> {
        let mut builder = ConversationSession::builder(self.completion.clone())
            .token_budget(self.config.token_budget)
            .structured_persona(self.config.structured_persona)
            .model_config(self.config.model_config())
            .user(user_id);
        if let Some(transcription) = &self.transcription {
            builder = builder.transcription(transcription.clone());
        }
        if let Some(name) = character {
            builder = builder.character(name);
        }
        builder.build()
    }

    pub fn insert_session(&mut self, session: ConversationSession) -> SharedSession {
        let id = session.thread_id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone());
        shared
    }

    pub fn find_session(&self, id: &str) -> Result<SharedSession, SessionNotFound> {
        Uuid::parse_str(id)
            .ok()
            .and_then(|uuid| self.sessions.get(&uuid))
            .cloned()
            .ok_or_else(|| SessionNotFound(id.to_string()))
    }

    pub fn remove_session(&mut self, id: &str) -> Result<(), SessionNotFound> {
        Uuid::parse_str(id)
            .ok()
            .and_then(|uuid| self.sessions.remove(&uuid))
            .map(|_| ())
            .ok_or_else(|| SessionNotFound(id.to_string()))
    }
}
