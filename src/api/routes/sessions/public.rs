//! Public types for the chat sessions API
use serde::{Deserialize, Serialize};

use crate::ai::character::Character;
use crate::ai::chat::Message;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
    // Optionally start with a character already selected
    pub character: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub user_id: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: Option<String>,
    pub character: Option<Character>,
    pub transcript: Vec<Message>,
}

#[derive(Deserialize)]
pub struct SelectCharacterRequest {
    pub name: String,
    pub custom_prompt: Option<String>,
}

#[derive(Serialize)]
pub struct SelectCharacterResponse {
    pub character: Character,
    pub history_cleared: bool,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    message: String,
}

impl ChatResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct AudioChatResponse {
    pub transcript: String,
    pub message: String,
}
