//! Router for the chat sessions API

use std::sync::{Arc, RwLock};

use anyhow::anyhow;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use super::public;
use crate::ai::chat::UserInput;
use crate::api::public::ApiError;
use crate::api::state::{AppState, SharedSession};

type SharedState = Arc<RwLock<AppState>>;

// Speech-to-text APIs accept files up to 25MB
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

fn find_session(state: &SharedState, id: &str) -> Result<SharedSession, ApiError> {
    let shared_state = state
        .read()
        .map_err(|_| anyhow!("Unable to read shared state"))?;
    Ok(shared_state.find_session(id)?)
}

/// Start a new chat session for a user
async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<public::CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut shared_state = state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?;
    let session = shared_state.build_session(&payload.user_id, payload.character.as_deref())?;
    let session_id = session.thread_id().to_string();
    let user_id = session.user_id().unwrap_or_default().to_string();
    shared_state.insert_session(session);

    tracing::info!("Created chat session {} for {}", session_id, user_id);

    Ok((
        StatusCode::CREATED,
        Json(public::CreateSessionResponse {
            session_id,
            user_id,
        }),
    ))
}

/// Get a single chat session and its transcript
async fn session_view(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::SessionResponse>, ApiError> {
    let session = find_session(&state, &id)?;
    let session = session.lock().await;

    Ok(Json(public::SessionResponse {
        session_id: session.thread_id().to_string(),
        user_id: session.user_id().map(String::from),
        character: session.active_character().cloned(),
        transcript: session.history().to_vec(),
    }))
}

/// End a chat session, dropping its history
async fn session_delete(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .write()
        .map_err(|_| anyhow!("Unable to write shared state"))?
        .remove_session(&id)?;

    tracing::info!("Deleted chat session {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Select the character to chat with, optionally defining a custom one
async fn select_character(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<public::SelectCharacterRequest>,
) -> Result<Json<public::SelectCharacterResponse>, ApiError> {
    let session = find_session(&state, &id)?;
    let mut session = session.lock().await;

    let history_cleared =
        session.select_character(&payload.name, payload.custom_prompt.as_deref())?;
    // Selection succeeded so there is always an active character
    let character = session
        .active_character()
        .cloned()
        .ok_or(anyhow!("No active character after selection"))?;

    Ok(Json(public::SelectCharacterResponse {
        character,
        history_cleared,
    }))
}

/// Send the next message in the conversation and wait for the reply
async fn chat_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<public::ChatRequest>,
) -> Result<Json<public::ChatResponse>, ApiError> {
    let session = find_session(&state, &id)?;
    let mut session = session.lock().await;

    let outcome = session
        .handle_turn(UserInput::Text(payload.message))
        .await?;
    tracing::debug!("Session {} replied with {} chars", id, outcome.reply.len());

    Ok(Json(public::ChatResponse::new(&outcome.reply)))
}

/// Send a recorded audio clip as the next message
async fn audio_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<public::AudioChatResponse>, ApiError> {
    let session = find_session(&state, &id)?;
    let mut session = session.lock().await;

    let outcome = session
        .handle_turn(UserInput::Audio(body.to_vec()))
        .await?;

    Ok(Json(public::AudioChatResponse {
        transcript: outcome.user_text,
        message: outcome.reply,
    }))
}

/// Create the chat sessions router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(create_session))
        .route("/{id}", get(session_view).delete(session_delete))
        .route("/{id}/character", put(select_character))
        .route("/{id}/messages", post(chat_handler))
        .route(
            "/{id}/audio",
            post(audio_handler).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
}
