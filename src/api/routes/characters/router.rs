//! Router for the characters API

use std::sync::{Arc, RwLock};

use axum::{Json, Router, routing::get};

use super::public;
use crate::ai::character::CharacterCatalog;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// List the built-in characters. Custom characters only exist within
/// the session that registered them.
async fn character_list() -> Json<public::CharactersResponse> {
    let catalog = CharacterCatalog::builtin();
    Json(public::CharactersResponse {
        characters: catalog.builtins().to_vec(),
    })
}

/// Create the characters router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(character_list))
}
