//! API routes module

pub mod characters;
pub mod sessions;

use std::sync::{Arc, RwLock};

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Character catalog routes
        .nest("/characters", characters::router())
        // Chat session routes
        .nest("/sessions", sessions::router())
}
