//! Public types for the characters API
use serde::Serialize;

use crate::ai::character::Character;

#[derive(Serialize)]
pub struct CharactersResponse {
    pub characters: Vec<Character>,
}
