pub mod character;
pub mod chat;
pub mod prompt;
