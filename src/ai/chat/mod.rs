mod core;
pub mod error;
pub mod models;
pub mod trim;

pub use self::core::{
    BoxedCompletionProvider, BoxedTranscriptionProvider, CompletionProvider,
    ConversationSession, ModelConfig, SessionBuilder, TranscriptionProvider, TurnOutcome,
};
pub use error::ChatError;
pub use models::{Message, Role, Transcript, UserInput};
