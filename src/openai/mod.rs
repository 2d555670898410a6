mod core;
pub use self::core::{
    OpenAiProvider, RequestError, WireMessage, completion, payload_messages, transcription,
};
