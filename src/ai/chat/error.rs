/// Result type for conversation session operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Every failure leaves the session in a resumable state.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChatError {
    /// Bad user supplied input e.g. a blank username or message
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An operation was attempted before its prerequisites were met
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The completion or transcription provider failed
    #[error("Provider error: {0}")]
    Provider(String),
}

impl ChatError {
    pub fn provider(err: anyhow::Error) -> Self {
        // Keep the whole chain so the root cause isn't lost
        Self::Provider(format!("{:#}", err))
    }
}
