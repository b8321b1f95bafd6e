use thiserror::Error;

/// Top-level error type for the filelink runtime.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("nothing registered under {0}")]
    NotFound(String),

    #[error("code {0} is already registered")]
    DuplicateCode(String),

    #[error("a batch needs at least one file")]
    EmptyBatch,

    #[error("not authorized")]
    Unauthorized,

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BotError::Validation(msg.into())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        BotError::Storage(err.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;
