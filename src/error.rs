//! Error handling and custom error types
//!
//! `Error` covers credentials and the HTTP layer. `DispatchError`
//! is the closed set of outcomes a prompt dispatch can fail with; its messages
//! are what ends up in the output buffer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    AiProvider(String),

    #[error("{0}")]
    NoResponse(String),

    #[error("Credentials error: {0}")]
    Credentials(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single chat or image dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Empty prompt")]
    EmptyPrompt,

    #[error("openAI not initialized")]
    ServiceUnavailable,

    #[error("No response received")]
    NoResponse,

    #[error("{0}")]
    RequestFailed(String),

    /// Superseded before the outbound call finished. Never shown to the user.
    #[error("Request cancelled")]
    Cancelled,
}

impl From<Error> for DispatchError {
    fn from(err: Error) -> Self {
        match err {
            Error::NoResponse(_) => DispatchError::NoResponse,
            other => DispatchError::RequestFailed(other.to_string()),
        }
    }
}
