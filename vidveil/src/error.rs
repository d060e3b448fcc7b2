//! Application-wide error types.

use engines_parser::EngineError;
use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("missing query parameter")]
    MissingQuery,

    #[error("query is empty after bang extraction")]
    EmptyQuery,

    #[error("engine '{0}' not found")]
    UnknownEngine(String),

    #[error("invalid thumbnail url: {0}")]
    ThumbnailInvalid(String),

    #[error("thumbnail upstream returned {0}")]
    ThumbnailUpstream(u16),

    #[error("streaming delivery failed: {0}")]
    Streaming(String),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<engines_parser::QueryError> for Error {
    fn from(err: engines_parser::QueryError) -> Self {
        match err {
            engines_parser::QueryError::EmptyQuery => Error::EmptyQuery,
        }
    }
}
