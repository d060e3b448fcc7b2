use thiserror::Error;

/// Errors produced while querying an upstream engine.
///
/// Variants map one-to-one onto the transport failure classes the retry loop
/// and the circuit breaker care about; [`EngineError::is_retryable`] is the
/// single source of truth for which classes are worth another attempt.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("temporary transport error: {0}")]
    Temporary(String),
    #[error("upstream returned {0}")]
    ServerError(u16),
    #[error("rate limited by upstream")]
    RateLimited,
    #[error("upstream returned {0}")]
    PermanentHttp(u16),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("circuit open")]
    CircuitOpen,
    #[error("cancelled")]
    Cancelled,
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Classify a reqwest transport error.
    ///
    /// Timeouts and connection-level failures are retryable; body/decode
    /// failures are treated as temporary since they usually indicate a
    /// connection dropped mid-response.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EngineError::Timeout
        } else if e.is_connect() {
            EngineError::Network(e.to_string())
        } else if e.is_body() || e.is_decode() || e.is_request() {
            EngineError::Temporary(e.to_string())
        } else {
            EngineError::Other(e.to_string())
        }
    }

    /// Classify an HTTP status line. `None` means the status is acceptable.
    pub fn from_status(status: reqwest::StatusCode) -> Option<Self> {
        if status.as_u16() == 429 {
            Some(EngineError::RateLimited)
        } else if status.is_server_error() {
            Some(EngineError::ServerError(status.as_u16()))
        } else if status.is_client_error() {
            Some(EngineError::PermanentHttp(status.as_u16()))
        } else {
            None
        }
    }

    /// Whether the retry loop should attempt the request again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Timeout
                | EngineError::Network(_)
                | EngineError::Temporary(_)
                | EngineError::ServerError(_)
                | EngineError::RateLimited
        )
    }

    /// Machine-readable failure reason, as reported in `engines_failed`.
    pub fn reason(&self) -> &'static str {
        match self {
            EngineError::Timeout => "timeout",
            EngineError::RateLimited => "rate_limit",
            EngineError::Parse(_) => "parse_error",
            EngineError::CircuitOpen => "circuit_open",
            EngineError::Network(_) | EngineError::Temporary(_) => "network",
            _ => "other",
        }
    }
}
