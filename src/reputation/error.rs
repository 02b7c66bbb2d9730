use thiserror::Error;

/// Failure of a single reputation lookup. The cache records any of these as
/// "reputation unavailable"; none of them reaches the caller as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReputationError {
    #[error("invalid IP address format: {0}")]
    InvalidIp(String),
    #[error("reputation lookup timed out")]
    Timeout,
    #[error("HTTP request failed: {0}")]
    Transport(String),
    #[error("reputation provider rate limit reached")]
    RateLimited,
    #[error("API error: {status}")]
    Http { status: u16 },
    #[error("failed to parse response: {0}")]
    Decode(String),
    #[error("reputation provider API key is missing")]
    MissingApiKey,
}
