use thiserror::Error;

/// Result type for rate limiting operations
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Errors that can occur while configuring or consulting a limiter
///
/// Exceeding the limit is not an error: `Limiter::pass` reports it as `Ok(false)`.
/// Every variant here means the decision is indeterminate.
#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Invalid rate limiter configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Unexpected store reply: {0}")]
    Decode(String),

    #[error("Clock instant is outside the representable nanosecond range")]
    TimeError,
}
