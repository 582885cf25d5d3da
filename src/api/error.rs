use thiserror::Error;

/// Errors surfaced by the authentication API client.
///
/// `Blocked` is its own variant because the login flow treats it as a state
/// transition rather than an inline failure.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("account is blocked")]
    Blocked,
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("unable to reach the server: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("invalid API base URL: {0}")]
    BaseUrl(String),
}
