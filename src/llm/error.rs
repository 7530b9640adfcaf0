use thiserror::Error;

/// Errors from the chat completion transport.
///
/// A failed call is a different condition than a malformed completion: the
/// engine converts malformed output into a fallback classification, but a
/// transport failure here always surfaces to the caller as a server error.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider returned HTTP 429.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-success HTTP status, with the response body.
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Underlying network failure (DNS, refused connection, timeout).
    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}
