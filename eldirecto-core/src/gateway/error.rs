use std::time::Duration;

use thiserror::Error;

/// Errors returned by a content gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Missing, expired or invalid bearer token (HTTP 401).
    #[error("not authenticated")]
    Unauthorized,

    /// Any other non-success status.
    #[error("gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// HTTP 429, with the server's `Retry-After` when present.
    #[error("too many requests")]
    RateLimited { retry_after: Option<Duration> },

    /// The request never got a response.
    #[error("could not reach gateway: {0}")]
    Transport(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response from gateway: {0}")]
    Malformed(String),
}
