//! Gateway error types

use thiserror::Error;

/// Failure talking to the remote seating service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials rejected; the session must re-authenticate
    #[error("authentication required")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    /// Non-success status other than 401/404
    #[error("request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Body that does not decode as the expected document
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;
