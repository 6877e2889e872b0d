use thiserror::Error;

use crate::engine::SeatingError;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Seating(#[from] SeatingError),

    #[error("authentication expired")]
    AuthExpired,

    #[error("network error: {0}")]
    Network(GatewayError),

    #[error("no reconciliation decision is pending")]
    NoPendingDecision,

    #[error("session is read-only")]
    ReadOnly,

    #[error("session is closed")]
    Closed,

    #[error("invalid event id: {0}")]
    InvalidEvent(&'static str),

    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
}

impl From<GatewayError> for SessionError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Unauthorized => SessionError::AuthExpired,
            other => SessionError::Network(other),
        }
    }
}

impl SessionError {
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Seating(e) => e.kind(),
            SessionError::AuthExpired => "auth_expired",
            SessionError::Network(_) => "network",
            SessionError::NoPendingDecision => "no_pending_decision",
            SessionError::ReadOnly => "read_only",
            SessionError::Closed => "closed",
            SessionError::InvalidEvent(_) => "invalid_event",
            SessionError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
