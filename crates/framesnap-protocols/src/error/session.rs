//! Session (transport) errors.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("No session owns frame: {0}")]
    FrameNotAttached(String),

    #[error("Protocol error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Session closed")]
    Closed,

    #[error("Call cancelled: {0}")]
    Cancelled(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
