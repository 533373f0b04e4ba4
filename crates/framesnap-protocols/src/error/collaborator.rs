//! Errors raised by DOM, outline and focus collaborators.

use thiserror::Error;

use super::SessionError;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Frame not found: {0}")]
    FrameNotFound(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
