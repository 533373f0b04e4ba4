//! CDP error types.

use framesnap_protocols::{CollaboratorError, SessionError};
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to Chrome.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Chrome not found or not running with remote debugging.
    #[error("Chrome not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    ChromeNotAvailable(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (for endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    /// No page target matched.
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// JavaScript execution error.
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// Timeout.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Session closed.
    #[error("Session closed")]
    SessionClosed,

    /// Invalid response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for SessionError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::Protocol { code, message } => SessionError::Protocol { code, message },
            CdpError::SessionClosed => SessionError::Closed,
            CdpError::Timeout(method) => SessionError::Cancelled(method),
            CdpError::InvalidResponse(msg) => SessionError::InvalidResponse(msg),
            CdpError::Serialization(err) => SessionError::InvalidResponse(err.to_string()),
            other => SessionError::Transport(other.to_string()),
        }
    }
}

impl From<CdpError> for CollaboratorError {
    fn from(e: CdpError) -> Self {
        match e {
            CdpError::JavaScript(msg) => CollaboratorError::Script(msg),
            CdpError::Serialization(err) => CollaboratorError::Serialization(err),
            other => CollaboratorError::Session(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_maps_to_session_protocol() {
        let err: SessionError = CdpError::Protocol {
            code: -32000,
            message: "No frame for given id found".to_string(),
        }
        .into();
        assert!(matches!(err, SessionError::Protocol { code: -32000, .. }));
    }

    #[test]
    fn test_timeout_maps_to_cancelled() {
        let err: SessionError = CdpError::Timeout("DOM.getDocument".to_string()).into();
        assert!(matches!(err, SessionError::Cancelled(ref m) if m == "DOM.getDocument"));
    }

    #[test]
    fn test_closed_and_transport_mapping() {
        assert!(matches!(SessionError::from(CdpError::SessionClosed), SessionError::Closed));
        let err = SessionError::from(CdpError::WebSocket("reset".to_string()));
        assert!(matches!(err, SessionError::Transport(ref m) if m.contains("reset")));
    }

    #[test]
    fn test_collaborator_mapping() {
        let err: CollaboratorError = CdpError::JavaScript("ReferenceError".to_string()).into();
        assert!(matches!(err, CollaboratorError::Script(_)));

        let err: CollaboratorError = CdpError::SessionClosed.into();
        assert!(matches!(err, CollaboratorError::Session(SessionError::Closed)));
    }

    #[test]
    fn test_chrome_not_available_hint() {
        let err = CdpError::ChromeNotAvailable("http://localhost:9222".to_string());
        assert!(err.to_string().contains("--remote-debugging-port"));
    }
}
