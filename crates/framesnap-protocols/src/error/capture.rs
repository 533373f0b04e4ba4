//! Capture-level errors. Only total failures surface here; per-frame and
//! per-session failures become diagnostics on the snapshot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("No session could be resolved for any frame")]
    NoSessions,

    #[error("No frame could be captured ({diagnostics} diagnostics recorded)")]
    NothingCaptured { diagnostics: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_page_error() {
        let err = CaptureError::InvalidPage("main frame missing".to_string());
        assert!(err.to_string().contains("main frame missing"));
    }

    #[test]
    fn test_nothing_captured_error() {
        let err = CaptureError::NothingCaptured { diagnostics: 3 };
        assert!(err.to_string().contains("3 diagnostics"));
    }

    #[test]
    fn test_error_debug() {
        let err = CaptureError::NoSessions;
        assert!(format!("{:?}", err).contains("NoSessions"));
    }
}
