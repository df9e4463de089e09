use thiserror::Error;

/// Errors produced while capturing, extracting, rendering or saving a conversation
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Failed to parse DOM snapshot: {0}")]
    DomParseFailed(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The page yielded no recognizable messages
    #[error("Empty conversation: no messages were found on the page")]
    EmptyConversation,

    #[error("PDF rendering failed: {0}")]
    Rendering(String),

    #[error("An export is already in progress")]
    ExportInProgress,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_selector_message() {
        let err = ExportError::InvalidSelector {
            selector: "div >".to_string(),
            reason: "dangling combinator".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid selector 'div >': dangling combinator");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ExportError = io.into();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
