//! Persisted document error types

use thiserror::Error;

/// Document decoding and encoding errors
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document matches none of the known shapes
    #[error("Unknown document format")]
    UnrecognizedShape,

    /// An element record is missing required data
    #[error("Invalid element: {0}")]
    InvalidElement(String),

    /// The style settings block could not be decoded
    #[error("Invalid style settings: {0}")]
    InvalidStyleSettings(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Check if the document itself is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DocumentError::UnrecognizedShape
                | DocumentError::InvalidElement(_)
                | DocumentError::InvalidStyleSettings(_)
                | DocumentError::Serialization(_)
        )
    }

    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            DocumentError::UnrecognizedShape => "UNRECOGNIZED_SHAPE",
            DocumentError::InvalidElement(_) => "INVALID_ELEMENT",
            DocumentError::InvalidStyleSettings(_) => "INVALID_STYLE_SETTINGS",
            DocumentError::Serialization(_) => "SERIALIZATION_ERROR",
            DocumentError::Io(_) => "IO_ERROR",
        }
    }
}
