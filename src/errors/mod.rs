//! Domain-specific error types for vizmap
//!
//! Only structural failures are errors. Cell coercion failures and mapping
//! fallbacks resolve to absent/default values and never surface here.
//!
//! # Error Categories
//!
//! - **ImportError**: column role validation and tabular file reading
//! - **DocumentError**: persisted document recognition and decoding
//! - **StyleError**: mapping rule configuration
//!
//! # Examples
//!
//! ```rust
//! use vizmap::errors::ImportError;
//!
//! let err = ImportError::MissingRole("source".to_string());
//! assert!(err.is_client_error());
//! assert_eq!(err.error_code(), "MISSING_ROLE");
//! ```

pub mod document;
pub mod import;
pub mod style;

pub use document::DocumentError;
pub use import::ImportError;
pub use style::StyleError;

/// Result type alias for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type alias for document encoding/decoding
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Result type alias for style configuration
pub type StyleResult<T> = Result<T, StyleError>;
