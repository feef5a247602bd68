//! Style configuration error types

use thiserror::Error;

/// Mapping rule configuration errors
#[derive(Error, Debug)]
pub enum StyleError {
    /// The strategy cannot produce values of the property's kind
    #[error("{strategy} mapping is not supported for {property}")]
    IncompatibleStrategy {
        /// Visual property name
        property: String,
        /// Strategy name
        strategy: String,
    },

    /// The property does not exist for this element kind
    #[error("{property} is not a {kind} property")]
    NotApplicable {
        /// Visual property name
        property: String,
        /// Element kind
        kind: String,
    },

    /// A colour literal could not be parsed as hex
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// A value is outside the property's closed token set
    #[error("Invalid value {value:?} for {property}")]
    InvalidValue {
        /// Visual property name
        property: String,
        /// Rejected value
        value: String,
    },
}

impl StyleError {
    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            StyleError::IncompatibleStrategy { .. } => "INCOMPATIBLE_STRATEGY",
            StyleError::NotApplicable { .. } => "NOT_APPLICABLE",
            StyleError::InvalidColor(_) => "INVALID_COLOR",
            StyleError::InvalidValue { .. } => "INVALID_VALUE",
        }
    }
}
