//! Import error types
//!
//! Validation variants are raised before any graph mutation happens, so a
//! failed import never leaves a partially imported table behind.

use thiserror::Error;

/// Import pipeline and tabular reading errors
#[derive(Error, Debug)]
pub enum ImportError {
    /// A required column role has not been assigned
    #[error("Please select a {0} column")]
    MissingRole(String),

    /// A single-valued role was assigned to more than one column
    #[error("Only one column may have the {role} role (columns {first} and {second})")]
    DuplicateRole {
        /// Role name
        role: String,
        /// First column index carrying the role
        first: usize,
        /// Second column index carrying the role
        second: usize,
    },

    /// A role is not valid for this kind of table
    #[error("Role {role} is not allowed in a {table} table")]
    RoleNotAllowed {
        /// Role name
        role: String,
        /// Table kind ("edge" or "node")
        table: String,
    },

    /// Role assignment references a column the table does not have
    #[error("Column index {index} is out of range ({width} columns)")]
    ColumnOutOfRange {
        /// Offending column index
        index: usize,
        /// Number of header columns
        width: usize,
    },

    /// An attribute column is named after an element field
    #[error("Column {index} ('{name}') cannot be an attribute, '{name}' is a reserved element field")]
    ReservedAttributeName {
        /// Header of the column
        name: String,
        /// Column index
        index: usize,
    },

    /// The table has no header row
    #[error("Empty table: {0}")]
    EmptyTable(String),

    /// File extension is not a supported tabular format
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Spreadsheet workbook could not be read
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Check if this error was caused by user configuration or input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ImportError::MissingRole(_)
                | ImportError::DuplicateRole { .. }
                | ImportError::RoleNotAllowed { .. }
                | ImportError::ColumnOutOfRange { .. }
                | ImportError::ReservedAttributeName { .. }
                | ImportError::EmptyTable(_)
                | ImportError::UnsupportedFormat(_)
        )
    }

    /// Check if this is a role assignment validation failure
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ImportError::MissingRole(_)
                | ImportError::DuplicateRole { .. }
                | ImportError::RoleNotAllowed { .. }
                | ImportError::ColumnOutOfRange { .. }
                | ImportError::ReservedAttributeName { .. }
        )
    }

    /// Get error code for reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportError::MissingRole(_) => "MISSING_ROLE",
            ImportError::DuplicateRole { .. } => "DUPLICATE_ROLE",
            ImportError::RoleNotAllowed { .. } => "ROLE_NOT_ALLOWED",
            ImportError::ColumnOutOfRange { .. } => "COLUMN_OUT_OF_RANGE",
            ImportError::ReservedAttributeName { .. } => "RESERVED_ATTRIBUTE_NAME",
            ImportError::EmptyTable(_) => "EMPTY_TABLE",
            ImportError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            ImportError::Spreadsheet(_) => "SPREADSHEET_ERROR",
            ImportError::Csv(_) => "CSV_ERROR",
            ImportError::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        let err = ImportError::DuplicateRole {
            role: "source".to_string(),
            first: 0,
            second: 2,
        };
        assert!(err.is_client_error());
        assert!(err.is_validation_error());
        assert_eq!(
            err.to_string(),
            "Only one column may have the source role (columns 0 and 2)"
        );
    }

    #[test]
    fn test_io_error_is_not_validation() {
        let err: ImportError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!err.is_validation_error());
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
