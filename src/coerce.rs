//! Type coercion for raw table cells.
//!
//! Every function here is total: a cell that does not fit its declared type
//! becomes `None` (scalars) or is dropped from the sequence (arrays). Nothing
//! in this module returns an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::trace;

use crate::value::{parse_float_prefix, parse_integer_value, AttributeValue};

/// Delimiter used to split array cells when none is configured.
pub const DEFAULT_DELIMITER: &str = "|";

static INTEGER_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+$").expect("integer cell pattern is valid"));

/// Declared type of an attribute column.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DeclaredType {
    #[default]
    #[serde(rename = "string")]
    String,
    /// Base-10 integer
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "string[]")]
    StringArray,
    #[serde(rename = "number[]")]
    NumberArray,
    #[serde(rename = "float[]")]
    FloatArray,
    #[serde(rename = "boolean[]")]
    BooleanArray,
}

impl DeclaredType {
    pub const ALL: [DeclaredType; 8] = [
        DeclaredType::String,
        DeclaredType::Number,
        DeclaredType::Float,
        DeclaredType::Boolean,
        DeclaredType::StringArray,
        DeclaredType::NumberArray,
        DeclaredType::FloatArray,
        DeclaredType::BooleanArray,
    ];

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            DeclaredType::StringArray
                | DeclaredType::NumberArray
                | DeclaredType::FloatArray
                | DeclaredType::BooleanArray
        )
    }

    /// Scalar type of the elements of an array type; scalars map to themselves.
    pub fn element_type(&self) -> DeclaredType {
        match self {
            DeclaredType::StringArray => DeclaredType::String,
            DeclaredType::NumberArray => DeclaredType::Number,
            DeclaredType::FloatArray => DeclaredType::Float,
            DeclaredType::BooleanArray => DeclaredType::Boolean,
            scalar => *scalar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeclaredType::String => "string",
            DeclaredType::Number => "number",
            DeclaredType::Float => "float",
            DeclaredType::Boolean => "boolean",
            DeclaredType::StringArray => "string[]",
            DeclaredType::NumberArray => "number[]",
            DeclaredType::FloatArray => "float[]",
            DeclaredType::BooleanArray => "boolean[]",
        }
    }

    /// Human readable label shown next to the type selector.
    pub fn label(&self) -> &'static str {
        match self {
            DeclaredType::String => "String",
            DeclaredType::Number => "Integer",
            DeclaredType::Float => "Float",
            DeclaredType::Boolean => "Y/N (Boolean)",
            DeclaredType::StringArray => "String Array",
            DeclaredType::NumberArray => "Integer Array",
            DeclaredType::FloatArray => "Float Array",
            DeclaredType::BooleanArray => "Boolean Array",
        }
    }
}

impl Display for DeclaredType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeclaredType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeclaredType::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown data type '{}'", s))
    }
}

/// Interpret a yes/no style cell. Anything outside the two vocabularies is `None`.
pub fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" => Some(true),
        "n" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn coerce_scalar(raw: &str, declared: DeclaredType) -> Option<AttributeValue> {
    match declared {
        DeclaredType::Number => parse_integer_value(raw),
        DeclaredType::Float => parse_float_prefix(raw).map(AttributeValue::Float),
        DeclaredType::Boolean => parse_boolean(raw).map(AttributeValue::Bool),
        _ => Some(AttributeValue::String(raw.to_string())),
    }
}

/// Convert a raw cell into a typed value.
///
/// Empty cells are absent for scalar types and an empty sequence for array
/// types. Array types split on `delimiter`
/// (falling back to [`DEFAULT_DELIMITER`] when empty), trim each segment and
/// drop segments that are blank or fail scalar coercion.
pub fn coerce(raw: &str, declared: DeclaredType, delimiter: &str) -> Option<AttributeValue> {
    if !declared.is_array() {
        if raw.is_empty() {
            return None;
        }
        let value = coerce_scalar(raw, declared);
        if value.is_none() {
            trace!("Cell {:?} does not coerce to {}", raw, declared);
        }
        return value;
    }

    let delimiter = if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    };
    let element_type = declared.element_type();
    let items = raw
        .split(delimiter)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| coerce_scalar(segment, element_type))
        .collect();

    Some(AttributeValue::Array(items))
}

/// Optional-cell convenience used by the import pipeline.
pub fn coerce_cell(
    raw: Option<&str>,
    declared: DeclaredType,
    delimiter: &str,
) -> Option<AttributeValue> {
    coerce(raw.unwrap_or(""), declared, delimiter)
}

/// True when every non-blank cell in the column is an optionally negative integer.
pub fn is_column_all_integers(rows: &[Vec<String>], column: usize) -> bool {
    rows.iter()
        .filter_map(|row| row.get(column))
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .all(|cell| INTEGER_CELL.is_match(cell))
}

/// Suggest a declared type for a column. Advisory only: the user can override it.
///
/// A column holding any delimiter-joined multi-value cell (`"a| b"`) is an
/// array column, an all-integer column is `number`, anything else is `string`.
pub fn detect_column_type(rows: &[Vec<String>], column: usize, delimiter: &str) -> DeclaredType {
    let delimiter = if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    };
    let joined = format!("{} ", delimiter);

    let has_multi_value = rows
        .iter()
        .filter_map(|row| row.get(column))
        .any(|cell| cell.contains(&joined));
    if has_multi_value {
        return DeclaredType::StringArray;
    }

    if is_column_all_integers(rows, column) {
        DeclaredType::Number
    } else {
        DeclaredType::String
    }
}
