//! Typed element attribute values.
//!
//! Attribute bags hold a closed set of value shapes. Conversions to numbers
//! follow the lenient prefix parsing the import dialog has always used:
//! `"12px"` reads as `12`, `"abc"` reads as nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(Infinity|[0-9]+\.?[0-9]*(?:[eE][+-]?[0-9]+)?|\.[0-9]+(?:[eE][+-]?[0-9]+)?)")
        .expect("float prefix pattern is valid")
});

static INT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+").expect("int prefix pattern is valid"));

/// A single attribute value attached to a node or edge.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Convert a decoded JSON value. `null` has no attribute representation.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(AttributeValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(AttributeValue::Int(i)),
                None => n.as_f64().map(AttributeValue::Float),
            },
            Value::String(s) => Some(AttributeValue::String(s.clone())),
            Value::Array(items) => Some(AttributeValue::Array(
                items.iter().filter_map(AttributeValue::from_json).collect(),
            )),
            Value::Object(_) => Some(AttributeValue::String(value.to_string())),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// True for values that count as "no data" in a column: the empty string.
    pub fn is_blank(&self) -> bool {
        matches!(self, AttributeValue::String(s) if s.is_empty())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, AttributeValue::Int(_) | AttributeValue::Float(_))
    }

    /// Numeric reading of the value, `None` when it does not start with a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Int(i) => Some(*i as f64),
            AttributeValue::Float(f) if f.is_nan() => None,
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Bool(_) => None,
            AttributeValue::String(s) => parse_float_prefix(s),
            AttributeValue::Array(_) => parse_float_prefix(&self.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Ordering used for distinct value listings: numbers compare numerically,
    /// everything else by its string form.
    pub fn display_cmp(&self, other: &AttributeValue) -> Ordering {
        match (self.is_number(), other.is_number()) {
            (true, true) => {
                let a = self.as_f64().unwrap_or(0.0);
                let b = other.as_f64().unwrap_or(0.0);
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(i) => write!(f, "{}", i),
            AttributeValue::Float(v) => write!(f, "{}", v),
            AttributeValue::String(s) => write!(f, "{}", s),
            AttributeValue::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Int(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// Parse the longest leading floating point literal, ignoring leading whitespace.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let trimmed = s.trim_start();
    let m = FLOAT_PREFIX.find(trimmed)?;
    let literal = m.as_str();
    match literal.trim_start_matches(['+', '-']) {
        "Infinity" if literal.starts_with('-') => Some(f64::NEG_INFINITY),
        "Infinity" => Some(f64::INFINITY),
        _ => literal.parse::<f64>().ok(),
    }
}

/// Parse the leading base-10 integer, ignoring leading whitespace.
pub fn parse_int_prefix(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let m = INT_PREFIX.find(trimmed)?;
    m.as_str().parse::<i64>().ok()
}

/// Leading integer as a value. Digits beyond the `i64` range still parse,
/// as a float that keeps the magnitude.
pub fn parse_integer_value(s: &str) -> Option<AttributeValue> {
    let m = INT_PREFIX.find(s.trim_start())?;
    match m.as_str().parse::<i64>() {
        Ok(i) => Some(AttributeValue::Int(i)),
        Err(_) => m.as_str().parse::<f64>().ok().map(AttributeValue::Float),
    }
}
