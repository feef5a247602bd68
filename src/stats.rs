//! Column statistics over the current element set.
//!
//! All functions are pure reads over whatever elements they are handed, so
//! callers pass `backend.nodes()` or `backend.edges()` directly.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::backend::{AttributeSource, ElementKind};
use crate::graph::{Edge, Node, LABEL_KEY};
use crate::value::AttributeValue;

/// Numeric `[min, max]` of a column, always with `max > min`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl Default for NumericRange {
    fn default() -> Self {
        NumericRange { min: 0.0, max: 1.0 }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// Distinct non-empty values of `column`, numbers in numeric order and
/// everything else by string order.
pub fn unique_values<'a, E, I>(elements: I, column: &str) -> Vec<AttributeValue>
where
    E: AttributeSource + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut values: Vec<AttributeValue> = elements
        .into_iter()
        .filter_map(|e| e.attribute(column))
        .filter(|v| !v.is_blank())
        .filter(|v| seen.insert(distinct_key(v)))
        .cloned()
        .collect();
    values.sort_by(|a, b| a.display_cmp(b));
    values
}

// Values that render identically but differ in type stay distinct.
fn distinct_key(value: &AttributeValue) -> String {
    let tag = match value {
        AttributeValue::Bool(_) => 'b',
        AttributeValue::Int(_) | AttributeValue::Float(_) => 'n',
        AttributeValue::String(_) => 's',
        AttributeValue::Array(_) => 'a',
    };
    format!("{}{}", tag, value)
}

/// Numeric range of `column`. Values that do not read as a finite number are
/// ignored; with no numeric values the range is `0..1`, and a single repeated
/// value `v` gives `v..v+1`.
pub fn numeric_range<'a, E, I>(elements: I, column: &str) -> NumericRange
where
    E: AttributeSource + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for value in elements
        .into_iter()
        .filter_map(|e| e.attribute(column))
        .filter_map(AttributeValue::as_f64)
        .filter(|v| v.is_finite())
    {
        min = min.min(value);
        max = max.max(value);
    }

    if min == f64::INFINITY {
        min = 0.0;
    }
    if max == f64::NEG_INFINITY {
        max = 1.0;
    }
    if min == max {
        max = min + 1.0;
    }

    NumericRange { min, max }
}

fn reads_as_number(value: &AttributeValue) -> bool {
    match value {
        AttributeValue::Int(_) => true,
        AttributeValue::Float(f) => f.is_finite(),
        AttributeValue::String(s) => s.trim().parse::<f64>().map_or(false, f64::is_finite),
        _ => false,
    }
}

/// Numeric when every non-empty value is a number or a string that is
/// entirely a finite number. A column with no values is categorical.
pub fn column_kind<'a, E, I>(elements: I, column: &str) -> ColumnKind
where
    E: AttributeSource + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut has_numeric = false;
    for value in elements
        .into_iter()
        .filter_map(|e| e.attribute(column))
        .filter(|v| !v.is_blank())
    {
        if !reads_as_number(value) {
            return ColumnKind::Categorical;
        }
        has_numeric = true;
    }

    if has_numeric {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Keys that identify an element rather than describe it.
pub fn reserved_keys(kind: ElementKind) -> &'static [&'static str] {
    match kind {
        ElementKind::Node => &["id", LABEL_KEY],
        ElementKind::Edge => &["id", "source", "target"],
    }
}

/// Attribute columns a mapping can bind to, sorted by name.
pub fn attribute_columns(nodes: &[Node], edges: &[Edge], kind: ElementKind) -> Vec<String> {
    let reserved = reserved_keys(kind);
    let keys: BTreeSet<&String> = match kind {
        ElementKind::Node => nodes.iter().flat_map(|n| n.attributes.keys()).collect(),
        ElementKind::Edge => edges.iter().flat_map(|e| e.attributes.keys()).collect(),
    };
    keys.into_iter()
        .filter(|k| !reserved.contains(&k.as_str()))
        .cloned()
        .collect()
}
