//! Readers for older document layouts.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::backend::ElementKind;
use crate::document::{decode_edge, decode_node};
use crate::errors::{DocumentError, DocumentResult};
use crate::graph::{Edge, Node, LABEL_KEY};
use crate::stats::numeric_range;
use crate::style::{
    ContinuousRange, MappingRule, MappingStrategy, OutputRange, StyleSettings, VisualProperty,
    VisualValue,
};
use crate::value::parse_float_prefix;

/// Separator older saves joined array attributes with.
pub const LEGACY_ARRAY_SEPARATOR: &str = "| ";

/// Re-split array attributes that older versions stored as a single joined
/// string inside a one-element array. Applied recursively.
pub fn normalize_legacy_arrays(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            if let [Value::String(joined)] = items.as_slice() {
                if joined.contains(LEGACY_ARRAY_SEPARATOR) {
                    return Value::Array(
                        joined
                            .split(LEGACY_ARRAY_SEPARATOR)
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(|s| Value::String(s.to_string()))
                            .collect(),
                    );
                }
            }
            Value::Array(items.iter().map(normalize_legacy_arrays).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_legacy_arrays(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn visual_value(value: &Value) -> Option<VisualValue> {
    match value {
        Value::Number(n) => n.as_f64().map(VisualValue::Number),
        Value::String(s) => Some(VisualValue::Text(s.clone())),
        _ => None,
    }
}

fn number_of(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float_prefix(s),
        _ => None,
    }
}

fn legacy_output(mapping: &Map<String, Value>) -> Option<OutputRange> {
    match mapping.get("type").and_then(Value::as_str) {
        Some("continuous") => {
            let range = mapping.get("continuousRange")?;
            Some(OutputRange::Number {
                min: number_of(range.get("minSize"))?,
                max: number_of(range.get("maxSize"))?,
            })
        }
        Some("gradient") => {
            let colors = mapping.get("gradientColors")?;
            Some(OutputRange::Color {
                min: colors.get("min")?.as_str()?.to_string(),
                max: colors.get("max")?.as_str()?.to_string(),
            })
        }
        _ => None,
    }
}

fn upgrade_mapping(
    property: VisualProperty,
    mapping: &Map<String, Value>,
    rule: &mut MappingRule,
    nodes: &[Node],
    edges: &[Edge],
    kind: ElementKind,
) {
    let column = mapping
        .get("column")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let values: IndexMap<String, VisualValue> = mapping
        .get("values")
        .and_then(Value::as_object)
        .map(|table| {
            table
                .iter()
                .filter_map(|(k, v)| Some((k.clone(), visual_value(v)?.normalized_for(property))))
                .collect()
        })
        .unwrap_or_default();

    let continuous = legacy_output(mapping).map(|output| {
        // Older saves computed the domain live; pin it to the data as loaded.
        let range = match kind {
            ElementKind::Node => numeric_range(nodes, &column),
            ElementKind::Edge => numeric_range(edges, &column),
        };
        MappingStrategy::Continuous(ContinuousRange {
            domain_min: range.min,
            domain_max: range.max,
            output,
        })
    });

    let strategy = match continuous {
        Some(strategy) if MappingRule::check_compatible(property, &strategy).is_ok() => strategy,
        _ => MappingStrategy::Discrete { values },
    };

    rule.column = column;
    rule.strategy = strategy;
    rule.active = !rule.column.is_empty();
}

/// Convert the flat style panel settings of 1.x documents into rules.
///
/// Continuous and gradient mappings get their domain from the elements being
/// loaded. A mapping counts as active whenever it names a column, which is
/// how those versions rendered it.
pub fn upgrade_style_settings(
    settings: &Value,
    nodes: &[Node],
    edges: &[Edge],
) -> DocumentResult<StyleSettings> {
    let object = settings
        .as_object()
        .ok_or_else(|| DocumentError::InvalidStyleSettings("expected an object".to_string()))?;
    let mut upgraded = StyleSettings::default();

    for kind in [ElementKind::Node, ElementKind::Edge] {
        let Some(section) = object.get(&kind.to_string()).and_then(Value::as_object) else {
            continue;
        };

        for (key, value) in section.iter().filter(|(k, _)| *k != "mappings") {
            let Some(property) = key.parse::<VisualProperty>().ok() else {
                debug!("Ignoring unknown legacy {} setting '{}'", kind, key);
                continue;
            };
            let Some(default_value) = visual_value(value) else {
                continue;
            };
            if let Err(e) = upgraded.set_default(kind, property, default_value) {
                warn!("Ignoring legacy {} default for {}: {}", kind, property, e);
            }
        }

        let mappings = section.get("mappings").and_then(Value::as_object);
        for (key, mapping) in mappings.into_iter().flatten() {
            let (Ok(property), Some(mapping)) = (key.parse::<VisualProperty>(), mapping.as_object())
            else {
                continue;
            };
            if let Ok(rule) = upgraded.rule_mut(kind, property) {
                upgrade_mapping(property, mapping, rule, nodes, edges, kind);
            }
        }
    }

    Ok(upgraded)
}

/// Elements of an early app save: `cytoscapeElements` entries with an
/// optional `group` and `position`.
pub fn decode_legacy_elements(doc: &Value) -> DocumentResult<(Vec<Node>, Vec<Edge>)> {
    let entries = doc
        .get("cytoscapeElements")
        .and_then(Value::as_array)
        .ok_or(DocumentError::UnrecognizedShape)?;

    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let data = entry
            .get("data")
            .ok_or_else(|| DocumentError::InvalidElement(format!("element {} has no data", index)))?;
        let is_edge = match entry.get("group").and_then(Value::as_str) {
            Some(group) => group == "edges",
            None => data.get("source").is_some() && data.get("target").is_some(),
        };
        if is_edge {
            edges.push(decode_edge(data, index)?);
        } else {
            nodes.push(decode_node(data, entry.get("position"))?);
        }
    }
    Ok((nodes, edges))
}

fn cx2_section<'a>(doc: &'a Value, name: &str) -> Option<&'a Vec<Value>> {
    doc.as_array()?
        .iter()
        .filter_map(|section| section.get(name).and_then(Value::as_array))
        .last()
}

fn cx2_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Nodes and edges of a CX2 document. Node ids come from the `name`
/// attribute when present, edges refer to nodes by CX2 id.
pub fn decode_cx2(doc: &Value) -> DocumentResult<(Vec<Node>, Vec<Edge>)> {
    let empty = Vec::new();
    let cx_nodes = cx2_section(doc, "nodes").unwrap_or(&empty);
    let cx_edges = cx2_section(doc, "edges").unwrap_or(&empty);

    let mut id_to_name: IndexMap<String, String> = IndexMap::new();
    let mut nodes = Vec::with_capacity(cx_nodes.len());
    for cx_node in cx_nodes {
        let cx_id = cx2_id(cx_node.get("id"));
        let attrs = cx_node.get("v").cloned().unwrap_or(Value::Null);
        let name = attrs
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| cx_id.clone());

        let mut data = Map::new();
        data.insert(LABEL_KEY.to_string(), Value::String(name.clone()));
        if let Some(v) = attrs.as_object() {
            data.extend(v.clone());
        }
        data.insert("id".to_string(), Value::String(name.clone()));

        let position = match (cx_node.get("x"), cx_node.get("y")) {
            (Some(x), Some(y)) if x.is_number() && y.is_number() => {
                Some(serde_json::json!({"x": x, "y": y}))
            }
            _ => None,
        };
        nodes.push(decode_node(&Value::Object(data), position.as_ref())?);
        id_to_name.insert(cx_id, name);
    }

    let mut edges = Vec::with_capacity(cx_edges.len());
    for (index, cx_edge) in cx_edges.iter().enumerate() {
        let endpoint = |key: &str| {
            let raw = cx2_id(cx_edge.get(key));
            id_to_name.get(&raw).cloned().unwrap_or(raw)
        };
        let edge_id = match cx_edge.get("id") {
            Some(Value::Number(n)) if n.as_i64() != Some(0) => format!("e{}", n),
            Some(Value::String(s)) if !s.is_empty() => format!("e{}", s),
            _ => format!("e{}", index),
        };

        let mut data = Map::new();
        if let Some(v) = cx_edge.get("v").and_then(Value::as_object) {
            data.extend(v.clone());
        }
        data.insert("id".to_string(), Value::String(edge_id));
        data.insert("source".to_string(), Value::String(endpoint("s")));
        data.insert("target".to_string(), Value::String(endpoint("t")));
        edges.push(decode_edge(&Value::Object(data), index)?);
    }

    debug!("CX2 document: {} nodes, {} edges", nodes.len(), edges.len());
    Ok((nodes, edges))
}
