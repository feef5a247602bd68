//! Persistence codec.
//!
//! Documents are written in the Cytoscape.js `elements` layout so generic
//! graph tools can read them; style settings travel in an `appExtensions`
//! block those tools ignore. Reading also accepts the early app layout and
//! CX2. Every document is decoded in full before anything is returned, so a
//! caller can validate before replacing its current state.

pub mod formats;
pub mod legacy;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::backend::{GraphBackend, Position};
use crate::errors::{DocumentError, DocumentResult};
use crate::graph::{Edge, Node};
use crate::style::StyleSettings;
use crate::value::AttributeValue;

pub use formats::{detect_settings_shape, detect_shape, DocumentShape, SettingsShape};
pub use legacy::normalize_legacy_arrays;

pub const FORMAT_VERSION: &str = "1.0";
pub const TARGET_CYTOSCAPEJS_VERSION: &str = "~3.28";
pub const EXTENSION_VERSION: &str = "2.0";
pub const DEFAULT_NETWORK_NAME: &str = "Network";
pub const DEFAULT_BEND_STRENGTH: u32 = 40;

/// Curvature of bundled edges, stored next to the style block.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EdgeBendSettings {
    pub bend_strength: u32,
}

impl Default for EdgeBendSettings {
    fn default() -> Self {
        EdgeBendSettings {
            bend_strength: DEFAULT_BEND_STRENGTH,
        }
    }
}

impl EdgeBendSettings {
    /// Read an `edgeBendsSettings` block. A missing or zero strength falls
    /// back to the default.
    pub fn decode(block: Option<&Value>) -> Self {
        let bend_strength = block
            .and_then(|b| b.get("bendStrength"))
            .and_then(Value::as_f64)
            .filter(|s| *s > 0.0)
            .map(|s| s.round() as u32)
            .unwrap_or(DEFAULT_BEND_STRENGTH);
        EdgeBendSettings { bend_strength }
    }
}

/// Everything recovered from a document.
#[derive(Clone, Debug)]
pub struct DocumentContents {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// `None` when the document carries no style block.
    pub style: Option<StyleSettings>,
    pub edge_bends: EdgeBendSettings,
    pub shape: DocumentShape,
}

impl DocumentContents {
    /// True when at least one node has a stored position.
    pub fn has_positions(&self) -> bool {
        self.nodes.iter().any(|n| n.position.is_some())
    }
}

fn generated_by() -> String {
    format!("vizmap {}", env!("CARGO_PKG_VERSION"))
}

fn element_data(
    attributes: &crate::graph::Attributes,
    keys: &[(&str, &str)],
) -> Map<String, Value> {
    let mut data: Map<String, Value> = attributes
        .iter()
        .map(|(key, value)| (key.clone(), value.to_json()))
        .collect();
    // Element fields win over attributes of the same name.
    for (key, value) in keys {
        data.insert(key.to_string(), Value::String(value.to_string()));
    }
    data
}

/// Encode the graph and style settings. Positions are read from the backend.
pub fn serialize<B: GraphBackend + ?Sized>(
    backend: &B,
    settings: &StyleSettings,
    edge_bends: EdgeBendSettings,
    name: &str,
) -> DocumentResult<Value> {
    let nodes: Vec<Value> = backend
        .nodes()
        .iter()
        .map(|node| {
            let data = element_data(&node.attributes, &[("id", node.id.as_str())]);
            let mut entry = json!({ "data": data });
            if let Some(p) = backend.position(&node.id) {
                entry["position"] = json!({ "x": p.x, "y": p.y });
            }
            entry
        })
        .collect();

    let edges: Vec<Value> = backend
        .edges()
        .iter()
        .map(|edge| {
            let data = element_data(
                &edge.attributes,
                &[
                    ("id", edge.id.as_str()),
                    ("source", edge.source.as_str()),
                    ("target", edge.target.as_str()),
                ],
            );
            json!({ "data": data })
        })
        .collect();

    debug!("Serializing {} nodes and {} edges", nodes.len(), edges.len());
    Ok(json!({
        "format_version": FORMAT_VERSION,
        "generated_by": generated_by(),
        "target_cytoscapejs_version": TARGET_CYTOSCAPEJS_VERSION,
        "data": { "name": name },
        "elements": { "nodes": nodes, "edges": edges },
        "appExtensions": {
            "version": EXTENSION_VERSION,
            "exportDate": chrono::Utc::now().to_rfc3339(),
            "styleSettings": serde_json::to_value(settings)?,
            "edgeBendsSettings": serde_json::to_value(edge_bends)?,
        }
    }))
}

fn element_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_position(position: Option<&Value>) -> Option<Position> {
    let position = position?;
    Some(Position::new(
        position.get("x")?.as_f64()?,
        position.get("y")?.as_f64()?,
    ))
}

fn data_object(data: &Value, what: &str) -> DocumentResult<Map<String, Value>> {
    match normalize_legacy_arrays(data) {
        Value::Object(map) => Ok(map),
        _ => Err(DocumentError::InvalidElement(format!("{} data is not an object", what))),
    }
}

fn decoded_attributes(data: Map<String, Value>, reserved: &[&str]) -> Vec<(String, AttributeValue)> {
    data.into_iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .filter_map(|(key, value)| Some((key, AttributeValue::from_json(&value)?)))
        .collect()
}

/// Decode a node `data` record. Array attributes joined by older versions
/// are re-split.
pub(crate) fn decode_node(data: &Value, position: Option<&Value>) -> DocumentResult<Node> {
    let data = data_object(data, "node")?;
    let id = element_id(data.get("id"))
        .ok_or_else(|| DocumentError::InvalidElement("node without id".to_string()))?;

    let mut node = Node::new(id);
    node.attributes.extend(decoded_attributes(data, &["id"]));
    node.position = decode_position(position);
    Ok(node)
}

/// Decode an edge `data` record; `index` names edges saved without an id.
pub(crate) fn decode_edge(data: &Value, index: usize) -> DocumentResult<Edge> {
    let data = data_object(data, "edge")?;
    let id = element_id(data.get("id")).unwrap_or_else(|| format!("e{}", index));
    let endpoint = |key: &str| {
        element_id(data.get(key))
            .ok_or_else(|| DocumentError::InvalidElement(format!("edge {} has no {}", id, key)))
    };
    let source = endpoint("source")?;
    let target = endpoint("target")?;

    let mut edge = Edge::new(id, source, target);
    edge.attributes
        .extend(decoded_attributes(data, &["id", "source", "target"]));
    Ok(edge)
}

fn decode_elements(doc: &Value) -> DocumentResult<(Vec<Node>, Vec<Edge>)> {
    let elements = &doc["elements"];
    let empty = Vec::new();
    let node_entries = elements["nodes"].as_array().unwrap_or(&empty);
    let edge_entries = elements["edges"].as_array().unwrap_or(&empty);

    let nodes = node_entries
        .iter()
        .map(|entry| decode_node(&entry["data"], entry.get("position")))
        .collect::<DocumentResult<Vec<_>>>()?;
    let edges = edge_entries
        .iter()
        .enumerate()
        .map(|(index, entry)| decode_edge(&entry["data"], index))
        .collect::<DocumentResult<Vec<_>>>()?;
    Ok((nodes, edges))
}

/// Decode a style block of either layout.
pub fn decode_style_settings(
    settings: &Value,
    nodes: &[Node],
    edges: &[Edge],
) -> DocumentResult<StyleSettings> {
    match detect_settings_shape(settings) {
        Some(SettingsShape::Rules) => {
            let decoded: StyleSettings = serde_json::from_value(settings.clone())
                .map_err(|e| DocumentError::InvalidStyleSettings(e.to_string()))?;
            let decoded = decoded.normalized();
            decoded
                .validate()
                .map_err(|e| DocumentError::InvalidStyleSettings(e.to_string()))?;
            Ok(decoded)
        }
        Some(SettingsShape::LegacyPanel) => {
            debug!("Upgrading legacy style panel settings");
            legacy::upgrade_style_settings(settings, nodes, edges)
        }
        None => Err(DocumentError::InvalidStyleSettings(
            "neither node nor edge settings found".to_string(),
        )),
    }
}

fn optional_style(
    settings: Option<&Value>,
    nodes: &[Node],
    edges: &[Edge],
) -> DocumentResult<Option<StyleSettings>> {
    match settings {
        None | Some(Value::Null) => Ok(None),
        Some(settings) => decode_style_settings(settings, nodes, edges).map(Some),
    }
}

/// Decode any supported document.
pub fn deserialize(doc: &Value) -> DocumentResult<DocumentContents> {
    let Some(shape) = detect_shape(doc) else {
        warn!("Document matches no known format");
        return Err(DocumentError::UnrecognizedShape);
    };

    let (nodes, edges, style, edge_bends) = match shape {
        DocumentShape::Elements => {
            let (nodes, edges) = decode_elements(doc)?;
            let ext = doc.get("appExtensions");
            let settings = ext.and_then(|ext| ext.get("styleSettings"));
            let style = optional_style(settings, &nodes, &edges)?;
            let bends = EdgeBendSettings::decode(ext.and_then(|e| e.get("edgeBendsSettings")));
            (nodes, edges, style, bends)
        }
        DocumentShape::LegacyApp => {
            let (nodes, edges) = legacy::decode_legacy_elements(doc)?;
            let style = optional_style(doc.get("styleSettings"), &nodes, &edges)?;
            let bends = EdgeBendSettings::decode(doc.get("edgeBendsSettings"));
            (nodes, edges, style, bends)
        }
        DocumentShape::Cx2 => {
            let (nodes, edges) = legacy::decode_cx2(doc)?;
            (nodes, edges, None, EdgeBendSettings::default())
        }
    };

    info!(
        "Decoded {} document: {} nodes, {} edges",
        shape,
        nodes.len(),
        edges.len()
    );
    Ok(DocumentContents {
        nodes,
        edges,
        style,
        edge_bends,
        shape,
    })
}

pub fn read_document(path: &Path) -> DocumentResult<DocumentContents> {
    let text = fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&text)?;
    deserialize(&doc)
}

pub fn write_document<B: GraphBackend + ?Sized>(
    path: &Path,
    backend: &B,
    settings: &StyleSettings,
    edge_bends: EdgeBendSettings,
    name: &str,
) -> DocumentResult<()> {
    let doc = serialize(backend, settings, edge_bends, name)?;
    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    info!("Wrote document to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ElementKind;
    use crate::graph::InMemoryGraph;
    use crate::style::{MappingRequest, StrategyKind, VisualProperty, VisualValue};
    use indexmap::IndexMap;

    fn sample_graph() -> InMemoryGraph {
        let mut graph = InMemoryGraph::new("sample");
        let mut a = Node::new("a");
        a.attributes.insert("type".to_string(), "db".into());
        a.attributes.insert(
            "tags".to_string(),
            AttributeValue::Array(vec!["x".into(), "y".into()]),
        );
        a.position = Some(Position::new(10.0, 20.0));
        let b = Node::new("b");
        let mut ab = Edge::new("e0_a_b", "a", "b");
        ab.attributes.insert("weight".to_string(), AttributeValue::Int(5));
        ab.attributes.insert("score".to_string(), AttributeValue::Float(0.5));
        graph.add_elements(vec![a, b], vec![ab]);
        graph
    }

    #[test]
    fn test_serialize_layout() {
        let graph = sample_graph();
        let doc = serialize(
            &graph,
            &StyleSettings::default(),
            EdgeBendSettings::default(),
            "sample",
        )
        .unwrap();

        assert_eq!(doc["format_version"], json!("1.0"));
        assert_eq!(doc["data"]["name"], json!("sample"));
        let node = &doc["elements"]["nodes"][0];
        assert_eq!(node["data"]["id"], json!("a"));
        assert_eq!(node["data"]["tags"], json!(["x", "y"]));
        assert_eq!(node["position"], json!({"x": 10.0, "y": 20.0}));
        assert!(doc["elements"]["nodes"][1].get("position").is_none());
        let edge = &doc["elements"]["edges"][0]["data"];
        assert_eq!(edge["source"], json!("a"));
        assert_eq!(edge["weight"], json!(5));
        assert!(doc["appExtensions"]["styleSettings"]["node"]["fillColor"].is_object());
    }

    #[test]
    fn test_round_trip_preserves_elements_and_rules() {
        let graph = sample_graph();
        let mut settings = StyleSettings::default();
        settings
            .configure_mapping(
                &MappingRequest {
                    kind: ElementKind::Node,
                    property: VisualProperty::FillColor,
                    column: "type".to_string(),
                    strategy: Some(StrategyKind::Discrete),
                    output: None,
                    values: IndexMap::from([("db".to_string(), VisualValue::from("#ff0000"))]),
                },
                &graph,
            )
            .unwrap();

        let doc = serialize(&graph, &settings, EdgeBendSettings::default(), "sample").unwrap();
        let text = serde_json::to_string(&doc).unwrap();
        let decoded = deserialize(&serde_json::from_str(&text).unwrap()).unwrap();

        assert_eq!(decoded.shape, DocumentShape::Elements);
        assert_eq!(decoded.nodes, graph.nodes().to_vec());
        assert_eq!(decoded.edges, graph.edges().to_vec());
        assert_eq!(decoded.style, Some(settings));
        assert!(decoded.has_positions());
    }

    #[test]
    fn test_element_fields_win_over_same_named_attributes() {
        let mut graph = InMemoryGraph::new("sample");
        let mut ab = Edge::new("e0_a_b", "a", "b");
        ab.attributes.insert("source".to_string(), "PubMed".into());
        ab.attributes.insert("id".to_string(), "other".into());
        graph.add_elements(vec![Node::new("a"), Node::new("b")], vec![ab]);

        let doc = serialize(
            &graph,
            &StyleSettings::default(),
            EdgeBendSettings::default(),
            "s",
        )
        .unwrap();
        let data = &doc["elements"]["edges"][0]["data"];
        assert_eq!(data["id"], json!("e0_a_b"));
        assert_eq!(data["source"], json!("a"));
        assert_eq!(data["target"], json!("b"));
    }

    #[test]
    fn test_edge_bend_settings() {
        let doc = json!({
            "elements": {"nodes": []},
            "appExtensions": {"edgeBendsSettings": {"bendStrength": 70}}
        });
        assert_eq!(deserialize(&doc).unwrap().edge_bends.bend_strength, 70);

        let legacy = json!({"version": "1.0", "cytoscapeElements": [],
                            "edgeBendsSettings": {"bendStrength": 0}});
        assert_eq!(
            deserialize(&legacy).unwrap().edge_bends,
            EdgeBendSettings::default()
        );
        assert_eq!(EdgeBendSettings::decode(None).bend_strength, 40);

        let graph = sample_graph();
        let doc = serialize(
            &graph,
            &StyleSettings::default(),
            EdgeBendSettings { bend_strength: 25 },
            "sample",
        )
        .unwrap();
        assert_eq!(
            doc["appExtensions"]["edgeBendsSettings"],
            json!({"bendStrength": 25})
        );
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        let err = deserialize(&json!({"foo": []})).unwrap_err();
        assert_eq!(err.error_code(), "UNRECOGNIZED_SHAPE");
        assert!(deserialize(&json!([{"nodes": []}])).is_err());
    }

    #[test]
    fn test_invalid_elements_fail_whole_document() {
        let doc = json!({"elements": {"nodes": [{"data": {"id": "a"}}, {"data": {"label": "x"}}]}});
        assert!(matches!(
            deserialize(&doc),
            Err(DocumentError::InvalidElement(_))
        ));
        let doc = json!({"elements": {"edges": [{"data": {"source": "a"}}]}});
        assert!(matches!(
            deserialize(&doc),
            Err(DocumentError::InvalidElement(_))
        ));
    }

    #[test]
    fn test_numeric_ids_and_missing_edge_ids() {
        let doc = json!({"elements": {
            "nodes": [{"data": {"id": 1}}, {"data": {"id": 2}}],
            "edges": [{"data": {"source": 1, "target": 2}}]
        }});
        let decoded = deserialize(&doc).unwrap();
        assert_eq!(decoded.nodes[0].id, "1");
        assert_eq!(decoded.edges[0].id, "e0");
        assert_eq!(decoded.edges[0].source, "1");
        assert!(decoded.style.is_none());
        assert!(!decoded.has_positions());
    }

    #[test]
    fn test_joined_arrays_are_split_on_read() {
        let doc = json!({"elements": {"nodes": [{"data": {"id": "a", "tags": ["p| q"]}}]}});
        let decoded = deserialize(&doc).unwrap();
        assert_eq!(
            decoded.nodes[0].attributes["tags"],
            AttributeValue::Array(vec!["p".into(), "q".into()])
        );
    }

    #[test]
    fn test_legacy_app_document_with_panel_settings() {
        let doc = json!({
            "version": "1.0",
            "cytoscapeElements": [
                {"group": "nodes", "data": {"id": "a", "label": "a", "kind": "db"}},
                {"group": "edges", "data": {"id": "ab", "source": "a", "target": "a"}}
            ],
            "styleSettings": {
                "node": {"fillColor": "#123456", "size": "30",
                         "mappings": {"shape": {"active": true, "column": "kind", "values": {"db": "diamond"}}}},
                "edge": {"width": "4", "mappings": {}}
            }
        });
        let decoded = deserialize(&doc).unwrap();
        assert_eq!(decoded.shape, DocumentShape::LegacyApp);
        let style = decoded.style.unwrap();
        assert_eq!(
            style.node[&VisualProperty::Size].default_value,
            VisualValue::Number(30.0)
        );
        assert_eq!(
            style.edge[&VisualProperty::Width].default_value,
            VisualValue::Number(4.0)
        );
        assert!(style.node[&VisualProperty::Shape].is_active());
    }

    #[test]
    fn test_incompatible_rules_are_rejected() {
        let doc = json!({
            "elements": {"nodes": []},
            "appExtensions": {"styleSettings": {"node": {
                "shape": {"active": true, "column": "w", "defaultValue": "ellipse",
                          "strategy": {"type": "continuous", "domainMin": 0, "domainMax": 1,
                                       "outMin": 1, "outMax": 2}}
            }}}
        });
        assert!(matches!(
            deserialize(&doc),
            Err(DocumentError::InvalidStyleSettings(_))
        ));
    }

    #[test]
    fn test_write_then_read_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let graph = sample_graph();
        write_document(
            &path,
            &graph,
            &StyleSettings::default(),
            EdgeBendSettings::default(),
            "sample",
        )
        .unwrap();
        let decoded = read_document(&path).unwrap();
        assert_eq!(decoded.nodes.len(), 2);
        assert_eq!(decoded.edges.len(), 1);
    }
}
