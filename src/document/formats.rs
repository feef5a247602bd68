//! Structural detection of persisted document shapes.
//!
//! Version fields were not always bumped when the layout changed, so shapes
//! are told apart by what the document contains.

use serde_json::Value;
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentShape {
    /// Cytoscape.js `elements` layout, with or without an extension block.
    Elements,
    /// Early app saves with a flat `cytoscapeElements` array.
    LegacyApp,
    /// CX2 interchange: an array of aspect sections.
    Cx2,
}

impl Display for DocumentShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentShape::Elements => write!(f, "elements"),
            DocumentShape::LegacyApp => write!(f, "legacy app"),
            DocumentShape::Cx2 => write!(f, "CX2"),
        }
    }
}

/// Style settings layouts found in extension blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsShape {
    /// Rule per property with `defaultValue` and a tagged `strategy`.
    Rules,
    /// Flat defaults plus a `mappings` table with `individual`,
    /// `continuous` and `gradient` types.
    LegacyPanel,
}

pub fn detect_shape(doc: &Value) -> Option<DocumentShape> {
    if let Some(sections) = doc.as_array() {
        let is_cx2 = sections
            .first()
            .and_then(|s| s.get("CXVersion"))
            .map_or(false, |v| !v.is_null());
        return is_cx2.then_some(DocumentShape::Cx2);
    }

    let object = doc.as_object()?;
    if let Some(elements) = object.get("elements") {
        let has_arrays = elements.get("nodes").map_or(false, Value::is_array)
            || elements.get("edges").map_or(false, Value::is_array);
        if has_arrays {
            return Some(DocumentShape::Elements);
        }
    }
    if object
        .get("cytoscapeElements")
        .map_or(false, Value::is_array)
    {
        return Some(DocumentShape::LegacyApp);
    }
    None
}

/// Classify a `styleSettings` value. `None` when it is neither layout.
pub fn detect_settings_shape(settings: &Value) -> Option<SettingsShape> {
    let object = settings.as_object()?;
    let kinds: Vec<&serde_json::Map<String, Value>> = ["node", "edge"]
        .iter()
        .filter_map(|k| object.get(*k).and_then(Value::as_object))
        .collect();
    if kinds.is_empty() {
        return None;
    }

    let legacy = kinds
        .iter()
        .any(|k| k.contains_key("mappings") || k.values().any(|v| !v.is_object()));
    if legacy {
        return Some(SettingsShape::LegacyPanel);
    }

    let rules = kinds
        .iter()
        .all(|k| k.values().all(|rule| rule.get("defaultValue").is_some()));
    rules.then_some(SettingsShape::Rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_shapes() {
        assert_eq!(
            detect_shape(&json!({"elements": {"nodes": [], "edges": []}})),
            Some(DocumentShape::Elements)
        );
        assert_eq!(
            detect_shape(&json!({"elements": {"edges": []}})),
            Some(DocumentShape::Elements)
        );
        assert_eq!(
            detect_shape(&json!({"cytoscapeElements": [], "nodes": []})),
            Some(DocumentShape::LegacyApp)
        );
        assert_eq!(
            detect_shape(&json!([{"CXVersion": "2.0"}, {"nodes": []}])),
            Some(DocumentShape::Cx2)
        );
    }

    #[test]
    fn test_unknown_shapes() {
        assert_eq!(detect_shape(&json!({"elements": {}})), None);
        assert_eq!(detect_shape(&json!([{"nodes": []}])), None);
        assert_eq!(detect_shape(&json!("text")), None);
        assert_eq!(detect_shape(&json!({})), None);
    }

    #[test]
    fn test_detect_settings_shape() {
        let legacy = json!({
            "node": {"fillColor": "#2563eb", "mappings": {}},
            "edge": {"width": "2", "mappings": {}}
        });
        assert_eq!(
            detect_settings_shape(&legacy),
            Some(SettingsShape::LegacyPanel)
        );

        let rules = json!({
            "node": {"size": {"active": false, "defaultValue": 40}},
            "edge": {}
        });
        assert_eq!(detect_settings_shape(&rules), Some(SettingsShape::Rules));
        assert_eq!(detect_settings_shape(&json!(null)), None);
        assert_eq!(
            detect_settings_shape(&json!({"node": {"size": {}}})),
            None
        );
    }
}
