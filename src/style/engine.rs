//! Style application: resolve every rule for every element and write the
//! resulting render attributes back through the backend.
//!
//! `apply_all` recomputes everything from the current graph, settings and
//! overlay, so calling it repeatedly gives the same result.

use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::debug;

use crate::backend::{AttributeSource, ElementKind, ElementRef, GraphBackend, StyleAttributes};
use crate::overlay::{
    OverlayFlags, OverlayState, DIMMED_OPACITY, HIGHLIGHT_OVERLAY_COLOR, HOVER_HIGHLIGHT_COLOR,
    SELECTED_EDGE_ARROW, SELECTED_EDGE_LINE, SELECTED_NODE_BORDER, SELECTED_NODE_FILL,
};
use crate::style::property::VisualProperty;
use crate::style::resolve::resolve;
use crate::style::rule::VisualValue;
use crate::style::settings::StyleSettings;

pub const ARROW_SCALE: f64 = 1.2;

/// Counts reported by [`apply_all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub nodes: usize,
    pub edges: usize,
    pub seeded: usize,
}

/// Resolved value of every property of `kind` for one element.
pub fn resolve_element<E: AttributeSource + ?Sized>(
    element: &E,
    kind: ElementKind,
    settings: &StyleSettings,
) -> IndexMap<VisualProperty, VisualValue> {
    settings
        .rules(kind)
        .iter()
        .map(|(property, rule)| (*property, resolve(element, *property, rule)))
        .collect()
}

fn value_of(resolved: &IndexMap<VisualProperty, VisualValue>, property: VisualProperty) -> Value {
    resolved
        .get(&property)
        .map(VisualValue::to_json)
        .unwrap_or(Value::Null)
}

fn node_render_attributes(
    label: String,
    resolved: &IndexMap<VisualProperty, VisualValue>,
) -> StyleAttributes {
    let mut style = StyleAttributes::new();
    let font_size = resolved
        .get(&VisualProperty::LabelFontSize)
        .map(|v| format!("{}px", v))
        .unwrap_or_default();
    let shape = value_of(resolved, VisualProperty::Shape);
    let overlay_shape = if shape == json!("ellipse") {
        "ellipse"
    } else {
        "round-rectangle"
    };
    let size = value_of(resolved, VisualProperty::Size);

    style.insert("label".to_string(), json!(label));
    style.insert("font-size".to_string(), json!(font_size));
    style.insert("color".to_string(), value_of(resolved, VisualProperty::LabelColor));
    style.insert(
        "background-color".to_string(),
        value_of(resolved, VisualProperty::FillColor),
    );
    style.insert("shape".to_string(), shape);
    style.insert("overlay-shape".to_string(), json!(overlay_shape));
    style.insert("width".to_string(), size.clone());
    style.insert("height".to_string(), size);
    style.insert(
        "border-width".to_string(),
        value_of(resolved, VisualProperty::BorderWidth),
    );
    style.insert(
        "border-color".to_string(),
        value_of(resolved, VisualProperty::BorderColor),
    );
    style.insert("opacity".to_string(), value_of(resolved, VisualProperty::Opacity));
    style
}

fn edge_render_attributes(resolved: &IndexMap<VisualProperty, VisualValue>) -> StyleAttributes {
    let mut style = StyleAttributes::new();
    let line_color = value_of(resolved, VisualProperty::LineColor);
    style.insert("width".to_string(), value_of(resolved, VisualProperty::Width));
    style.insert("line-color".to_string(), line_color.clone());
    style.insert("target-arrow-color".to_string(), line_color);
    style.insert(
        "target-arrow-shape".to_string(),
        value_of(resolved, VisualProperty::ArrowShape),
    );
    style.insert(
        "line-style".to_string(),
        value_of(resolved, VisualProperty::LineType),
    );
    style.insert(
        "curve-style".to_string(),
        value_of(resolved, VisualProperty::CurveStyle),
    );
    style.insert("arrow-scale".to_string(), json!(ARROW_SCALE));
    style.insert("opacity".to_string(), value_of(resolved, VisualProperty::Opacity));
    style
}

/// Layer overlay flags onto base attributes. Only the strongest flag applies.
pub fn apply_overlay(kind: ElementKind, style: &mut StyleAttributes, flags: OverlayFlags) {
    let mut set = |key: &str, value: Value| {
        style.insert(key.to_string(), value);
    };

    if flags.hover_highlighted {
        match kind {
            ElementKind::Node => {
                set("background-color", json!(HOVER_HIGHLIGHT_COLOR));
                set("border-color", json!(HOVER_HIGHLIGHT_COLOR));
            }
            ElementKind::Edge => {
                set("line-color", json!(HOVER_HIGHLIGHT_COLOR));
                set("target-arrow-color", json!(HOVER_HIGHLIGHT_COLOR));
            }
        }
        set("opacity", json!(1));
    } else if flags.hover_dimmed {
        set("opacity", json!(DIMMED_OPACITY));
    } else if flags.selected || flags.filtered_in {
        match kind {
            ElementKind::Node if flags.selected => {
                set("background-color", json!(SELECTED_NODE_FILL));
                set("border-color", json!(SELECTED_NODE_BORDER));
            }
            ElementKind::Node => {}
            ElementKind::Edge => {
                set("line-color", json!(SELECTED_EDGE_LINE));
                set("target-arrow-color", json!(SELECTED_EDGE_ARROW));
            }
        }
        if flags.filtered_in {
            set("overlay-color", json!(HIGHLIGHT_OVERLAY_COLOR));
            set("overlay-opacity", json!(0.4));
        }
    }
}

/// Recompute and write the render attributes of every node and edge.
///
/// Active discrete rules are first seeded with any column values they have
/// not seen yet, then each element is resolved and overlaid.
pub fn apply_all<B: GraphBackend + ?Sized>(
    backend: &mut B,
    settings: &mut StyleSettings,
    overlay: &OverlayState,
) -> ApplySummary {
    let seeded = settings.seed_discrete_rules(&*backend);
    let selected: HashSet<ElementRef> = backend.selected().into_iter().collect();

    let mut updates: Vec<(ElementRef, StyleAttributes)> =
        Vec::with_capacity(backend.element_count());

    for node in backend.nodes() {
        let element = ElementRef::node(&node.id);
        let resolved = resolve_element(node, ElementKind::Node, settings);
        let mut style = node_render_attributes(node.label(), &resolved);
        let flags = overlay.flags_for(&element, selected.contains(&element));
        apply_overlay(ElementKind::Node, &mut style, flags);
        updates.push((element, style));
    }
    let nodes = updates.len();

    for edge in backend.edges() {
        let element = ElementRef::edge(&edge.id);
        let resolved = resolve_element(edge, ElementKind::Edge, settings);
        let mut style = edge_render_attributes(&resolved);
        let flags = overlay.flags_for(&element, selected.contains(&element));
        apply_overlay(ElementKind::Edge, &mut style, flags);
        updates.push((element, style));
    }
    let edges = updates.len() - nodes;

    for (element, style) in updates {
        backend.set_style_attributes(&element, style);
    }

    debug!(
        "Applied styles to {} nodes and {} edges ({} discrete entries seeded)",
        nodes, edges, seeded
    );
    ApplySummary {
        nodes,
        edges,
        seeded,
    }
}
