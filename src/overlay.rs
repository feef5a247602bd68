//! Transient interaction state layered over resolved styles.
//!
//! Nothing in here is persisted. Each operation replaces the flags it owns
//! rather than merging with the previous state.

use std::collections::HashSet;
use tracing::debug;

use crate::backend::{ElementKind, ElementRef, GraphBackend};

/// Graphs with more elements than this skip hover neighbourhood highlighting.
pub const HOVER_HIGHLIGHT_LIMIT: usize = 2000;

pub const HOVER_HIGHLIGHT_COLOR: &str = "#ff1493";
pub const DIMMED_OPACITY: f64 = 0.5;
pub const SELECTED_NODE_FILL: &str = "#fed7aa";
pub const SELECTED_NODE_BORDER: &str = "#ea580c";
pub const SELECTED_EDGE_LINE: &str = "#ea580c";
pub const SELECTED_EDGE_ARROW: &str = "#c2410c";
pub const HIGHLIGHT_OVERLAY_COLOR: &str = "#f97316";

/// Overlay flags of a single element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OverlayFlags {
    pub hover_highlighted: bool,
    pub hover_dimmed: bool,
    pub selected: bool,
    pub filtered_in: bool,
    pub filtered_out: bool,
}

#[derive(Clone, Debug, Default)]
pub struct OverlayState {
    hover_highlighted: HashSet<ElementRef>,
    hover_dimmed: HashSet<ElementRef>,
    filtered_in: HashSet<ElementRef>,
    filtered_out: HashSet<ElementRef>,
    hovered: Option<String>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Highlight a node together with everything upstream and downstream of
    /// it and dim the rest. Returns false, leaving hover flags cleared, when
    /// the graph is over [`HOVER_HIGHLIGHT_LIMIT`] or the node is unknown.
    pub fn hover_node<B: GraphBackend + ?Sized>(&mut self, backend: &B, id: &str) -> bool {
        self.clear_hover();

        let count = backend.element_count();
        if count > HOVER_HIGHLIGHT_LIMIT {
            debug!("Hover highlight disabled for {} elements", count);
            return false;
        }
        if backend.node(id).is_none() {
            return false;
        }

        let mut highlighted: HashSet<ElementRef> = HashSet::new();
        highlighted.insert(ElementRef::node(id));
        highlighted.extend(backend.predecessors(id));
        highlighted.extend(backend.successors(id));

        let all = backend
            .nodes()
            .iter()
            .map(|n| ElementRef::node(&n.id))
            .chain(backend.edges().iter().map(|e| ElementRef::edge(&e.id)));
        self.hover_dimmed = all.filter(|e| !highlighted.contains(e)).collect();
        self.hover_highlighted = highlighted;
        self.hovered = Some(id.to_string());
        true
    }

    pub fn clear_hover(&mut self) {
        self.hover_highlighted.clear();
        self.hover_dimmed.clear();
        self.hovered = None;
    }

    /// Mark the elements of `kind` whose ids are in `matching` as filtered in
    /// and selected, the others as filtered out and unselected. `None` clears
    /// the filter.
    pub fn apply_filter<B: GraphBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        kind: ElementKind,
        matching: Option<&[String]>,
    ) {
        let previous: Vec<ElementRef> = self.filtered_in.drain().collect();
        self.filtered_out.clear();

        let Some(matching) = matching else {
            for element in previous {
                backend.unselect(&element);
            }
            return;
        };

        let matching: HashSet<&str> = matching.iter().map(String::as_str).collect();
        let ids: Vec<String> = match kind {
            ElementKind::Node => backend.nodes().iter().map(|n| n.id.clone()).collect(),
            ElementKind::Edge => backend.edges().iter().map(|e| e.id.clone()).collect(),
        };

        for id in ids {
            let element = ElementRef { kind, id };
            if matching.contains(element.id.as_str()) {
                backend.select(&element);
                self.filtered_in.insert(element);
            } else {
                backend.unselect(&element);
                self.filtered_out.insert(element);
            }
        }
        debug!(
            "Filter on {}s: {} in, {} out",
            kind,
            self.filtered_in.len(),
            self.filtered_out.len()
        );
    }

    pub fn clear(&mut self) {
        self.clear_hover();
        self.filtered_in.clear();
        self.filtered_out.clear();
    }

    /// Flags of one element, with selection read from the backend.
    pub fn flags_for(&self, element: &ElementRef, selected: bool) -> OverlayFlags {
        OverlayFlags {
            hover_highlighted: self.hover_highlighted.contains(element),
            hover_dimmed: self.hover_dimmed.contains(element),
            selected,
            filtered_in: self.filtered_in.contains(element),
            filtered_out: self.filtered_out.contains(element),
        }
    }
}
