//! The render collaborator seam.
//!
//! Everything the mapping engine, the import pipeline and the document codec
//! need from a graph renderer goes through [`GraphBackend`]. The crate ships
//! one implementation, [`crate::graph::InMemoryGraph`], which is what the
//! batch driver and the tests run against.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum::{Display as StrumDisplay, EnumString};

use crate::graph::{Edge, Node};
use crate::value::AttributeValue;

/// Concrete renderer style keys for one element, e.g. `background-color`.
pub type StyleAttributes = serde_json::Map<String, serde_json::Value>;

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, StrumDisplay, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    Node,
    Edge,
}

/// Identifies one element. Node and edge ids live in separate namespaces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub id: String,
}

impl ElementRef {
    pub fn node(id: impl Into<String>) -> Self {
        ElementRef {
            kind: ElementKind::Node,
            id: id.into(),
        }
    }

    pub fn edge(id: impl Into<String>) -> Self {
        ElementRef {
            kind: ElementKind::Edge,
            id: id.into(),
        }
    }
}

impl Display for ElementRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Position { x, y }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
        let mut iter = positions.into_iter();
        let first = iter.next()?;
        let (mut x1, mut y1, mut x2, mut y2) = (first.x, first.y, first.x, first.y);
        for p in iter {
            x1 = x1.min(p.x);
            y1 = y1.min(p.y);
            x2 = x2.max(p.x);
            y2 = y2.max(p.y);
        }
        Some(BoundingBox {
            x1,
            y1,
            x2,
            y2,
            w: x2 - x1,
            h: y2 - y1,
        })
    }
}

/// Options handed to the external layout engine.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutOptions {
    pub name: String,
    pub rank_dir: String,
    pub node_sep: f64,
    pub edge_sep: f64,
    pub rank_sep: f64,
    pub fit: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            name: "dagre".to_string(),
            rank_dir: "TB".to_string(),
            node_sep: 50.0,
            edge_sep: 10.0,
            rank_sep: 80.0,
            fit: true,
        }
    }
}

/// Read access to the attribute bag of a single element.
pub trait AttributeSource {
    fn attribute(&self, key: &str) -> Option<&AttributeValue>;
}

/// Operations consumed from the graph renderer.
pub trait GraphBackend {
    /// Add nodes then edges. Nodes with an existing id replace the stored node.
    fn add_elements(&mut self, nodes: Vec<Node>, edges: Vec<Edge>);

    fn remove_all_elements(&mut self);

    fn nodes(&self) -> &[Node];

    fn edges(&self) -> &[Edge];

    fn node(&self, id: &str) -> Option<&Node>;

    fn node_mut(&mut self, id: &str) -> Option<&mut Node>;

    fn edge(&self, id: &str) -> Option<&Edge>;

    fn attribute(&self, element: &ElementRef, key: &str) -> Option<&AttributeValue> {
        match element.kind {
            ElementKind::Node => self.node(&element.id)?.attribute(key),
            ElementKind::Edge => self.edge(&element.id)?.attribute(key),
        }
    }

    /// Replace the render style of an element. Unknown ids are ignored.
    fn set_style_attributes(&mut self, element: &ElementRef, style: StyleAttributes);

    fn style_attributes(&self, element: &ElementRef) -> Option<&StyleAttributes>;

    fn position(&self, id: &str) -> Option<Position> {
        self.node(id).and_then(|n| n.position)
    }

    fn set_position(&mut self, id: &str, position: Position) {
        if let Some(node) = self.node_mut(id) {
            node.position = Some(position);
        }
    }

    fn selected(&self) -> Vec<ElementRef>;

    fn select(&mut self, element: &ElementRef);

    fn unselect(&mut self, element: &ElementRef);

    fn unselect_all(&mut self) {
        for element in self.selected() {
            self.unselect(&element);
        }
    }

    /// Directly connected nodes and the edges connecting them.
    fn neighbors(&self, id: &str) -> Vec<ElementRef>;

    /// Every node and edge upstream of a node, following edges backwards.
    fn predecessors(&self, id: &str) -> Vec<ElementRef>;

    /// Every node and edge downstream of a node.
    fn successors(&self, id: &str) -> Vec<ElementRef>;

    fn bounding_box(&self) -> Option<BoundingBox> {
        let positions: Vec<Position> = self.nodes().iter().filter_map(|n| n.position).collect();
        BoundingBox::from_positions(positions.iter())
    }

    fn run_layout(&mut self, options: &LayoutOptions);

    fn element_count(&self) -> usize {
        self.nodes().len() + self.edges().len()
    }
}
