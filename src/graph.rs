use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::backend::{
    AttributeSource, ElementKind, ElementRef, GraphBackend, LayoutOptions, Position,
    StyleAttributes,
};
use crate::value::AttributeValue;

/// Attribute key holding a node's display label.
pub const LABEL_KEY: &str = "label";

pub type Attributes = IndexMap<String, AttributeValue>;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip)]
    pub style: StyleAttributes,
}

impl Node {
    /// A fresh node labelled with its own id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut attributes = Attributes::new();
        attributes.insert(LABEL_KEY.to_string(), AttributeValue::String(id.clone()));
        Node {
            id,
            attributes,
            position: None,
            style: StyleAttributes::new(),
        }
    }

    pub fn label(&self) -> String {
        self.attributes
            .get(LABEL_KEY)
            .map(|v| v.to_string())
            .unwrap_or_else(|| self.id.clone())
    }

    /// Overwrite same-named attributes. An absent value removes the attribute.
    pub fn merge_attributes<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, Option<AttributeValue>)>,
    {
        for (key, value) in values {
            match value {
                Some(value) => {
                    self.attributes.insert(key, value);
                }
                None => {
                    self.attributes.shift_remove(&key);
                }
            }
        }
    }
}

impl AttributeSource for Node {
    fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(skip)]
    pub style: StyleAttributes,
}

impl Edge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Edge {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            attributes: Attributes::new(),
            style: StyleAttributes::new(),
        }
    }
}

impl AttributeSource for Edge {
    fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }
}

/// Graph store standing in for the renderer in headless runs and tests.
///
/// Layout is delegated: `run_layout` only records the request, positions are
/// whatever the caller or a loaded document assigned.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGraph {
    pub name: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_index: HashMap<String, usize>,
    edge_index: HashMap<String, usize>,
    selected: IndexSet<ElementRef>,
    layout_requests: Vec<LayoutOptions>,
}

impl InMemoryGraph {
    pub fn new(name: &str) -> Self {
        InMemoryGraph {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn layout_requests(&self) -> &[LayoutOptions] {
        &self.layout_requests
    }

    pub fn last_layout(&self) -> Option<&LayoutOptions> {
        self.layout_requests.last()
    }

    pub fn stats(&self) -> String {
        format!("Nodes: {}, Edges: {}", self.nodes.len(), self.edges.len())
    }

    fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        let idx = *self.edge_index.get(id)?;
        self.edges.get_mut(idx)
    }

    fn upsert_node(&mut self, node: Node) {
        match self.node_index.get(&node.id) {
            Some(&idx) => self.nodes[idx] = node,
            None => {
                self.node_index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node);
            }
        }
    }

    fn upsert_edge(&mut self, edge: Edge) {
        match self.edge_index.get(&edge.id) {
            Some(&idx) => self.edges[idx] = edge,
            None => {
                self.edge_index.insert(edge.id.clone(), self.edges.len());
                self.edges.push(edge);
            }
        }
    }

    /// Breadth-first walk along edges. `forward` follows source to target.
    fn reachable(&self, start: &str, forward: bool) -> Vec<ElementRef> {
        let mut seen_nodes: HashSet<&str> = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();
        seen_nodes.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for edge in &self.edges {
                let (from, to) = if forward {
                    (&edge.source, &edge.target)
                } else {
                    (&edge.target, &edge.source)
                };
                if from != current {
                    continue;
                }
                result.push(ElementRef::edge(&edge.id));
                if seen_nodes.insert(to.as_str()) {
                    result.push(ElementRef::node(to));
                    queue.push_back(to.as_str());
                }
            }
        }
        result
    }

    /// Structural problems: dangling edge endpoints and duplicate ids.
    pub fn verify_graph_integrity(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for edge in &self.edges {
            if !self.node_index.contains_key(&edge.source) {
                errors.push(format!(
                    "Edge id:[{}] source {:?} not found in nodes",
                    edge.id, edge.source
                ));
            }
            if !self.node_index.contains_key(&edge.target) {
                errors.push(format!(
                    "Edge id:[{}] target {:?} not found in nodes",
                    edge.id, edge.target
                ));
            }
        }

        if self.node_index.len() != self.nodes.len() {
            errors.push("Duplicate node ids present".to_string());
        }
        if self.edge_index.len() != self.edges.len() {
            errors.push("Duplicate edge ids present".to_string());
        }

        if errors.is_empty() {
            debug!("All edges have valid source and target nodes");
            Ok(())
        } else {
            warn!("Graph integrity check found {} problems", errors.len());
            Err(errors)
        }
    }
}

impl GraphBackend for InMemoryGraph {
    fn add_elements(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        for node in nodes {
            self.upsert_node(node);
        }
        for edge in edges {
            if !self.node_index.contains_key(&edge.source)
                || !self.node_index.contains_key(&edge.target)
            {
                warn!(
                    "Skipping edge {} with missing endpoint ({} -> {})",
                    edge.id, edge.source, edge.target
                );
                continue;
            }
            self.upsert_edge(edge);
        }
        debug!("Graph now holds {}", self.stats());
    }

    fn remove_all_elements(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.node_index.clear();
        self.edge_index.clear();
        self.selected.clear();
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).and_then(|&idx| self.nodes.get(idx))
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let idx = *self.node_index.get(id)?;
        self.nodes.get_mut(idx)
    }

    fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).and_then(|&idx| self.edges.get(idx))
    }

    fn set_style_attributes(&mut self, element: &ElementRef, style: StyleAttributes) {
        match element.kind {
            ElementKind::Node => {
                if let Some(node) = self.node_mut(&element.id) {
                    node.style = style;
                }
            }
            ElementKind::Edge => {
                if let Some(edge) = self.edge_mut(&element.id) {
                    edge.style = style;
                }
            }
        }
    }

    fn style_attributes(&self, element: &ElementRef) -> Option<&StyleAttributes> {
        match element.kind {
            ElementKind::Node => self.node(&element.id).map(|n| &n.style),
            ElementKind::Edge => self.edge(&element.id).map(|e| &e.style),
        }
    }

    fn selected(&self) -> Vec<ElementRef> {
        self.selected.iter().cloned().collect()
    }

    fn select(&mut self, element: &ElementRef) {
        let exists = match element.kind {
            ElementKind::Node => self.node_index.contains_key(&element.id),
            ElementKind::Edge => self.edge_index.contains_key(&element.id),
        };
        if exists {
            self.selected.insert(element.clone());
        }
    }

    fn unselect(&mut self, element: &ElementRef) {
        self.selected.shift_remove(element);
    }

    fn neighbors(&self, id: &str) -> Vec<ElementRef> {
        let mut result = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for edge in &self.edges {
            let other = if edge.source == id {
                &edge.target
            } else if edge.target == id {
                &edge.source
            } else {
                continue;
            };
            result.push(ElementRef::edge(&edge.id));
            if seen.insert(other.as_str()) {
                result.push(ElementRef::node(other));
            }
        }
        result
    }

    fn predecessors(&self, id: &str) -> Vec<ElementRef> {
        self.reachable(id, false)
    }

    fn successors(&self, id: &str) -> Vec<ElementRef> {
        self.reachable(id, true)
    }

    fn run_layout(&mut self, options: &LayoutOptions) {
        debug!(
            "Layout '{}' requested for {} nodes",
            options.name,
            self.nodes.len()
        );
        self.layout_requests.push(options.clone());
    }
}
