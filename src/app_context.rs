use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::backend::{ElementKind, GraphBackend, LayoutOptions, Position};
use crate::document::{self, DocumentContents, DocumentShape, EdgeBendSettings};
use crate::errors::{DocumentResult, ImportResult, StyleResult};
use crate::graph::{Edge, InMemoryGraph, Node};
use crate::import::{import_edges, import_node_attributes, ColumnRole, TabularData};
use crate::overlay::OverlayState;
use crate::stats::attribute_columns;
use crate::style::{apply_all, ApplySummary, MappingRequest, StyleSettings, VisualProperty, VisualValue};

/// Node and edge counts of the open graph.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
}

/// What an import added to the graph.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub nodes_added: usize,
    pub nodes_updated: usize,
    pub edges_added: usize,
    pub skipped_rows: usize,
}

/// State of one open document: the graph, its style settings and the
/// interaction overlay. Every mutating operation ends with a full style pass.
///
/// Opening a document replaces all three. Nothing carries over between
/// documents.
#[derive(Debug)]
pub struct AppContext<B: GraphBackend = InMemoryGraph> {
    pub name: String,
    backend: B,
    settings: StyleSettings,
    edge_bends: EdgeBendSettings,
    overlay: OverlayState,
}

impl AppContext<InMemoryGraph> {
    pub fn in_memory(name: &str) -> Self {
        AppContext::new(name, InMemoryGraph::new(name))
    }
}

impl<B: GraphBackend> AppContext<B> {
    pub fn new(name: &str, backend: B) -> Self {
        AppContext {
            name: name.to_string(),
            backend,
            settings: StyleSettings::default(),
            edge_bends: EdgeBendSettings::default(),
            overlay: OverlayState::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn settings(&self) -> &StyleSettings {
        &self.settings
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn edge_bends(&self) -> EdgeBendSettings {
        self.edge_bends
    }

    pub fn set_bend_strength(&mut self, bend_strength: u32) {
        self.edge_bends = EdgeBendSettings { bend_strength };
    }

    /// Recompute every element's render attributes.
    pub fn apply_styles(&mut self) -> ApplySummary {
        apply_all(&mut self.backend, &mut self.settings, &self.overlay)
    }

    /// `id`, or `id_N` with the smallest free N when `id` is in use.
    fn unique_edge_id(&self, id: String, batch: &HashSet<String>) -> String {
        let taken = |candidate: &str| self.backend.edge(candidate).is_some() || batch.contains(candidate);
        if !taken(&id) {
            return id;
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}_{}", id, n);
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Import an edge table.
    ///
    /// Endpoints that already exist keep their attributes. Edges are always
    /// appended, ids that collide with earlier imports get a numeric suffix.
    /// A layout is requested afterwards.
    pub fn import_edge_table(
        &mut self,
        table: &TabularData,
        roles: &[ColumnRole],
    ) -> ImportResult<ImportSummary> {
        let imported = import_edges(table, roles)?;
        self.overlay.clear_hover();

        let nodes: Vec<Node> = imported
            .nodes
            .into_iter()
            .filter(|n| self.backend.node(&n.id).is_none())
            .collect();
        let mut batch = HashSet::new();
        let mut edges: Vec<Edge> = Vec::with_capacity(imported.edges.len());
        for mut edge in imported.edges {
            edge.id = self.unique_edge_id(std::mem::take(&mut edge.id), &batch);
            batch.insert(edge.id.clone());
            edges.push(edge);
        }

        let summary = ImportSummary {
            nodes_added: nodes.len(),
            nodes_updated: 0,
            edges_added: edges.len(),
            skipped_rows: imported.skipped_rows,
        };
        self.backend.add_elements(nodes, edges);
        self.backend.run_layout(&LayoutOptions::default());
        self.apply_styles();

        info!("Imported edge table: {:?}", summary);
        Ok(summary)
    }

    /// Merge a node table into the graph. Existing nodes keep their
    /// positions and no layout is requested.
    pub fn import_node_table(
        &mut self,
        table: &TabularData,
        roles: &[ColumnRole],
    ) -> ImportResult<ImportSummary> {
        let imported = import_node_attributes(table, roles)?;
        self.overlay.clear_hover();

        let positions: Vec<(String, Position)> = self
            .backend
            .nodes()
            .iter()
            .filter_map(|n| Some((n.id.clone(), self.backend.position(&n.id)?)))
            .collect();

        let mut summary = ImportSummary {
            skipped_rows: imported.skipped_rows,
            ..Default::default()
        };
        let mut created: Vec<Node> = Vec::new();
        for record in imported.records {
            match self.backend.node_mut(&record.id) {
                Some(node) => {
                    node.merge_attributes(record.attributes);
                    summary.nodes_updated += 1;
                }
                None => {
                    // The same id may appear on several rows.
                    match created.iter_mut().find(|n| n.id == record.id) {
                        Some(node) => node.merge_attributes(record.attributes),
                        None => {
                            let mut node = Node::new(record.id);
                            node.merge_attributes(record.attributes);
                            created.push(node);
                        }
                    }
                }
            }
        }
        summary.nodes_added = created.len();
        self.backend.add_elements(created, Vec::new());

        for (id, position) in positions {
            self.backend.set_position(&id, position);
        }
        self.apply_styles();

        info!("Imported node table: {:?}", summary);
        Ok(summary)
    }

    fn replace_with(&mut self, contents: DocumentContents) -> DocumentShape {
        let needs_layout = !contents.nodes.is_empty() && !contents.has_positions();

        self.backend.remove_all_elements();
        self.overlay.clear();
        self.settings = contents.style.unwrap_or_default();
        self.edge_bends = contents.edge_bends;
        self.backend.add_elements(contents.nodes, contents.edges);
        if needs_layout {
            debug!("Document has no positions, requesting layout");
            self.backend.run_layout(&LayoutOptions::default());
        }
        self.apply_styles();
        contents.shape
    }

    /// Replace the open document. The new document is decoded completely
    /// before anything is cleared, so a bad document leaves state untouched.
    pub fn open_document(&mut self, doc: &Value) -> DocumentResult<DocumentShape> {
        let contents = document::deserialize(doc)?;
        Ok(self.replace_with(contents))
    }

    pub fn open_path(&mut self, path: &Path) -> DocumentResult<DocumentShape> {
        let contents = document::read_document(path)?;
        Ok(self.replace_with(contents))
    }

    pub fn to_document(&self) -> DocumentResult<Value> {
        document::serialize(&self.backend, &self.settings, self.edge_bends, &self.name)
    }

    pub fn save_document(&self, path: &Path) -> DocumentResult<()> {
        document::write_document(
            path,
            &self.backend,
            &self.settings,
            self.edge_bends,
            &self.name,
        )
    }

    /// Load only the style settings of a document, keeping the graph.
    pub fn load_style_from(&mut self, path: &Path) -> DocumentResult<bool> {
        let contents = document::read_document(path)?;
        let Some(style) = contents.style else {
            return Ok(false);
        };
        self.settings = style;
        self.apply_styles();
        Ok(true)
    }

    pub fn configure_mapping(&mut self, request: &MappingRequest) -> StyleResult<ApplySummary> {
        self.settings.configure_mapping(request, &self.backend)?;
        Ok(self.apply_styles())
    }

    pub fn set_default(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
        value: VisualValue,
    ) -> StyleResult<ApplySummary> {
        self.settings.set_default(kind, property, value)?;
        Ok(self.apply_styles())
    }

    pub fn set_mapping_active(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
        active: bool,
    ) -> StyleResult<ApplySummary> {
        self.settings.set_active(kind, property, active)?;
        Ok(self.apply_styles())
    }

    pub fn refresh_continuous_domain(
        &mut self,
        kind: ElementKind,
        property: VisualProperty,
    ) -> StyleResult<ApplySummary> {
        self.settings
            .refresh_continuous_domain(kind, property, &self.backend)?;
        Ok(self.apply_styles())
    }

    /// Hover a node. Returns whether the neighbourhood was highlighted.
    pub fn hover(&mut self, id: &str) -> bool {
        let highlighted = self.overlay.hover_node(&self.backend, id);
        self.apply_styles();
        highlighted
    }

    pub fn unhover(&mut self) {
        self.overlay.clear_hover();
        self.apply_styles();
    }

    /// Highlight table filter matches; `None` clears the filter.
    pub fn apply_filter(&mut self, kind: ElementKind, matching: Option<&[String]>) {
        self.overlay.apply_filter(&mut self.backend, kind, matching);
        self.apply_styles();
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.backend.nodes().len(),
            edges: self.backend.edges().len(),
        }
    }

    /// Columns available for mapping on `kind`.
    pub fn attribute_columns(&self, kind: ElementKind) -> Vec<String> {
        attribute_columns(self.backend.nodes(), self.backend.edges(), kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AttributeSource, ElementRef};
    use crate::coerce::DeclaredType;
    use crate::style::{StrategyKind, OutputRange};
    use crate::value::AttributeValue;
    use indexmap::IndexMap;
    use serde_json::json;

    fn edge_table() -> (TabularData, Vec<ColumnRole>) {
        let table = TabularData::from_strs(
            &["src", "dst", "weight"],
            &[&["A", "B", "5"], &["B", "C", "3"]],
        );
        let roles = vec![
            ColumnRole::Source,
            ColumnRole::Target,
            ColumnRole::attribute(DeclaredType::Number),
        ];
        (table, roles)
    }

    #[test]
    fn test_edge_import_requests_layout_and_styles() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        let summary = ctx.import_edge_table(&table, &roles).unwrap();

        assert_eq!(summary.nodes_added, 3);
        assert_eq!(summary.edges_added, 2);
        assert_eq!(ctx.backend().layout_requests().len(), 1);
        let style = ctx.backend().style_attributes(&ElementRef::node("A")).unwrap();
        assert_eq!(style["background-color"], json!("#2563eb"));
        assert_eq!(ctx.stats(), GraphStats { nodes: 3, edges: 2 });
    }

    #[test]
    fn test_reimporting_edges_appends_with_fresh_ids() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        let summary = ctx.import_edge_table(&table, &roles).unwrap();

        assert_eq!(summary.nodes_added, 0);
        assert_eq!(summary.edges_added, 2);
        assert_eq!(ctx.stats().edges, 4);
        assert!(ctx.backend().edge("e0_A_B_1").is_some());
        assert!(ctx.backend().verify_graph_integrity().is_ok());
    }

    #[test]
    fn test_validation_failure_leaves_graph_untouched() {
        let mut ctx = AppContext::in_memory("test");
        let (table, _) = edge_table();
        let roles = vec![ColumnRole::Source, ColumnRole::Ignore, ColumnRole::Ignore];
        assert!(ctx.import_edge_table(&table, &roles).is_err());
        assert_eq!(ctx.stats(), GraphStats::default());
        assert!(ctx.backend().layout_requests().is_empty());
    }

    #[test]
    fn test_node_import_keeps_positions_and_skips_layout() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        ctx.backend_mut().set_position("A", Position::new(5.0, 7.0));

        let nodes = TabularData::from_strs(&["id", "kind"], &[&["A", "db"], &["D", "svc"]]);
        let node_roles = vec![ColumnRole::Node, ColumnRole::attribute(DeclaredType::String)];
        let summary = ctx.import_node_table(&nodes, &node_roles).unwrap();

        assert_eq!(summary.nodes_updated, 1);
        assert_eq!(summary.nodes_added, 1);
        assert_eq!(ctx.backend().layout_requests().len(), 1);
        assert_eq!(ctx.backend().position("A"), Some(Position::new(5.0, 7.0)));
        assert_eq!(
            ctx.backend().node("A").and_then(|n| n.attribute("kind")),
            Some(&AttributeValue::from("db"))
        );
        assert_eq!(ctx.backend().node("D").map(|n| n.label()), Some("D".to_string()));
    }

    #[test]
    fn test_configure_mapping_restyles() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        ctx.configure_mapping(&MappingRequest {
            kind: ElementKind::Edge,
            property: VisualProperty::Width,
            column: "weight".to_string(),
            strategy: Some(StrategyKind::Continuous),
            output: Some(OutputRange::Number { min: 10.0, max: 20.0 }),
            values: IndexMap::new(),
        })
        .unwrap();

        let width = |id: &str| {
            ctx.backend()
                .style_attributes(&ElementRef::edge(id))
                .map(|s| s["width"].clone())
        };
        assert_eq!(width("e0_A_B"), Some(json!(20)));
        assert_eq!(width("e1_B_C"), Some(json!(10)));
    }

    #[test]
    fn test_open_document_replaces_everything() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        ctx.set_default(ElementKind::Node, VisualProperty::FillColor, "#000000".into())
            .unwrap();
        ctx.hover("A");

        let shape = ctx
            .open_document(&json!({"elements": {"nodes": [{"data": {"id": "x"}}], "edges": []}}))
            .unwrap();
        assert_eq!(shape, DocumentShape::Elements);
        assert_eq!(ctx.stats(), GraphStats { nodes: 1, edges: 0 });
        assert_eq!(ctx.settings(), &StyleSettings::default());
        assert!(ctx.overlay().hovered().is_none());
        // no positions in the document
        assert_eq!(ctx.backend().layout_requests().len(), 2);
    }

    #[test]
    fn test_bad_document_keeps_current_state() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();

        assert!(ctx.open_document(&json!({"nodes": []})).is_err());
        let bad_element = json!({"elements": {"nodes": [{"data": {"id": "x"}}, {"data": {}}]}});
        assert!(ctx.open_document(&bad_element).is_err());
        assert_eq!(ctx.stats(), GraphStats { nodes: 3, edges: 2 });
    }

    #[test]
    fn test_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        ctx.save_document(&path).unwrap();

        let mut reopened = AppContext::in_memory("other");
        reopened.open_path(&path).unwrap();
        assert_eq!(reopened.stats(), ctx.stats());
        assert_eq!(reopened.attribute_columns(ElementKind::Edge), vec!["weight".to_string()]);
    }

    #[test]
    fn test_import_clears_hover() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        assert!(ctx.hover("A"));

        let more = TabularData::from_strs(&["src", "dst"], &[&["C", "D"]]);
        ctx.import_edge_table(&more, &[ColumnRole::Source, ColumnRole::Target])
            .unwrap();
        assert!(ctx.overlay().hovered().is_none());
        let flags = ctx.overlay().flags_for(&ElementRef::node("B"), false);
        assert!(!flags.hover_highlighted && !flags.hover_dimmed);

        assert!(ctx.hover("A"));
        let nodes = TabularData::from_strs(&["id", "kind"], &[&["A", "db"]]);
        ctx.import_node_table(
            &nodes,
            &[ColumnRole::Node, ColumnRole::attribute(DeclaredType::String)],
        )
        .unwrap();
        assert!(ctx.overlay().hovered().is_none());
    }

    #[test]
    fn test_bend_strength_survives_reopen() {
        let mut ctx = AppContext::in_memory("test");
        ctx.open_document(&json!({
            "elements": {"nodes": [{"data": {"id": "a"}, "position": {"x": 0, "y": 0}}]},
            "appExtensions": {"edgeBendsSettings": {"bendStrength": 70}}
        }))
        .unwrap();
        assert_eq!(ctx.edge_bends().bend_strength, 70);

        let doc = ctx.to_document().unwrap();
        assert_eq!(doc["appExtensions"]["edgeBendsSettings"]["bendStrength"], json!(70));

        ctx.set_bend_strength(15);
        let mut reopened = AppContext::in_memory("other");
        reopened.open_document(&ctx.to_document().unwrap()).unwrap();
        assert_eq!(reopened.edge_bends().bend_strength, 15);
    }

    #[test]
    fn test_filter_selects_matches() {
        let mut ctx = AppContext::in_memory("test");
        let (table, roles) = edge_table();
        ctx.import_edge_table(&table, &roles).unwrap();
        ctx.apply_filter(ElementKind::Node, Some(&["B".to_string()]));

        assert_eq!(ctx.backend().selected(), vec![ElementRef::node("B")]);
        let style = ctx.backend().style_attributes(&ElementRef::node("B")).unwrap();
        assert_eq!(style["overlay-opacity"], json!(0.4));

        ctx.apply_filter(ElementKind::Node, None);
        assert!(ctx.backend().selected().is_empty());
    }
}
