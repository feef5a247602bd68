use indexmap::IndexMap;
use serde_json::json;
use vizmap::app_context::AppContext;
use vizmap::backend::{ElementKind, ElementRef, GraphBackend, Position};
use vizmap::coerce::DeclaredType;
use vizmap::document::{deserialize, serialize, DocumentShape};
use vizmap::errors::ImportError;
use vizmap::import::{suggest_edge_roles, ColumnRole, TabularData};
use vizmap::style::{MappingRequest, MappingStrategy, OutputRange, StrategyKind, VisualProperty};
use vizmap::value::AttributeValue;

fn styled_context() -> AppContext {
    let mut ctx = AppContext::in_memory("roundtrip");
    let edges = TabularData::from_strs(
        &["src", "dst", "weight", "evidence"],
        &[&["A", "B", "5", "exp| lit"], &["B", "C", "3", "exp"]],
    );
    ctx.import_edge_table(
        &edges,
        &[
            ColumnRole::Source,
            ColumnRole::Target,
            ColumnRole::attribute(DeclaredType::Number),
            ColumnRole::attribute(DeclaredType::StringArray),
        ],
    )
    .unwrap();
    let nodes = TabularData::from_strs(&["id", "type"], &[&["A", "db"], &["C", "svc"]]);
    ctx.import_node_table(
        &nodes,
        &[ColumnRole::Node, ColumnRole::attribute(DeclaredType::String)],
    )
    .unwrap();
    for (i, id) in ["A", "B", "C"].iter().enumerate() {
        ctx.backend_mut()
            .set_position(id, Position::new(i as f64 * 100.0, 50.0));
    }

    ctx.configure_mapping(&MappingRequest {
        kind: ElementKind::Node,
        property: VisualProperty::FillColor,
        column: "type".to_string(),
        strategy: Some(StrategyKind::Discrete),
        output: None,
        values: IndexMap::new(),
    })
    .unwrap();
    ctx.configure_mapping(&MappingRequest {
        kind: ElementKind::Edge,
        property: VisualProperty::LineColor,
        column: "weight".to_string(),
        strategy: Some(StrategyKind::Continuous),
        output: Some(OutputRange::Color {
            min: "#000000".to_string(),
            max: "#ffffff".to_string(),
        }),
        values: IndexMap::new(),
    })
    .unwrap();
    ctx
}

#[test]
fn test_serialize_deserialize_round_trip() {
    let ctx = styled_context();
    let doc = ctx.to_document().unwrap();
    let text = serde_json::to_string_pretty(&doc).unwrap();
    let decoded = deserialize(&serde_json::from_str(&text).unwrap()).unwrap();

    assert_eq!(decoded.shape, DocumentShape::Elements);
    let ids = |nodes: &[vizmap::graph::Node]| nodes.iter().map(|n| n.id.clone()).collect::<Vec<_>>();
    assert_eq!(ids(&decoded.nodes), ids(ctx.backend().nodes()));
    for (decoded, original) in decoded.nodes.iter().zip(ctx.backend().nodes()) {
        assert_eq!(decoded.attributes, original.attributes);
        assert_eq!(decoded.position, original.position);
    }
    for (decoded, original) in decoded.edges.iter().zip(ctx.backend().edges()) {
        assert_eq!(decoded.id, original.id);
        assert_eq!(decoded.attributes, original.attributes);
    }
    assert_eq!(decoded.style.as_ref(), Some(ctx.settings()));
}

#[test]
fn test_reopened_document_renders_the_same() {
    let ctx = styled_context();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("net.json");
    ctx.save_document(&path).unwrap();

    let mut reopened = AppContext::in_memory("reopened");
    reopened.open_path(&path).unwrap();
    // positions were saved, so no layout
    assert!(reopened.backend().layout_requests().is_empty());

    for id in ["A", "B", "C"] {
        let element = ElementRef::node(id);
        assert_eq!(
            reopened.backend().style_attributes(&element),
            ctx.backend().style_attributes(&element)
        );
    }
    let edge = ElementRef::edge("e0_A_B");
    assert_eq!(
        reopened.backend().style_attributes(&edge).map(|s| s["line-color"].clone()),
        Some(json!("#ffffff"))
    );
}

#[test]
fn test_document_is_plain_cytoscape_json() {
    let ctx = styled_context();
    let doc = serialize(ctx.backend(), ctx.settings(), ctx.edge_bends(), "plain").unwrap();
    let node = &doc["elements"]["nodes"][0];
    assert_eq!(node["data"]["id"], json!("A"));
    assert_eq!(node["data"]["label"], json!("A"));
    assert_eq!(node["position"]["x"], json!(0.0));
    let edge = &doc["elements"]["edges"][0]["data"];
    assert_eq!(edge["evidence"], json!(["exp", "lit"]));
    assert_eq!(edge["weight"], json!(5));
}

#[test]
fn test_legacy_joined_arrays_are_split() {
    let doc = json!({
        "elements": {
            "nodes": [
                {"data": {"id": "A", "go": ["binding| transport| "]}},
                {"data": {"id": "B", "go": ["single"]}}
            ],
            "edges": [{"data": {"id": "ab", "source": "A", "target": "B"}}]
        }
    });
    let mut ctx = AppContext::in_memory("legacy");
    ctx.open_document(&doc).unwrap();

    let go = |id: &str| ctx.backend().node(id).and_then(|n| n.attributes.get("go").cloned());
    assert_eq!(
        go("A"),
        Some(AttributeValue::Array(vec!["binding".into(), "transport".into()]))
    );
    assert_eq!(go("B"), Some(AttributeValue::Array(vec!["single".into()])));
    // no positions, so a layout was requested
    assert_eq!(ctx.backend().layout_requests().len(), 1);
}

#[test]
fn test_cx2_document_opens() {
    let doc = json!([
        {"CXVersion": "2.0"},
        {"nodes": [{"id": 1, "v": {"name": "TP53"}}, {"id": 2, "v": {"name": "MDM2"}}]},
        {"edges": [{"id": 5, "s": 2, "t": 1, "v": {"interaction": "inhibits"}}]}
    ]);
    let mut ctx = AppContext::in_memory("cx2");
    assert_eq!(ctx.open_document(&doc).unwrap(), DocumentShape::Cx2);
    let edge = ctx.backend().edge("e5").unwrap();
    assert_eq!((edge.source.as_str(), edge.target.as_str()), ("MDM2", "TP53"));
    assert!(matches!(
        ctx.settings().node[&VisualProperty::FillColor].strategy,
        MappingStrategy::None
    ));
}

#[test]
fn test_round_trip_with_reserved_header_column() {
    let table = TabularData::from_strs(
        &["src", "dst", "source", "score"],
        &[&["A", "B", "PubMed", "7"], &["B", "C", "OMIM", "2"]],
    );
    let mut ctx = AppContext::in_memory("provenance");

    let mut roles = suggest_edge_roles(&table);
    roles[2] = ColumnRole::attribute(DeclaredType::String);
    let err = ctx.import_edge_table(&table, &roles).unwrap_err();
    assert!(matches!(err, ImportError::ReservedAttributeName { index: 2, .. }));
    assert_eq!(ctx.stats().edges, 0);

    ctx.import_edge_table(&table, &suggest_edge_roles(&table)).unwrap();
    let endpoints = |edges: &[vizmap::graph::Edge]| {
        edges
            .iter()
            .map(|e| (e.id.clone(), e.source.clone(), e.target.clone()))
            .collect::<Vec<_>>()
    };
    let before = endpoints(ctx.backend().edges());
    assert_eq!(before[0], ("e0_A_B".to_string(), "A".to_string(), "B".to_string()));

    let doc = serialize(ctx.backend(), ctx.settings(), ctx.edge_bends(), "p").unwrap();
    let decoded = deserialize(&doc).unwrap();
    assert_eq!(endpoints(&decoded.edges), before);
    assert_eq!(decoded.edges[0].attributes["score"], AttributeValue::Int(7));
}

#[test]
fn test_bend_strength_round_trip() {
    let mut ctx = styled_context();
    assert_eq!(ctx.edge_bends().bend_strength, 40);
    ctx.set_bend_strength(70);

    let decoded = deserialize(&ctx.to_document().unwrap()).unwrap();
    assert_eq!(decoded.edge_bends.bend_strength, 70);

    let mut reopened = AppContext::in_memory("reopened");
    reopened.open_document(&ctx.to_document().unwrap()).unwrap();
    assert_eq!(reopened.edge_bends(), ctx.edge_bends());
}
