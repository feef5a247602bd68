use std::cell::Cell;

use indexmap::IndexMap;
use serde_json::json;
use vizmap::app_context::AppContext;
use vizmap::backend::{
    ElementKind, ElementRef, GraphBackend, LayoutOptions, StyleAttributes,
};
use vizmap::graph::{Edge, InMemoryGraph, Node};
use vizmap::style::{
    resolve, ContinuousRange, MappingRequest, MappingRule, MappingStrategy, OutputRange,
    StrategyKind, VisualProperty, VisualValue,
};
use vizmap::value::AttributeValue;

/// Delegating backend that counts neighbourhood queries.
struct CountingGraph {
    inner: InMemoryGraph,
    traversals: Cell<usize>,
}

impl GraphBackend for CountingGraph {
    fn add_elements(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
        self.inner.add_elements(nodes, edges)
    }
    fn remove_all_elements(&mut self) {
        self.inner.remove_all_elements()
    }
    fn nodes(&self) -> &[Node] {
        self.inner.nodes()
    }
    fn edges(&self) -> &[Edge] {
        self.inner.edges()
    }
    fn node(&self, id: &str) -> Option<&Node> {
        self.inner.node(id)
    }
    fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.inner.node_mut(id)
    }
    fn edge(&self, id: &str) -> Option<&Edge> {
        self.inner.edge(id)
    }
    fn set_style_attributes(&mut self, element: &ElementRef, style: StyleAttributes) {
        self.inner.set_style_attributes(element, style)
    }
    fn style_attributes(&self, element: &ElementRef) -> Option<&StyleAttributes> {
        self.inner.style_attributes(element)
    }
    fn selected(&self) -> Vec<ElementRef> {
        self.inner.selected()
    }
    fn select(&mut self, element: &ElementRef) {
        self.inner.select(element)
    }
    fn unselect(&mut self, element: &ElementRef) {
        self.inner.unselect(element)
    }
    fn neighbors(&self, id: &str) -> Vec<ElementRef> {
        self.traversals.set(self.traversals.get() + 1);
        self.inner.neighbors(id)
    }
    fn predecessors(&self, id: &str) -> Vec<ElementRef> {
        self.traversals.set(self.traversals.get() + 1);
        self.inner.predecessors(id)
    }
    fn successors(&self, id: &str) -> Vec<ElementRef> {
        self.traversals.set(self.traversals.get() + 1);
        self.inner.successors(id)
    }
    fn run_layout(&mut self, options: &LayoutOptions) {
        self.inner.run_layout(options)
    }
}

fn chain_context(len: usize) -> AppContext<CountingGraph> {
    let mut inner = InMemoryGraph::new("chain");
    let nodes = (0..len).map(|i| Node::new(format!("n{}", i))).collect();
    let edges = (1..len)
        .map(|i| Edge::new(format!("e{}", i), format!("n{}", i - 1), format!("n{}", i)))
        .collect();
    inner.add_elements(nodes, edges);
    AppContext::new(
        "chain",
        CountingGraph {
            inner,
            traversals: Cell::new(0),
        },
    )
}

fn weighted_node(id: &str, weight: i64) -> Node {
    let mut node = Node::new(id);
    node.attributes
        .insert("weight".to_string(), AttributeValue::Int(weight));
    node
}

#[test]
fn test_hover_skips_traversal_on_large_graphs() {
    let mut ctx = chain_context(1500);
    ctx.backend_mut()
        .add_elements(vec![Node::new("lonely")], vec![]);
    assert_eq!(ctx.backend().element_count(), 3000);
    assert!(!ctx.hover("n10"));
    assert_eq!(ctx.backend().traversals.get(), 0);
    assert!(ctx.overlay().hovered().is_none());

    let mut small = chain_context(10);
    assert!(small.hover("n5"));
    assert!(small.backend().traversals.get() > 0);
    let style = small
        .backend()
        .style_attributes(&ElementRef::node("n0"))
        .unwrap();
    assert_eq!(style["background-color"], json!("#ff1493"));
}

#[test]
fn test_continuous_size_scenario() {
    let rule = MappingRule {
        active: true,
        column: "weight".to_string(),
        strategy: MappingStrategy::Continuous(ContinuousRange {
            domain_min: 3.0,
            domain_max: 5.0,
            output: OutputRange::Number {
                min: 10.0,
                max: 20.0,
            },
        }),
        default_value: VisualValue::Number(40.0),
    };
    let size = |w| resolve(&weighted_node("n", w), VisualProperty::Size, &rule);
    assert_eq!(size(3), VisualValue::Number(10.0));
    assert_eq!(size(4), VisualValue::Number(15.0));
    assert_eq!(size(5), VisualValue::Number(20.0));

    let mut previous = f64::MIN;
    for w in 3..=5 {
        let current = size(w).as_number().unwrap();
        assert!(current >= previous);
        previous = current;
    }
}

#[test]
fn test_unseen_discrete_value_gets_default_and_is_seeded() {
    let mut ctx = AppContext::in_memory("test");
    let mut a = Node::new("a");
    a.attributes.insert("type".to_string(), "kinase".into());
    ctx.backend_mut().add_elements(vec![a], vec![]);
    ctx.configure_mapping(&MappingRequest {
        kind: ElementKind::Node,
        property: VisualProperty::FillColor,
        column: "type".to_string(),
        strategy: Some(StrategyKind::Discrete),
        output: None,
        values: IndexMap::from([("kinase".to_string(), VisualValue::from("#ff0000"))]),
    })
    .unwrap();

    let mut x = Node::new("x");
    x.attributes.insert("type".to_string(), "X".into());
    ctx.backend_mut().add_elements(vec![x], vec![]);
    let summary = ctx.apply_styles();
    assert_eq!(summary.seeded, 1);

    let fill = |ctx: &AppContext, id: &str| {
        ctx.backend()
            .style_attributes(&ElementRef::node(id))
            .map(|s| s["background-color"].clone())
    };
    assert_eq!(fill(&ctx, "x"), Some(json!("#2563eb")));
    assert_eq!(fill(&ctx, "a"), Some(json!("#ff0000")));

    let rule = &ctx.settings().node[&VisualProperty::FillColor];
    match &rule.strategy {
        MappingStrategy::Discrete { values } => {
            assert_eq!(values.get("X"), Some(&VisualValue::from("#2563eb")));
        }
        other => panic!("unexpected strategy {:?}", other),
    }

    // Stable on repeat.
    ctx.apply_styles();
    assert_eq!(fill(&ctx, "x"), Some(json!("#2563eb")));
}

#[test]
fn test_snapshot_domain_until_refreshed() {
    let mut ctx = AppContext::in_memory("test");
    ctx.backend_mut().add_elements(
        vec![weighted_node("a", 0), weighted_node("b", 10)],
        vec![],
    );
    ctx.configure_mapping(&MappingRequest {
        kind: ElementKind::Node,
        property: VisualProperty::Size,
        column: "weight".to_string(),
        strategy: Some(StrategyKind::Continuous),
        output: Some(OutputRange::Number { min: 10.0, max: 20.0 }),
        values: IndexMap::new(),
    })
    .unwrap();

    ctx.backend_mut()
        .add_elements(vec![weighted_node("c", 20)], vec![]);
    ctx.apply_styles();
    let width = |ctx: &AppContext| {
        ctx.backend()
            .style_attributes(&ElementRef::node("c"))
            .map(|s| s["width"].clone())
    };
    // Outside the captured domain the mapping extrapolates.
    assert_eq!(width(&ctx), Some(json!(30)));

    ctx.refresh_continuous_domain(ElementKind::Node, VisualProperty::Size)
        .unwrap();
    assert_eq!(width(&ctx), Some(json!(20)));
}

#[test]
fn test_incompatible_mapping_is_rejected() {
    let mut ctx = AppContext::in_memory("test");
    ctx.backend_mut()
        .add_elements(vec![weighted_node("a", 1)], vec![]);
    let err = ctx
        .configure_mapping(&MappingRequest {
            kind: ElementKind::Node,
            property: VisualProperty::Shape,
            column: "weight".to_string(),
            strategy: Some(StrategyKind::Continuous),
            output: None,
            values: IndexMap::new(),
        })
        .unwrap_err();
    assert_eq!(err.error_code(), "INCOMPATIBLE_STRATEGY");

    let err = ctx
        .set_default(ElementKind::Edge, VisualProperty::Shape, "ellipse".into())
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_APPLICABLE");
}
