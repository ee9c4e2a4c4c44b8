//! Integration tests for the individual pipeline stages
//!
//! Transform, factories, registry, collapse engine and layout adapter used
//! directly, without the Explorer.

use futures::executor::block_on;

use taxoflow::{
    config::{AppConfig, DimensionConfig},
    dataset::{TransformTable, decode_entities},
    diagram::{DiagramEdge, DiagramNode},
    error::LayoutError,
    expand::{collapse_to_depth, initialize_tree, toggle_node},
    factory::{FactoryOptions, FlexibleEdgeConfig, create_flexible_diagram, create_tree_diagram},
    floating::edge_params,
    geometry::{Point, Size},
    layout::{LayoutEngine, LayoutGraph, LayoutOutcome, PositionedGraph, layout_elements},
    layout_options::LayoutOptions,
    localization::Label,
    registry::DiagramRegistry,
    transform::{EntityRole, LevelConfig, RootConfig, TreeTransformConfig, ValueSource, transform},
    tree::{NodeData, TreeNode},
};

use serde_json::json;

struct OfflineEngine;

impl LayoutEngine for OfflineEngine {
    async fn layout(
        &self,
        _graph: &LayoutGraph,
        _options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        Err(LayoutError::Engine("engine offline".to_string()))
    }
}

fn leaf(id: &str) -> TreeNode {
    TreeNode::new(id, NodeData::new(Label::from(id)))
}

fn edge_pairs(registry: &DiagramRegistry, id: &str) -> Vec<(String, String)> {
    registry
        .get(id)
        .unwrap()
        .edges
        .iter()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect()
}

#[test]
fn test_two_level_dataset_end_to_end() {
    let value = json!([
        {"id": 1, "name_german": "A", "name_english": "A", "groups": [
            {"id": 10, "name_german": "G", "name_english": "G", "properties": [
                {"id": 100, "value": 5,
                 "unit": {"id": 1, "name_german": "Kilogramm", "name_english": "kilogram"},
                 "property": {"id": 2, "name_german": "Masse", "name_english": "mass"},
                 "reference": {"id": 3, "source": "handbook"}}
            ]}
        ]}
    ]);
    let categories = decode_entities("demo", value, &["groups"]).unwrap();
    let config = TreeTransformConfig {
        diagram_id: "demo".to_string(),
        root: RootConfig {
            class_name: "demo-root".to_string(),
            icon: None,
        },
        category: LevelConfig::new("category", "demo-cat").with_entities(&[EntityRole::Category]),
        group: LevelConfig::new("group", "demo-group")
            .with_entities(&[EntityRole::Group])
            .with_value("propertyCount", ValueSource::PropertyCount)
            .with_table("demo"),
        leaf: None,
        category_filter: None,
    };

    let root = transform(&categories, &config);
    assert_eq!(root.children.len(), 1);
    let category = &root.children[0];
    assert_eq!(category.children.len(), 1);
    let group = &category.children[0];
    assert!(group.data.show_table_icon);
    assert!(group.children.is_empty());
    let table = group.data.table.as_ref().unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table[0].id, "demo-properties-10");
    assert_eq!(table[0].data.properties.len(), 1);
    assert_eq!(table[0].data.category.name_english, "A");
    assert_eq!(table[0].data.group.name_english, "G");
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut registry = DiagramRegistry::new();
    let first = vec![DiagramNode::new("a", NodeData::new(Label::from("a")), "default", "c")];
    let second = vec![DiagramNode::new("b", NodeData::new(Label::from("b")), "default", "c")];

    assert!(registry.register("demo", first.clone(), Vec::new(), None));
    assert!(!registry.register("demo", second, vec![DiagramEdge::new("e", "a", "b")], None));

    let record = registry.get("demo").unwrap();
    assert_eq!(record.nodes, first);
    assert!(record.edges.is_empty());
}

#[test]
fn test_factory_skips_collapsed_subtrees() {
    let mut registry = DiagramRegistry::new();
    let root = leaf("R").with_children(vec![
        leaf("A").with_collapsed(true).with_children(vec![leaf("B")]),
    ]);
    assert!(create_tree_diagram(&mut registry, "demo", root, &FactoryOptions::default()));

    let ids: Vec<&str> = registry.get("demo").unwrap().nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["R", "A"]);
    assert_eq!(edge_pairs(&registry, "demo"), [("R".to_string(), "A".to_string())]);

    assert!(toggle_node(&mut registry, "demo", "A"));
    let ids: Vec<&str> = registry.get("demo").unwrap().nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["R", "A", "B"]);
    assert_eq!(
        edge_pairs(&registry, "demo"),
        [
            ("R".to_string(), "A".to_string()),
            ("A".to_string(), "B".to_string())
        ]
    );
}

#[test]
fn test_initialize_tree_keeps_expanded_nodes() {
    let build = || {
        leaf("R").with_children(vec![
            leaf("A").with_children(vec![leaf("A1")]),
            leaf("B").with_children(vec![leaf("B1")]),
        ])
    };
    let mut registry = DiagramRegistry::new();

    let mut first = build();
    assert!(!initialize_tree(&mut registry, "demo", &mut first));
    assert!(!first.collapsed);
    assert!(first.children.iter().all(|child| child.collapsed));
    create_tree_diagram(&mut registry, "demo", first, &FactoryOptions::default());
    toggle_node(&mut registry, "demo", "A");

    let mut second = build();
    assert!(initialize_tree(&mut registry, "demo", &mut second));
    assert!(!registry.is_registered("demo"));
    assert!(!second.find("A").unwrap().collapsed);
    assert!(second.find("B").unwrap().collapsed);
}

#[test]
fn test_collapse_to_depth_on_transformed_tree() {
    let config = AppConfig::default();
    let value = json!([
        {"id": 1, "name_german": "A", "name_english": "A", "concepts": [
            {"id": 10, "name_german": "G", "name_english": "G"}
        ]},
        {"id": 2, "name_german": "B", "name_english": "B", "concepts": []}
    ]);
    let mut root = TransformTable::bioenergy()
        .apply("supply_concepts", value, config.diagram("supply_concepts").unwrap())
        .unwrap();

    collapse_to_depth(&mut root, 0);
    assert!(!root.collapsed);
    assert_eq!(root.children.len(), 2);
    assert!(root.children.iter().all(|child| child.collapsed));
}

#[test]
fn test_multi_target_edges() {
    let mut registry = DiagramRegistry::new();
    let nodes = ["s", "x", "y"]
        .iter()
        .map(|id| taxoflow::factory::FlexibleNodeConfig {
            id: id.to_string(),
            data: NodeData::new(Label::from(*id)),
            node_type: None,
            class_name: None,
            position: None,
            source_position: None,
            target_position: None,
        })
        .collect::<Vec<_>>();
    let edges = [FlexibleEdgeConfig::new("s", vec!["x".to_string(), "y".to_string()])];

    assert!(create_flexible_diagram(&mut registry, "demo", &nodes, &edges, &FactoryOptions::default()));
    let record = registry.get("demo").unwrap();
    assert_eq!(record.edges.len(), 2);
    assert_eq!(edge_pairs(&registry, "demo"), [
        ("s".to_string(), "x".to_string()),
        ("s".to_string(), "y".to_string())
    ]);
    assert_ne!(record.edges[0].id, record.edges[1].id);
}

#[test]
fn test_layout_fallback_keeps_nodes() {
    let dimensions = DimensionConfig::default();
    let nodes = vec![
        DiagramNode::new("root", NodeData::new(Label::from("root")), "custom", "xducts-root"),
        DiagramNode::new("c1", NodeData::new(Label::from("c1")), "custom", "xducts-cat"),
        DiagramNode::new("other", NodeData::new(Label::from("other")), "custom", "unknown-class"),
    ];
    let edges = vec![DiagramEdge::new("e", "root", "c1")];

    let result = block_on(layout_elements(
        &nodes,
        &edges,
        &LayoutOptions::tree(),
        &dimensions,
        &OfflineEngine,
    ));

    assert!(matches!(result.outcome, LayoutOutcome::Fallback(_)));
    assert_eq!(result.nodes.len(), nodes.len());
    assert_eq!(result.edges, edges);
    for (out, input) in result.nodes.iter().zip(&nodes) {
        assert_eq!(out.id, input.id);
        assert_eq!(out.data, input.data);
        assert_eq!(out.class_name, input.class_name);
        let size = dimensions.lookup(&input.class_name);
        assert_eq!(out.style.width, Some(size.width()));
        assert_eq!(out.style.height, Some(size.height()));
    }
    assert_eq!(result.nodes[2].style.width, Some(300.0));
}

#[test]
fn test_floating_edge_with_identical_centers() {
    let node = |id: &str| {
        DiagramNode::new(id, NodeData::new(Label::from(id)), "custom", "c")
            .with_position(Point::new(40.0, 40.0))
            .with_size(Size::new(100.0, 50.0))
    };
    let params = edge_params(&node("a"), &node("b"));
    assert!(params.sx().is_finite() && params.sy().is_finite());
    assert!(params.tx().is_finite() && params.ty().is_finite());
}
