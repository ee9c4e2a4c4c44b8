//! Layout adapter.
//!
//! Translates a registered diagram into an abstract [`LayoutGraph`] (node
//! footprints from the dimension table, edges by endpoint id), hands it to a
//! [`LayoutEngine`] and merges the returned positions back onto the original
//! nodes. Node identity, payload and edges are never changed.
//!
//! Engine failures are absorbed: the adapter then returns the original nodes
//! with their footprint written into `style`, so the caller can still render.

pub mod engines;

use std::collections::HashMap;

use log::{debug, warn};
use serde_json::Value;

use taxoflow_core::{
    diagram::{DiagramEdge, DiagramNode, NodeStyle},
    geometry::{Point, Size},
    layout_options::LayoutOptions,
    localization::Label,
};

use crate::{config::DimensionConfig, error::LayoutError};

pub use engines::{AutoEngine, ForceEngine, LayeredEngine, LayoutEngine};

/// A node as seen by a layout engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub size: Size,
    /// Text hint for engines that take labels into account.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// Abstract graph handed to a layout engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutGraph {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    /// Builds the engine input from rendered nodes and edges.
    pub fn from_diagram(
        nodes: &[DiagramNode],
        edges: &[DiagramEdge],
        dimensions: &DimensionConfig,
    ) -> Self {
        Self {
            nodes: nodes
                .iter()
                .map(|node| LayoutNode {
                    id: node.id.clone(),
                    size: dimensions.lookup(&node.class_name),
                    label: label_text(&node.data.label),
                })
                .collect(),
            edges: edges
                .iter()
                .map(|edge| LayoutEdge {
                    id: edge.id.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                })
                .collect(),
        }
    }

    /// Edges as pairs of node indices.
    ///
    /// Fails on the first edge whose endpoint is not a node of the graph.
    pub fn edge_indices(&self) -> Result<Vec<(usize, usize)>, LayoutError> {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.as_str(), i))
            .collect();
        self.edges
            .iter()
            .map(|edge| {
                let lookup = |id: &str| {
                    index.get(id).copied().ok_or_else(|| LayoutError::UnknownNode {
                        edge: edge.id.clone(),
                        node: id.to_string(),
                    })
                };
                Ok((lookup(edge.source.as_str())?, lookup(edge.target.as_str())?))
            })
            .collect()
    }
}

/// Position, and optionally size, assigned to one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionedNode {
    /// Top-left corner.
    pub position: Point,
    pub size: Option<Size>,
}

/// Engine output keyed by node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionedGraph {
    nodes: HashMap<String, PositionedNode>,
}

impl PositionedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, position: Point, size: Option<Size>) {
        self.nodes
            .insert(id.into(), PositionedNode { position, size });
    }

    pub fn get(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PositionedNode)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// How a [`LayoutResult`] was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutOutcome {
    /// Positions come from the engine.
    Computed,
    /// The engine failed; nodes carry footprints but no computed positions.
    Fallback(String),
    /// Nothing to lay out; the engine was not called.
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub outcome: LayoutOutcome,
}

/// Layout hint text of a label.
///
/// Plain strings pass through; name-shaped labels yield their English name.
/// Everything else yields an empty string.
pub fn label_text(label: &Label) -> String {
    match label {
        Label::Text(text) => text.clone(),
        Label::Name(name) => name.name_english.clone(),
        Label::Entity(entity) => entity.name.name_english.clone(),
        Label::Opaque(Value::Object(object)) => object
            .get("name_english")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Label::Message(_) | Label::Opaque(_) => String::new(),
    }
}

/// Lays out one diagram.
///
/// On success every node gets the engine's position (origin if the engine
/// skipped it) and a footprint in `style`. On failure the nodes keep their
/// positions and get their class footprint. Edges are returned unchanged.
pub async fn layout_elements<E: LayoutEngine>(
    nodes: &[DiagramNode],
    edges: &[DiagramEdge],
    options: &LayoutOptions,
    dimensions: &DimensionConfig,
    engine: &E,
) -> LayoutResult {
    if nodes.is_empty() {
        return LayoutResult {
            nodes: Vec::new(),
            edges: edges.to_vec(),
            outcome: LayoutOutcome::Empty,
        };
    }

    let graph = LayoutGraph::from_diagram(nodes, edges, dimensions);
    match engine.layout(&graph, options).await {
        Ok(positioned) => {
            debug!(nodes = nodes.len(), positioned = positioned.len(); "Layout computed");
            let nodes = nodes
                .iter()
                .zip(&graph.nodes)
                .map(|(node, layout_node)| {
                    let placed = positioned.get(&node.id);
                    let size = placed.and_then(|p| p.size).unwrap_or(layout_node.size);
                    let mut node = node.clone();
                    node.position = placed.map_or_else(Point::default, |p| p.position);
                    node.style = NodeStyle::from_size(size);
                    node
                })
                .collect();
            LayoutResult {
                nodes,
                edges: edges.to_vec(),
                outcome: LayoutOutcome::Computed,
            }
        }
        Err(err) => {
            warn!(err:% = err; "Layout failed, using fallback dimensions");
            let nodes = nodes
                .iter()
                .zip(&graph.nodes)
                .map(|(node, layout_node)| {
                    let mut node = node.clone();
                    node.style = NodeStyle::from_size(layout_node.size);
                    node
                })
                .collect();
            LayoutResult {
                nodes,
                edges: edges.to_vec(),
                outcome: LayoutOutcome::Fallback(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;

    use taxoflow_core::{
        diagram::HandlePosition,
        localization::{LocalizableEntity, LocalizedName, MessageRef},
        tree::NodeData,
    };

    use super::*;

    struct FailingEngine;

    impl LayoutEngine for FailingEngine {
        async fn layout(
            &self,
            _graph: &LayoutGraph,
            _options: &LayoutOptions,
        ) -> Result<PositionedGraph, LayoutError> {
            Err(LayoutError::Engine("boom".to_string()))
        }
    }

    /// Places nodes on a diagonal, skipping the last one.
    struct DiagonalEngine;

    impl LayoutEngine for DiagonalEngine {
        async fn layout(
            &self,
            graph: &LayoutGraph,
            _options: &LayoutOptions,
        ) -> Result<PositionedGraph, LayoutError> {
            let mut positioned = PositionedGraph::new();
            let placed = graph.nodes.len().saturating_sub(1);
            for (i, node) in graph.nodes.iter().take(placed).enumerate() {
                let offset = (i as f32 + 1.0) * 10.0;
                positioned.insert(node.id.clone(), Point::new(offset, offset), None);
            }
            Ok(positioned)
        }
    }

    /// Counts calls so tests can check the short circuit.
    struct CountingEngine(std::cell::Cell<usize>);

    impl LayoutEngine for CountingEngine {
        async fn layout(
            &self,
            _graph: &LayoutGraph,
            _options: &LayoutOptions,
        ) -> Result<PositionedGraph, LayoutError> {
            self.0.set(self.0.get() + 1);
            Ok(PositionedGraph::new())
        }
    }

    fn node(id: &str, class_name: &str) -> DiagramNode {
        let mut node = DiagramNode::new(id, NodeData::new(Label::from(id)), "custom", class_name);
        node.target_position = Some(HandlePosition::Left);
        node
    }

    fn sample() -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
        (
            vec![
                node("root", "xducts-root"),
                node("cat", "xducts-cat"),
                node("other", "unknown-class"),
            ],
            vec![
                DiagramEdge::new("edge-root-cat", "root", "cat"),
                DiagramEdge::new("edge-root-other", "root", "other"),
            ],
        )
    }

    #[test]
    fn test_label_text() {
        assert_eq!(label_text(&Label::from("plain")), "plain");
        assert_eq!(label_text(&Label::Name(LocalizedName::new("Holz", "wood"))), "wood");
        let entity = LocalizableEntity::new(1, LocalizedName::new("Stroh", "straw"));
        assert_eq!(label_text(&Label::Entity(entity)), "straw");
        assert_eq!(label_text(&Label::Message(MessageRef::new("xducts_label"))), "");
        assert_eq!(label_text(&Label::Opaque(json!({"name_english": "hint"}))), "hint");
        assert_eq!(label_text(&Label::Opaque(json!([1, 2]))), "");
    }

    #[test]
    fn test_graph_uses_class_dimensions() {
        let (nodes, edges) = sample();
        let graph = LayoutGraph::from_diagram(&nodes, &edges, &DimensionConfig::default());
        assert_eq!(graph.nodes[0].size, Size::new(250.0, 80.0));
        assert_eq!(graph.nodes[1].size, Size::new(360.0, 40.0));
        assert_eq!(graph.nodes[2].size, Size::new(300.0, 60.0));
        assert_eq!(graph.edge_indices().unwrap(), [(0, 1), (0, 2)]);
    }

    #[test]
    fn test_edge_indices_reject_unknown_nodes() {
        let (nodes, mut edges) = sample();
        edges.push(DiagramEdge::new("dangling", "cat", "ghost"));
        let graph = LayoutGraph::from_diagram(&nodes, &edges, &DimensionConfig::default());
        assert!(matches!(
            graph.edge_indices(),
            Err(LayoutError::UnknownNode { node, .. }) if node == "ghost"
        ));
    }

    #[test]
    fn test_fallback_keeps_nodes_and_sets_dimensions() {
        let (nodes, edges) = sample();
        let result = block_on(layout_elements(
            &nodes,
            &edges,
            &LayoutOptions::tree(),
            &DimensionConfig::default(),
            &FailingEngine,
        ));

        assert!(matches!(result.outcome, LayoutOutcome::Fallback(ref msg) if msg.contains("boom")));
        assert_eq!(result.nodes.len(), nodes.len());
        assert_eq!(result.edges, edges);
        let dims = DimensionConfig::default();
        for (out, input) in result.nodes.iter().zip(&nodes) {
            assert_eq!(out.id, input.id);
            assert_eq!(out.data, input.data);
            assert_eq!(out.class_name, input.class_name);
            assert_eq!(out.position, input.position);
            let size = dims.lookup(&input.class_name);
            assert_eq!(out.style.width, Some(size.width()));
            assert_eq!(out.style.height, Some(size.height()));
        }
    }

    #[test]
    fn test_success_merges_positions() {
        let (nodes, edges) = sample();
        let result = block_on(layout_elements(
            &nodes,
            &edges,
            &LayoutOptions::tree(),
            &DimensionConfig::default(),
            &DiagonalEngine,
        ));

        assert_eq!(result.outcome, LayoutOutcome::Computed);
        assert_eq!(result.nodes[0].position, Point::new(10.0, 10.0));
        assert_eq!(result.nodes[1].position, Point::new(20.0, 20.0));
        assert_eq!(result.nodes[2].position, Point::default());
        assert_eq!(result.nodes[1].style.width, Some(360.0));
        assert_eq!(result.nodes[1].target_position, Some(HandlePosition::Left));
        assert_eq!(result.nodes[1].node_type, "custom");
        assert_eq!(result.edges, edges);
    }

    #[test]
    fn test_empty_input_skips_engine() {
        let engine = CountingEngine(std::cell::Cell::new(0));
        let result = block_on(layout_elements(
            &[],
            &[],
            &LayoutOptions::base(),
            &DimensionConfig::default(),
            &engine,
        ));
        assert_eq!(result.outcome, LayoutOutcome::Empty);
        assert!(result.nodes.is_empty());
        assert_eq!(engine.0.get(), 0);
    }
}
