//! Diagram factories.
//!
//! Two constructors write into a [`DiagramRegistry`]:
//!
//! - [`create_flexible_diagram`] takes explicit node and edge lists. Edges may
//!   name several targets and are expanded into one edge per target.
//! - [`create_tree_diagram`] walks a [`TreeNode`] depth-first and emits one
//!   node per visited tree node plus one edge per materialized parent/child
//!   pair. It does not descend into collapsed nodes.
//!
//! Neither factory assigns positions; every node starts at the origin.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use taxoflow_core::{
    diagram::{DiagramEdge, DiagramNode, EdgeMarker, EdgeStyle, HandlePosition},
    geometry::Point,
    layout_options::LayoutOptions,
    tree::{NodeData, TreeNode},
};

use crate::registry::{DiagramRecord, DiagramRegistry};

const DEFAULT_CLASS_NAME: &str = "default-node";
const DEFAULT_NODE_TYPE: &str = "default";
const DEFAULT_EDGE_TYPE: &str = "default";

/// Factory settings as written in configuration. Unset fields fall back to
/// the defaults applied by [`FactoryOptions::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryOptions {
    pub default_class_name: Option<String>,
    pub node_id_prefix: Option<String>,
    pub default_node_type: Option<String>,
    pub default_edge_type: Option<String>,
    pub layout_options: Option<LayoutOptions>,
    pub default_source_position: Option<HandlePosition>,
    pub default_target_position: Option<HandlePosition>,
    pub edge_style: Option<EdgeStyle>,
}

impl FactoryOptions {
    /// Fills in defaults. The node id prefix defaults to `{diagram_id}-n`.
    pub fn resolve(&self, diagram_id: &str) -> ResolvedFactoryOptions {
        ResolvedFactoryOptions {
            class_name: self
                .default_class_name
                .clone()
                .unwrap_or_else(|| DEFAULT_CLASS_NAME.to_string()),
            node_id_prefix: self
                .node_id_prefix
                .clone()
                .unwrap_or_else(|| format!("{diagram_id}-n")),
            node_type: self
                .default_node_type
                .clone()
                .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string()),
            edge_type: self
                .default_edge_type
                .clone()
                .unwrap_or_else(|| DEFAULT_EDGE_TYPE.to_string()),
            layout_options: self.layout_options.clone(),
            source_position: self.default_source_position,
            target_position: self.default_target_position,
            edge_style: self.edge_style.clone(),
        }
    }
}

/// Factory settings with every default applied. Stored with tree diagrams so
/// that regeneration needs no input from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFactoryOptions {
    pub class_name: String,
    pub node_id_prefix: String,
    pub node_type: String,
    pub edge_type: String,
    pub layout_options: Option<LayoutOptions>,
    pub source_position: Option<HandlePosition>,
    pub target_position: Option<HandlePosition>,
    pub edge_style: Option<EdgeStyle>,
}

/// Node entry of a flexible diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexibleNodeConfig {
    pub id: String,
    #[serde(default)]
    pub data: NodeData,
    #[serde(default, rename = "type")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub source_position: Option<HandlePosition>,
    #[serde(default)]
    pub target_position: Option<HandlePosition>,
}

/// One or several edge targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeTargets {
    One(String),
    Many(Vec<String>),
}

impl EdgeTargets {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(target) => std::slice::from_ref(target),
            Self::Many(targets) => targets,
        }
    }
}

impl From<&str> for EdgeTargets {
    fn from(target: &str) -> Self {
        Self::One(target.to_string())
    }
}

/// Edge entry of a flexible diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexibleEdgeConfig {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: EdgeTargets,
    #[serde(default, rename = "type")]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub style: Option<EdgeStyle>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub marker_start: Option<EdgeMarker>,
    #[serde(default)]
    pub marker_end: Option<EdgeMarker>,
}

impl FlexibleEdgeConfig {
    pub fn new(source: impl Into<String>, target: impl Into<EdgeTargets>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            edge_type: None,
            style: None,
            animated: false,
            marker_start: None,
            marker_end: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<Vec<String>> for EdgeTargets {
    fn from(targets: Vec<String>) -> Self {
        Self::Many(targets)
    }
}

/// Expands flexible edge configs into concrete edges.
///
/// Generated ids have the form `edge-{source}-{target}-{edgeIndex}-{targetIndex}`.
/// An explicit id is kept as is for a single target and suffixed with
/// `-{targetIndex}` when the edge fans out, keeping ids unique.
pub fn expand_edges(edges: &[FlexibleEdgeConfig], options: &ResolvedFactoryOptions) -> Vec<DiagramEdge> {
    edges
        .iter()
        .enumerate()
        .flat_map(|(edge_idx, config)| {
            let targets = config.target.as_slice();
            let fans_out = targets.len() > 1;
            targets.iter().enumerate().map(move |(target_idx, target)| {
                let id = match &config.id {
                    Some(id) if fans_out => format!("{id}-{target_idx}"),
                    Some(id) => id.clone(),
                    None => format!("edge-{}-{target}-{edge_idx}-{target_idx}", config.source),
                };
                DiagramEdge {
                    id,
                    source: config.source.clone(),
                    target: target.clone(),
                    edge_type: Some(
                        config
                            .edge_type
                            .clone()
                            .unwrap_or_else(|| options.edge_type.clone()),
                    ),
                    style: config.style.clone().or_else(|| options.edge_style.clone()),
                    animated: config.animated,
                    marker_start: config.marker_start.clone(),
                    marker_end: config.marker_end.clone(),
                }
            })
        })
        .collect()
}

/// Registers a diagram built from explicit node and edge lists.
///
/// Returns `false` if the registry refused the registration.
pub fn create_flexible_diagram(
    registry: &mut DiagramRegistry,
    diagram_id: &str,
    nodes: &[FlexibleNodeConfig],
    edges: &[FlexibleEdgeConfig],
    options: &FactoryOptions,
) -> bool {
    let options = options.resolve(diagram_id);

    let nodes = nodes
        .iter()
        .map(|config| DiagramNode {
            source_position: config.source_position.or(options.source_position),
            target_position: config.target_position.or(options.target_position),
            position: config.position.unwrap_or_default(),
            ..DiagramNode::new(
                config.id.clone(),
                config.data.clone(),
                config
                    .node_type
                    .clone()
                    .unwrap_or_else(|| options.node_type.clone()),
                config
                    .class_name
                    .clone()
                    .unwrap_or_else(|| options.class_name.clone()),
            )
        })
        .collect();
    let edges = expand_edges(edges, &options);

    registry.register(diagram_id, nodes, edges, options.layout_options)
}

/// Emits the visible part of a tree as rendered nodes and edges.
///
/// Nodes without an id get `{node_id_prefix}-{counter}`.
pub fn emit_tree(
    root: &TreeNode,
    options: &ResolvedFactoryOptions,
) -> (Vec<DiagramNode>, Vec<DiagramEdge>) {
    let mut emitter = Emitter {
        options,
        counter: 0,
        nodes: Vec::new(),
        edges: Vec::new(),
    };
    emitter.visit(root, None);
    (emitter.nodes, emitter.edges)
}

struct Emitter<'a> {
    options: &'a ResolvedFactoryOptions,
    counter: usize,
    nodes: Vec<DiagramNode>,
    edges: Vec<DiagramEdge>,
}

impl Emitter<'_> {
    fn visit(&mut self, node: &TreeNode, parent_id: Option<&str>) {
        let id = match node.id() {
            Some(id) => id.to_string(),
            None => {
                let id = format!("{}-{}", self.options.node_id_prefix, self.counter);
                self.counter += 1;
                id
            }
        };

        let mut data = node.data.clone();
        data.has_children = node.has_children();
        data.is_expanded = data.has_children && !node.collapsed;
        let has_table_data = data.has_table_data();
        if !has_table_data {
            data.table = None;
        }
        data.show_table_icon = node.data.show_table_icon || has_table_data;

        let rendered = DiagramNode {
            source_position: self.options.source_position,
            target_position: self.options.target_position,
            ..DiagramNode::new(
                id.clone(),
                data,
                node.node_type
                    .clone()
                    .unwrap_or_else(|| self.options.node_type.clone()),
                node.class_name
                    .clone()
                    .unwrap_or_else(|| self.options.class_name.clone()),
            )
        };
        self.nodes.push(rendered);

        if let Some(parent_id) = parent_id {
            self.edges.push(
                DiagramEdge::new(format!("edge-{parent_id}-{id}"), parent_id, id.as_str())
                    .with_style(self.options.edge_style.clone()),
            );
        }

        if node.collapsed {
            return;
        }
        for child in &node.children {
            self.visit(child, Some(&id));
        }
    }
}

/// Registers a tree diagram with already resolved options.
///
/// On success the registry takes ownership of `root` and `options` so that
/// later toggles can regenerate the diagram.
pub fn create_tree_diagram_resolved(
    registry: &mut DiagramRegistry,
    diagram_id: &str,
    root: TreeNode,
    options: ResolvedFactoryOptions,
) -> bool {
    let (nodes, edges) = emit_tree(&root, &options);
    trace!(diagram_id = diagram_id, nodes = nodes.len(), edges = edges.len(); "Emitted tree diagram");

    let record =
        DiagramRecord::new(nodes, edges, options.layout_options.clone()).with_tree(root, options);
    let registered = registry.register_record(diagram_id, record);
    if registered {
        debug!(diagram_id = diagram_id; "Created tree diagram");
    }
    registered
}

/// Registers a tree diagram.
pub fn create_tree_diagram(
    registry: &mut DiagramRegistry,
    diagram_id: &str,
    root: TreeNode,
    options: &FactoryOptions,
) -> bool {
    create_tree_diagram_resolved(registry, diagram_id, root, options.resolve(diagram_id))
}
