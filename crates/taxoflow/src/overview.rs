//! The top-level overview diagram.
//!
//! Six nodes, one per dataset plus the `mix` node, connected by colored
//! edges. Clicking a node whose id names a configured tree diagram opens that
//! diagram.

use log::debug;

use taxoflow_core::{
    color::Color,
    diagram::{EdgeMarker, EdgeStyle},
    localization::{Description, Label, MessageRef},
    tree::NodeData,
};

use crate::{
    config::AppConfig,
    factory::{FlexibleEdgeConfig, FlexibleNodeConfig, create_flexible_diagram},
    registry::DiagramRegistry,
};

/// Diagram id of the overview.
pub const OVERVIEW_ID: &str = "root";

const EDGE_WIDTH: f32 = 3.0;
const MIX_DASH: &str = "5 5";

/// (id, class name, icon)
const NODES: &[(&str, &str, &str)] = &[
    ("xducts", "xducts-node", "atom"),
    ("conversion_procedures", "conversionProcedures-node", "flask-conical"),
    ("mix", "mix-node", "shuffle"),
    ("process_chains", "processChains-node", "network"),
    ("supply_tasks", "supplyTasks-node", "list-todo"),
    ("supply_concepts", "supplyConcepts-node", "lightbulb"),
];

/// (id, source, target, stroke)
const EDGES: &[(&str, &str, &str, &str)] = &[
    ("e1", "xducts", "conversion_procedures", "#a3e635"),
    ("e2", "xducts", "process_chains", "#a5b4fc"),
    ("e3", "xducts", "mix", "#f87171"),
    ("e4", "xducts", "supply_concepts", "#a3e635"),
    ("e5", "xducts", "supply_tasks", "#f5d109ff"),
    ("e6", "process_chains", "mix", "#f87171"),
    ("e7", "supply_concepts", "conversion_procedures", "#6ee7b7"),
    ("e8", "supply_concepts", "process_chains", "#3730a3"),
    ("e9", "supply_concepts", "mix", "#f87171"),
    ("e10", "supply_concepts", "supply_tasks", "#f5d109ff"),
];

/// Overview nodes with `{id}_label` and `{id}_description` messages.
pub fn default_nodes() -> Vec<FlexibleNodeConfig> {
    NODES
        .iter()
        .map(|&(id, class_name, icon)| FlexibleNodeConfig {
            id: id.to_string(),
            data: NodeData::new(Label::Message(MessageRef::new(format!("{id}_label"))))
                .with_description(Description::Message(MessageRef::new(format!(
                    "{id}_description"
                ))))
                .with_icon(icon),
            node_type: None,
            class_name: Some(class_name.to_string()),
            position: None,
            source_position: None,
            target_position: None,
        })
        .collect()
}

/// Overview edges. Edges into `mix` are dashed.
pub fn default_edges() -> Vec<FlexibleEdgeConfig> {
    EDGES
        .iter()
        .map(|&(id, source, target, stroke)| {
            let mut style = EdgeStyle::new(Color::new(stroke).unwrap_or_default(), EDGE_WIDTH);
            if target == "mix" {
                style = style.dashed(MIX_DASH);
            }
            FlexibleEdgeConfig {
                style: Some(style),
                marker_end: Some(EdgeMarker::arrow_closed(10.0, 10.0)),
                ..FlexibleEdgeConfig::new(source, target).with_id(id)
            }
        })
        .collect()
}

/// Registers the overview unless it is registered already.
///
/// The overview uses the base layout preset when its factory options set no
/// layout. Returns whether a registration was attempted.
pub fn register_overview(registry: &mut DiagramRegistry, config: &AppConfig) -> bool {
    let overview = &config.overview;
    registry.try_register(&overview.diagram_id, |registry| {
        let mut options = overview.factory.clone();
        options
            .layout_options
            .get_or_insert_with(|| config.layout.base.clone());
        let registered = create_flexible_diagram(
            registry,
            &overview.diagram_id,
            &overview.nodes,
            &overview.edges,
            &options,
        );
        debug!(diagram_id = overview.diagram_id.as_str(), registered = registered; "Registered overview");
    })
}
