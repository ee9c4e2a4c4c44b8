//! Layered layout engine.
//!
//! Ranks and in-layer order come from the rust-sugiyama crate. This engine
//! then turns ranks into layers along the configured direction, sizing each
//! layer by its widest node and spacing layers and nodes per the options.

use std::{any::Any, collections::HashMap};

use log::debug;
use rust_sugiyama::configure::Config;

use taxoflow_core::{
    geometry::{Point, Size},
    layout_options::{Direction, LayoutOptions},
};

use crate::{
    error::LayoutError,
    layout::{LayoutEngine, LayoutGraph, PositionedGraph},
};

/// Distance between adjacent vertices in rust-sugiyama coordinates.
const VERTEX_SPACING: f64 = 3.0;
const EPSILON: f64 = 1e-6;

/// Layer and in-layer slot of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    layer: usize,
    slot: f64,
}

/// One connected component as returned by rust-sugiyama: vertex id and
/// raw coordinates.
type Component = Vec<(usize, f64, f64)>;

#[derive(Debug, Default)]
pub struct LayeredEngine;

impl LayeredEngine {
    pub fn new() -> Self {
        Self
    }

    /// Computes top-left positions for every node of `graph`.
    pub fn compute(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        let edge_pairs = graph.edge_indices()?;

        // Self-loops carry no ranking information.
        let edges = edge_pairs
            .iter()
            .filter(|(source, target)| source != target)
            .map(|&(source, target)| Ok((vertex_id(source)?, vertex_id(target)?)))
            .collect::<Result<Vec<_>, LayoutError>>()?;

        let mut placements: Vec<Option<Placement>> = vec![None; graph.nodes.len()];
        let mut next_slot = 0.0;

        if !edges.is_empty() {
            debug!(
                nodes = graph.nodes.len(),
                edges = edges.len();
                "Applying Sugiyama algorithm"
            );
            for component in run_sugiyama(edges)? {
                next_slot = place_component(&component, &edge_pairs, &mut placements, next_slot);
            }
        }

        // Nodes without usable edges line up in the first layer.
        for placement in placements.iter_mut().filter(|p| p.is_none()) {
            *placement = Some(Placement {
                layer: 0,
                slot: next_slot,
            });
            next_slot += 1.0;
        }

        Ok(positions(graph, &placements, options))
    }
}

impl LayoutEngine for LayeredEngine {
    async fn layout(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        self.compute(graph, options)
    }
}

fn vertex_id(index: usize) -> Result<u32, LayoutError> {
    u32::try_from(index)
        .map_err(|_| LayoutError::Engine(format!("node index {index} exceeds the vertex id range")))
}

/// Runs rust-sugiyama, turning a panic inside the crate into an error.
fn run_sugiyama(edges: Vec<(u32, u32)>) -> Result<Vec<Component>, LayoutError> {
    let layouts = std::panic::catch_unwind(move || {
        let config = Config {
            minimum_length: 1,
            vertex_spacing: 3.0,
            ..Default::default()
        };
        rust_sugiyama::from_edges(&edges, &config)
    })
    .map_err(|payload| LayoutError::Panicked(panic_message(payload.as_ref())))?;

    if layouts.is_empty() {
        return Err(LayoutError::Engine(
            "rust-sugiyama returned no layout".to_string(),
        ));
    }

    Ok(layouts
        .into_iter()
        .map(|(coords, _, _)| {
            coords
                .into_iter()
                .map(|(id, (x, y))| (id as usize, x as f64, y as f64))
                .collect()
        })
        .collect())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Records layers and slots of one component, starting at `slot_offset`.
/// Returns the first free slot after the component.
fn place_component(
    component: &Component,
    edges: &[(usize, usize)],
    placements: &mut [Option<Placement>],
    slot_offset: f64,
) -> f64 {
    let mut levels: Vec<f64> = component.iter().map(|&(_, _, y)| y).collect();
    levels.sort_by(f64::total_cmp);
    levels.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    let rank_of = |y: f64| {
        levels
            .iter()
            .position(|level| (level - y).abs() < EPSILON)
            .unwrap_or_default()
    };
    let mut ranks: HashMap<usize, usize> = component.iter().map(|&(id, _, y)| (id, rank_of(y))).collect();

    // The crate's y axis may grow against the edge direction; make sources
    // come first.
    let (forward, backward) = edges
        .iter()
        .filter_map(|(source, target)| Some((ranks.get(source)?, ranks.get(target)?)))
        .fold((0, 0), |(forward, backward), (source, target)| {
            match source.cmp(target) {
                std::cmp::Ordering::Less => (forward + 1, backward),
                std::cmp::Ordering::Greater => (forward, backward + 1),
                std::cmp::Ordering::Equal => (forward, backward),
            }
        });
    if backward > forward {
        let last = levels.len().saturating_sub(1);
        for rank in ranks.values_mut() {
            *rank = last - *rank;
        }
    }

    let min_x = component
        .iter()
        .map(|&(_, x, _)| x)
        .fold(f64::INFINITY, f64::min);
    let mut max_slot: f64 = 0.0;
    for &(id, x, _) in component {
        let slot = (x - min_x) / VERTEX_SPACING;
        max_slot = max_slot.max(slot);
        if let (Some(placement), Some(&layer)) = (placements.get_mut(id), ranks.get(&id)) {
            *placement = Some(Placement {
                layer,
                slot: slot_offset + slot,
            });
        }
    }
    slot_offset + max_slot + 1.0
}

/// Turns layers and slots into top-left positions.
fn positions(
    graph: &LayoutGraph,
    placements: &[Option<Placement>],
    options: &LayoutOptions,
) -> PositionedGraph {
    let direction = options.direction();
    let horizontal = direction.is_horizontal();
    let node_spacing = options.node_spacing();
    let layer_spacing = options.layer_spacing();

    let along = |size: Size| if horizontal { size.width() } else { size.height() };
    let across = |size: Size| if horizontal { size.height() } else { size.width() };

    let layer_count = placements
        .iter()
        .flatten()
        .map(|p| p.layer + 1)
        .max()
        .unwrap_or(0);
    let mut layer_extent = vec![0.0f32; layer_count];
    for (node, placement) in graph.nodes.iter().zip(placements) {
        if let Some(p) = placement {
            layer_extent[p.layer] = layer_extent[p.layer].max(along(node.size));
        }
    }

    let mut layer_start = Vec::with_capacity(layer_count);
    let mut cursor = 0.0;
    for extent in &layer_extent {
        layer_start.push(cursor);
        cursor += extent + layer_spacing;
    }
    let total = (cursor - layer_spacing).max(0.0);

    let pitch = graph
        .nodes
        .iter()
        .map(|node| across(node.size))
        .fold(0.0, f32::max)
        + node_spacing;

    let mut positioned = PositionedGraph::new();
    for (node, placement) in graph.nodes.iter().zip(placements) {
        let Some(p) = placement else {
            continue;
        };
        let extent = along(node.size);
        let mut main = layer_start[p.layer] + (layer_extent[p.layer] - extent) / 2.0;
        if matches!(direction, Direction::Left | Direction::Up) {
            main = total - main - extent;
        }
        let cross = p.slot as f32 * pitch;
        let position = if horizontal {
            Point::new(main, cross)
        } else {
            Point::new(cross, main)
        };
        positioned.insert(node.id.clone(), position, Some(node.size));
    }
    positioned
}
