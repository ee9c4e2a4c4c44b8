//! Force-directed layout engine
//!
//! Nodes start on a jittered grid and settle under pairwise repulsion and
//! spring attraction along edges. The jitter comes from a generator seeded
//! with `elk.randomSeed`, so a given graph and seed always produce the same
//! positions.

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use taxoflow_core::{
    geometry::{Point, Size},
    layout_options::LayoutOptions,
};

use crate::{
    error::LayoutError,
    layout::{LayoutEngine, LayoutGraph, PositionedGraph},
};

/// Force layout engine
///
/// Iteration count and seed are read from the layout options; the minimum
/// distance between nodes is the configured node spacing.
#[derive(Debug)]
pub struct ForceEngine {
    spring_constant: f32,
    repulsion_constant: f32,
    damping_factor: f32,
    jitter: f32,
    max_extent: f32,
}

impl Default for ForceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceEngine {
    pub fn new() -> Self {
        Self {
            spring_constant: 0.1,
            repulsion_constant: 1000.0,
            damping_factor: 0.85,
            jitter: 20.0,
            max_extent: 1200.0,
        }
    }

    /// Set the spring constant for edge forces
    pub fn set_spring_constant(&mut self, constant: f32) -> &mut Self {
        self.spring_constant = constant;
        self
    }

    /// Set the repulsion constant for node forces
    pub fn set_repulsion_constant(&mut self, constant: f32) -> &mut Self {
        self.repulsion_constant = constant;
        self
    }

    /// Set the damping factor for the simulation
    pub fn set_damping_factor(&mut self, factor: f32) -> &mut Self {
        self.damping_factor = factor;
        self
    }

    /// Set the maximum random offset applied to initial grid positions
    pub fn set_jitter(&mut self, jitter: f32) -> &mut Self {
        self.jitter = jitter;
        self
    }

    /// Set the extent above which the settled layout is scaled down
    pub fn set_max_extent(&mut self, extent: f32) -> &mut Self {
        self.max_extent = extent;
        self
    }

    /// Computes top-left positions for every node of `graph`.
    pub fn compute(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        let edges = graph.edge_indices()?;
        let sizes: Vec<Size> = graph.nodes.iter().map(|node| node.size).collect();
        let min_distance = options.node_spacing();
        let iterations = options.force_iterations();

        debug!(
            nodes = sizes.len(),
            edges = edges.len(),
            iterations = iterations,
            seed = options.random_seed();
            "Running force simulation"
        );

        let mut rng = StdRng::seed_from_u64(options.random_seed());
        let mut centers = self.initialize_positions(&sizes, min_distance, &mut rng);
        self.run_simulation(&mut centers, &sizes, &edges, min_distance, iterations);
        let centers = self.fit(centers);

        // Shift so the top-left of the bounding box sits at the origin.
        let (min_x, min_y) = centers.iter().zip(&sizes).fold(
            (f32::INFINITY, f32::INFINITY),
            |(min_x, min_y), (center, size)| {
                (
                    min_x.min(center.x() - size.width() / 2.0),
                    min_y.min(center.y() - size.height() / 2.0),
                )
            },
        );

        let mut positioned = PositionedGraph::new();
        for ((node, center), size) in graph.nodes.iter().zip(&centers).zip(&sizes) {
            let top_left = Point::new(
                center.x() - size.width() / 2.0 - min_x,
                center.y() - size.height() / 2.0 - min_y,
            );
            positioned.insert(node.id.clone(), top_left, Some(*size));
        }
        Ok(positioned)
    }

    /// Places node centers on a grid with seeded jitter.
    fn initialize_positions(&self, sizes: &[Size], min_distance: f32, rng: &mut StdRng) -> Vec<Point> {
        let grid_size = ((sizes.len() as f32).sqrt().ceil() as usize).max(1);
        let largest = sizes.iter().fold(Size::default(), |acc, size| acc.max(*size));
        let cell_width = largest.width() + min_distance;
        let cell_height = largest.height() + min_distance;

        (0..sizes.len())
            .map(|i| {
                let row = i / grid_size;
                let col = i % grid_size;
                let base = Point::new(col as f32 * cell_width, row as f32 * cell_height);
                if self.jitter > 0.0 {
                    let jitter = Point::new(
                        rng.random_range(-self.jitter..self.jitter),
                        rng.random_range(-self.jitter..self.jitter),
                    );
                    base.add_point(jitter)
                } else {
                    base
                }
            })
            .collect()
    }

    fn run_simulation(
        &self,
        positions: &mut [Point],
        sizes: &[Size],
        edges: &[(usize, usize)],
        min_distance: f32,
        iterations: usize,
    ) {
        let count = positions.len();
        let mut velocities = vec![Point::default(); count];

        for _ in 0..iterations {
            let mut forces = vec![Point::default(); count];

            for i in 0..count {
                for j in 0..count {
                    if i == j {
                        continue;
                    }
                    let trans = positions[i].sub_point(positions[j]);
                    let min_dist = (sizes[i].width()
                        + sizes[j].width()
                        + sizes[i].height()
                        + sizes[j].height())
                        / 4.0
                        + min_distance;

                    // Avoid division by zero
                    let distance = trans.hypot().max(1.0);

                    let force_factor = if distance < min_dist {
                        self.repulsion_constant * (min_dist / distance).powf(2.0)
                    } else {
                        self.repulsion_constant / distance
                    };
                    forces[i] = forces[i].add_point(trans.scale(force_factor / distance));
                }
            }

            for &(source, target) in edges {
                if source == target {
                    continue;
                }
                // Spring force proportional to distance
                let pull = positions[source]
                    .sub_point(positions[target])
                    .scale(self.spring_constant);
                forces[source] = forces[source].sub_point(pull);
                forces[target] = forces[target].add_point(pull);
            }

            for ((position, velocity), force) in positions.iter_mut().zip(&mut velocities).zip(&forces) {
                *velocity = velocity.add_point(*force).scale(self.damping_factor);
                *position = position.add_point(*velocity);
            }
        }
    }

    /// Centers the layout and scales it down when it grew past the maximum
    /// extent.
    fn fit(&self, positions: Vec<Point>) -> Vec<Point> {
        if positions.is_empty() {
            return positions;
        }
        let count = positions.len() as f32;
        let center = positions
            .iter()
            .fold(Point::default(), |acc, p| acc.add_point(*p))
            .scale(1.0 / count);
        let centered: Vec<Point> = positions.into_iter().map(|p| p.sub_point(center)).collect();

        let extent = centered
            .iter()
            .map(|p| p.x().abs().max(p.y().abs()))
            .fold(0.0, f32::max)
            * 2.0;
        if extent > self.max_extent {
            let factor = self.max_extent / extent;
            centered.into_iter().map(|p| p.scale(factor)).collect()
        } else {
            centered
        }
    }
}

impl LayoutEngine for ForceEngine {
    async fn layout(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        self.compute(graph, options)
    }
}
