//! Layout engines.
//!
//! The adapter talks to engines through [`LayoutEngine`]. Two built-in
//! engines cover the algorithms used by the bioenergy diagrams:
//!
//! - [`LayeredEngine`]: layered drawing of directed graphs (Sugiyama) for
//!   tree diagrams.
//! - [`ForceEngine`]: seeded force-directed placement for the overview.
//!
//! [`AutoEngine`] picks one of them from the `elk.algorithm` option.

mod force;
mod layered;

use std::future::Future;

use log::debug;

use taxoflow_core::layout_options::{Algorithm, LayoutOptions};

use crate::{
    error::LayoutError,
    layout::{LayoutGraph, PositionedGraph},
};

pub use force::ForceEngine;
pub use layered::LayeredEngine;

/// An asynchronous graph layout algorithm.
///
/// Engines may fail; the adapter falls back to unpositioned nodes when they
/// do. They are never called with an empty graph.
pub trait LayoutEngine {
    fn layout(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> impl Future<Output = Result<PositionedGraph, LayoutError>>;
}

/// Dispatches on the configured algorithm.
#[derive(Debug, Default)]
pub struct AutoEngine {
    layered: LayeredEngine,
    force: ForceEngine,
}

impl AutoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layered(mut self, engine: LayeredEngine) -> Self {
        self.layered = engine;
        self
    }

    pub fn with_force(mut self, engine: ForceEngine) -> Self {
        self.force = engine;
        self
    }
}

impl LayoutEngine for AutoEngine {
    async fn layout(
        &self,
        graph: &LayoutGraph,
        options: &LayoutOptions,
    ) -> Result<PositionedGraph, LayoutError> {
        let algorithm = options.algorithm();
        debug!(algorithm:? = algorithm, nodes = graph.nodes.len(); "Selecting layout engine");
        match algorithm {
            Algorithm::Layered => self.layered.compute(graph, options),
            Algorithm::Force => self.force.compute(graph, options),
            Algorithm::Other(name) => Err(LayoutError::Engine(format!(
                "unsupported layout algorithm `{name}`"
            ))),
        }
    }
}
