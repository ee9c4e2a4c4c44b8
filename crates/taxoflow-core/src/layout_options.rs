//! Layout configuration as ELK-style key/value strings.
//!
//! Options are stored verbatim so that a configuration written for an ELK
//! deployment round-trips unchanged. Typed accessors read the subset the
//! built-in engines understand, accepting both the short `elk.` and the long
//! `org.eclipse.elk.` key forms.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const ALGORITHM: &str = "elk.algorithm";
pub const DIRECTION: &str = "elk.direction";
pub const SPACING_NODE_NODE: &str = "elk.spacing.nodeNode";
pub const SPACING_EDGE_NODE: &str = "elk.spacing.edgeNode";
pub const SPACING_BETWEEN_LAYERS: &str = "elk.layered.spacing.nodeNodeBetweenLayers";
pub const FORCE_ITERATIONS: &str = "elk.force.iterations";
pub const RANDOM_SEED: &str = "elk.randomSeed";

/// Container width below which spacing is tightened.
pub const COMPACT_WIDTH_THRESHOLD: f32 = 768.0;
const COMPACT_SPACING: &str = "5";

const LONG_PREFIX: &str = "org.eclipse.";

/// Layout algorithm family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Algorithm {
    Layered,
    Force,
    Other(String),
}

impl FromStr for Algorithm {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.strip_prefix("org.eclipse.elk.").unwrap_or(s);
        Ok(match short {
            "layered" => Self::Layered,
            "force" => Self::Force,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Main flow direction of a layered layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Right,
    Left,
    Down,
    Up,
}

impl Direction {
    /// Whether layers advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RIGHT" => Ok(Self::Right),
            "LEFT" => Ok(Self::Left),
            "DOWN" => Ok(Self::Down),
            "UP" => Ok(Self::Up),
            _ => Err(format!("unknown direction `{s}`")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayoutOptions(IndexMap<String, String>);

impl LayoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Looks up `key`, falling back to its `org.eclipse.` spelling.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .or_else(|| self.0.get(&format!("{LONG_PREFIX}{key}")))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    pub fn algorithm(&self) -> Algorithm {
        self.get(ALGORITHM)
            .and_then(|v| v.parse().ok())
            .unwrap_or(Algorithm::Layered)
    }

    pub fn direction(&self) -> Direction {
        self.parsed(DIRECTION).unwrap_or_default()
    }

    /// Spacing between nodes of the same layer.
    pub fn node_spacing(&self) -> f32 {
        self.parsed(SPACING_NODE_NODE).unwrap_or(20.0)
    }

    /// Spacing between adjacent layers.
    pub fn layer_spacing(&self) -> f32 {
        self.parsed(SPACING_BETWEEN_LAYERS).unwrap_or(20.0)
    }

    pub fn force_iterations(&self) -> usize {
        self.parsed(FORCE_ITERATIONS).unwrap_or(300)
    }

    pub fn random_seed(&self) -> u64 {
        self.parsed(RANDOM_SEED).unwrap_or(1)
    }

    /// Returns a copy with node/edge spacing tightened for narrow containers.
    ///
    /// Widths at or above [`COMPACT_WIDTH_THRESHOLD`], and a missing width,
    /// leave the options untouched.
    pub fn for_container_width(&self, container_width: Option<f32>) -> Self {
        let mut options = self.clone();
        if container_width.is_some_and(|w| w > 0.0 && w < COMPACT_WIDTH_THRESHOLD) {
            options.set(SPACING_NODE_NODE, COMPACT_SPACING);
            options.set(SPACING_EDGE_NODE, COMPACT_SPACING);
        }
        options
    }

    /// Options for the top-level overview: a seeded force layout.
    pub fn base() -> Self {
        Self::new()
            .with(ALGORITHM, "force")
            .with(SPACING_NODE_NODE, "100")
            .with("elk.force.model", "EADES")
            .with(FORCE_ITERATIONS, "15")
            .with("elk.interactive", "true")
            .with(RANDOM_SEED, "66666665")
    }

    /// Options for tree sub-diagrams: a left-to-right layered layout.
    pub fn tree() -> Self {
        Self::new()
            .with(ALGORITHM, "org.eclipse.elk.layered")
            .with(DIRECTION, "RIGHT")
            .with("org.eclipse.elk.layered.spacing.nodeNodeBetweenLayers", "50")
            .with("org.eclipse.elk.spacing.nodeNode", "10")
            .with("org.eclipse.elk.layered.spacing.edgeNodeBetweenLayers", "50")
            .with("org.eclipse.elk.layered.spacing.edgeEdgeBetweenLayers", "10")
            .with("elk.layered.considerModelOrder.strategy", "NODES_AND_EDGES")
            .with("elk.layered.cycleBreaking.strategy", "DEPTH_FIRST")
            .with("elk.layered.nodePlacement.strategy", "NETWORK_SIMPLEX")
            .with("elk.layered.crossingMinimization.strategy", "LAYER_SWEEP")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LayoutOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
