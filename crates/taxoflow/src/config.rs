//! Application configuration.
//!
//! [`AppConfig::default`] carries the built-in bioenergy catalog: five tree
//! diagrams, the overview diagram linking them, the node dimension table and
//! the two layout presets. A TOML file may override any section.

use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use taxoflow_core::{
    color::Color,
    diagram::{EdgeStyle, HandlePosition},
    geometry::Size,
    layout_options::LayoutOptions,
};

use crate::{
    error::{ConfigError, TaxoflowError},
    factory::{FactoryOptions, FlexibleEdgeConfig, FlexibleNodeConfig},
    overview,
};

/// Application configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tree diagrams keyed by diagram id
    #[serde(default = "bioenergy_diagrams")]
    pub diagrams: IndexMap<String, DiagramConfig>,

    /// The top-level overview diagram
    #[serde(default)]
    pub overview: OverviewConfig,

    /// Node footprints by class name
    #[serde(default)]
    pub dimensions: DimensionConfig,

    /// Layout presets
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            diagrams: bioenergy_diagrams(),
            overview: OverviewConfig::default(),
            dimensions: DimensionConfig::default(),
            layout: LayoutConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn diagram(&self, id: &str) -> Option<&DiagramConfig> {
        self.diagrams.get(id)
    }

    pub fn with_diagram(mut self, id: impl Into<String>, diagram: DiagramConfig) -> Self {
        self.diagrams.insert(id.into(), diagram);
        self
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, diagram) in &self.diagrams {
            if id.trim().is_empty() {
                return Err(ConfigError::Validation("diagram id must not be empty".to_string()));
            }
            if diagram.data_source.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "diagram `{id}` has no data source"
                )));
            }
        }

        for (class, size) in self.dimensions.entries() {
            if !(size.width() > 0.0 && size.height() > 0.0) {
                return Err(ConfigError::Validation(format!(
                    "dimension `{class}` must be positive, got {}x{}",
                    size.width(),
                    size.height()
                )));
            }
        }

        let known = |id: &str| self.overview.nodes.iter().any(|node| node.id == id);
        for edge in &self.overview.edges {
            let unknown = std::iter::once(&edge.source)
                .chain(edge.target.as_slice())
                .find(|id| !known(id.as_str()));
            if let Some(id) = unknown {
                return Err(ConfigError::Validation(format!(
                    "overview edge references unknown node `{id}`"
                )));
            }
        }
        Ok(())
    }
}

/// Settings of one tree diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramConfig {
    /// Location of the JSON dataset, resolved by the fetcher
    pub data_source: String,

    /// Icon of the root node
    #[serde(default)]
    pub icon: Option<String>,

    pub class_names: ClassNames,

    #[serde(default)]
    pub id_prefixes: IdPrefixes,

    #[serde(default)]
    pub factory: FactoryOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNames {
    pub root: String,
    pub category: String,
    pub group: String,
    #[serde(default)]
    pub leaf: Option<String>,
}

impl ClassNames {
    /// Class names `{stem}-root`, `{stem}-cat`, `{stem}-group` and, for four
    /// levels, `{stem}-leaf`.
    pub fn for_stem(stem: &str, with_leaf: bool) -> Self {
        Self {
            root: format!("{stem}-root"),
            category: format!("{stem}-cat"),
            group: format!("{stem}-group"),
            leaf: with_leaf.then(|| format!("{stem}-leaf")),
        }
    }
}

/// Node id prefixes per level. Unset levels use the level name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdPrefixes {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub leaf: Option<String>,
}

impl IdPrefixes {
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or("category")
    }

    pub fn group(&self) -> &str {
        self.group.as_deref().unwrap_or("group")
    }

    pub fn leaf(&self) -> &str {
        self.leaf.as_deref().unwrap_or("leaf")
    }
}

/// The top-level overview diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    pub diagram_id: String,
    pub nodes: Vec<FlexibleNodeConfig>,
    pub edges: Vec<FlexibleEdgeConfig>,
    pub factory: FactoryOptions,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            diagram_id: overview::OVERVIEW_ID.to_string(),
            nodes: overview::default_nodes(),
            edges: overview::default_edges(),
            factory: FactoryOptions {
                default_node_type: Some("custom".to_string()),
                default_edge_type: Some("floating".to_string()),
                ..FactoryOptions::default()
            },
        }
    }
}

/// Node footprints used by the layout adapter
///
/// A node's class name is matched against the keys of `classes` in order; the
/// first key contained in the class name wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionConfig {
    pub default_size: Size,
    pub classes: IndexMap<String, Size>,
}

impl Default for DimensionConfig {
    fn default() -> Self {
        let classes = BIOENERGY_DIMENSIONS
            .iter()
            .map(|&(class, width, height)| (class.to_string(), Size::new(width, height)))
            .collect();
        Self {
            default_size: Size::new(300.0, 60.0),
            classes,
        }
    }
}

impl DimensionConfig {
    /// Footprint for `class_name`, falling back to the default size.
    pub fn lookup(&self, class_name: &str) -> Size {
        if class_name.is_empty() {
            return self.default_size;
        }
        self.classes
            .iter()
            .find(|(key, _)| class_name.contains(key.as_str()))
            .map_or(self.default_size, |(_, size)| *size)
    }

    fn entries(&self) -> impl Iterator<Item = (&str, Size)> {
        std::iter::once(("default_size", self.default_size))
            .chain(self.classes.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

/// Layout presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Options of flexible diagrams such as the overview
    pub base: LayoutOptions,
    /// Options of tree diagrams that configure none of their own
    pub tree: LayoutOptions,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base: LayoutOptions::base(),
            tree: LayoutOptions::tree(),
        }
    }
}

const BIOENERGY_DIMENSIONS: &[(&str, f32, f32)] = &[
    ("default-node", 300.0, 60.0),
    ("xducts-node", 180.0, 60.0),
    ("conversionProcedures-node", 250.0, 60.0),
    ("mix-node", 150.0, 60.0),
    ("processChains-node", 180.0, 60.0),
    ("supplyTasks-node", 250.0, 60.0),
    ("supplyConcepts-node", 250.0, 60.0),
    ("processChains-root", 300.0, 80.0),
    ("processChains-cat", 400.0, 55.0),
    ("processChains-group", 260.0, 35.0),
    ("processChains-leaf", 630.0, 35.0),
    ("supplyConcepts-root", 350.0, 80.0),
    ("supplyConcepts-cat", 350.0, 35.0),
    ("supplyConcepts-group", 500.0, 35.0),
    ("supplyTasks-root", 330.0, 80.0),
    ("supplyTasks-cat", 260.0, 55.0),
    ("supplyTasks-group", 350.0, 35.0),
    ("xducts-root", 250.0, 80.0),
    ("xducts-cat", 360.0, 40.0),
    ("xducts-group", 350.0, 35.0),
    ("xducts-leaf", 450.0, 35.0),
    ("conversionProcedures-root", 350.0, 80.0),
    ("conversionProcedures-cat", 350.0, 55.0),
    ("conversionProcedures-group", 500.0, 40.0),
];

/// The five bioenergy tree diagrams.
pub fn bioenergy_diagrams() -> IndexMap<String, DiagramConfig> {
    // (id, data source, class stem, four levels, icon, prefixes, stroke)
    let entries = [
        (
            "process_chains",
            "./prozessketten_daten.json",
            "processChains",
            true,
            "network",
            IdPrefixes {
                leaf: Some("chain".to_string()),
                ..IdPrefixes::default()
            },
            "#9394db",
        ),
        (
            "supply_tasks",
            "./versorgungsaufgaben_daten.json",
            "supplyTasks",
            false,
            "list-todo",
            IdPrefixes {
                group: Some("task".to_string()),
                ..IdPrefixes::default()
            },
            "#fcd34d",
        ),
        (
            "supply_concepts",
            "./versorgungskonzepte_daten.json",
            "supplyConcepts",
            false,
            "lightbulb",
            IdPrefixes {
                group: Some("concept".to_string()),
                ..IdPrefixes::default()
            },
            "#6ee7b7",
        ),
        (
            "xducts",
            "./xdukte_daten.json",
            "xducts",
            true,
            "atom",
            IdPrefixes {
                leaf: Some("xduct".to_string()),
                ..IdPrefixes::default()
            },
            "#a3e635",
        ),
        (
            "conversion_procedures",
            "./konversionsverfahren_daten.json",
            "conversionProcedures",
            false,
            "settings",
            IdPrefixes {
                group: Some("procedure".to_string()),
                ..IdPrefixes::default()
            },
            "#7dd3fc",
        ),
    ];

    entries
        .into_iter()
        .map(|(id, source, stem, with_leaf, icon, id_prefixes, stroke)| {
            let diagram = DiagramConfig {
                data_source: source.to_string(),
                icon: Some(icon.to_string()),
                class_names: ClassNames::for_stem(stem, with_leaf),
                id_prefixes,
                factory: FactoryOptions {
                    default_node_type: Some("custom".to_string()),
                    default_source_position: Some(HandlePosition::Right),
                    default_target_position: Some(HandlePosition::Left),
                    edge_style: Some(EdgeStyle::new(
                        Color::new(stroke).unwrap_or_default(),
                        2.0,
                    )),
                    ..FactoryOptions::default()
                },
            };
            (id.to_string(), diagram)
        })
        .collect()
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (taxoflow/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or fails validation
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, TaxoflowError> {
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local_config = Path::new("taxoflow/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "taxoflow", "taxoflow") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, TaxoflowError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(PathBuf::from(path)).into());
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.validate()?;

    Ok(config)
}
