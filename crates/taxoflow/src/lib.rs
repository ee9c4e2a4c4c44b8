//! Taxoflow - interactive taxonomy diagrams for bioenergy datasets.
//!
//! Turns hierarchical JSON datasets into collapsible tree diagrams, keeps
//! them in a keyed registry, and lays them out with a pluggable layout engine.
//! The [`Explorer`] ties the stages together the way an interactive viewer
//! uses them: open the overview, click into a dataset, expand and collapse
//! nodes, lay out whatever is visible.

pub mod config;
pub mod dataset;
pub mod error;
pub mod expand;
pub mod factory;
pub mod layout;
pub mod loader;
pub mod overview;
pub mod registry;
pub mod transform;

pub use taxoflow_core::{
    color, diagram, floating, geometry, layout_options, localization, table, tree,
};

pub use error::TaxoflowError;

use std::{
    cell::{Ref, RefCell},
    collections::HashMap,
};

use log::{debug, info, trace};

use taxoflow_core::layout_options::LayoutOptions;

use config::AppConfig;
use dataset::TransformTable;
use layout::{AutoEngine, LayoutEngine, LayoutResult};
use loader::{JsonFetcher, LoadOutcome, Loader};
use registry::DiagramRegistry;

/// What a node click resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// The node's table was opened. Carries the node id.
    ShowTable(String),
    /// The node's table was open and has been closed.
    HideTable,
    /// The node's collapse flag was flipped and its diagram regenerated.
    Toggled,
    /// The node names a tree diagram, which is now loaded and current.
    Navigate(String),
    /// Nothing to do for this node.
    Ignored,
}

struct CachedLayout {
    options: LayoutOptions,
    result: LayoutResult,
}

/// Owns the registry and everything needed to fill and lay it out.
///
/// All state sits behind `RefCell`s so operations take `&self`. No borrow is
/// held across an `.await`, so a load may run while other diagrams are
/// toggled or laid out.
///
/// # Examples
///
/// ```rust,no_run
/// use futures::executor::block_on;
/// use taxoflow::{Explorer, config::AppConfig, loader::FileFetcher};
///
/// let explorer = Explorer::new(AppConfig::default(), FileFetcher::new("public"));
/// explorer.register_overview();
/// block_on(explorer.open("xducts")).expect("Failed to load dataset");
/// let layout = block_on(explorer.layout("xducts", Some(1280.0), false));
/// ```
pub struct Explorer<F, E = AutoEngine> {
    config: AppConfig,
    registry: RefCell<DiagramRegistry>,
    transforms: TransformTable,
    fetcher: F,
    engine: E,
    layout_cache: RefCell<HashMap<String, CachedLayout>>,
    /// Bumped whenever a diagram's nodes change, so layouts started before
    /// the change are not cached.
    generations: RefCell<HashMap<String, u64>>,
    active_table: RefCell<Option<String>>,
    current: RefCell<Option<String>>,
}

impl<F: JsonFetcher> Explorer<F> {
    /// Creates an explorer with the bioenergy transforms and the automatic
    /// layout engine.
    pub fn new(config: AppConfig, fetcher: F) -> Self {
        Self {
            config,
            registry: RefCell::new(DiagramRegistry::new()),
            transforms: TransformTable::bioenergy(),
            fetcher,
            engine: AutoEngine::new(),
            layout_cache: RefCell::new(HashMap::new()),
            generations: RefCell::new(HashMap::new()),
            active_table: RefCell::new(None),
            current: RefCell::new(None),
        }
    }
}

impl<F: JsonFetcher, E: LayoutEngine> Explorer<F, E> {
    /// Replaces the layout engine. Cached layouts are dropped.
    pub fn with_engine<E2: LayoutEngine>(self, engine: E2) -> Explorer<F, E2> {
        Explorer {
            config: self.config,
            registry: self.registry,
            transforms: self.transforms,
            fetcher: self.fetcher,
            engine,
            layout_cache: RefCell::new(HashMap::new()),
            generations: self.generations,
            active_table: self.active_table,
            current: self.current,
        }
    }

    pub fn with_transforms(mut self, transforms: TransformTable) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Read access to the registry. Do not hold the guard across an await.
    pub fn registry(&self) -> Ref<'_, DiagramRegistry> {
        self.registry.borrow()
    }

    /// The diagram most recently opened.
    pub fn current_diagram(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    /// Node id whose table is open, if any.
    pub fn active_table(&self) -> Option<String> {
        self.active_table.borrow().clone()
    }

    pub fn close_table(&self) {
        self.active_table.replace(None);
    }

    /// Registers the overview and makes it current if nothing is.
    pub fn register_overview(&self) -> bool {
        let registered =
            overview::register_overview(&mut self.registry.borrow_mut(), &self.config);
        let mut current = self.current.borrow_mut();
        if current.is_none() {
            *current = Some(self.config.overview.diagram_id.clone());
        }
        registered
    }

    /// Opens a diagram, loading it first if needed, and makes it current.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the dataset cannot be fetched or
    /// transformed. The current diagram is unchanged in that case.
    pub async fn open(&self, diagram_id: &str) -> Result<LoadOutcome, TaxoflowError> {
        let outcome = if diagram_id == self.config.overview.diagram_id {
            if self.register_overview() {
                LoadOutcome::Registered
            } else {
                LoadOutcome::AlreadyRegistered
            }
        } else {
            self.loader().load(&self.registry, diagram_id).await?
        };
        if outcome == LoadOutcome::Registered {
            self.invalidate(diagram_id);
        }

        info!(diagram_id = diagram_id, outcome:? = outcome; "Opened diagram");
        self.current.replace(Some(diagram_id.to_string()));
        self.close_table();
        Ok(outcome)
    }

    /// Makes the overview current again.
    pub fn back(&self) {
        self.register_overview();
        self.current
            .replace(Some(self.config.overview.diagram_id.clone()));
        self.close_table();
    }

    /// Fetches a tree diagram again, keeping its expanded nodes.
    ///
    /// # Errors
    ///
    /// Returns the loader's error; the previous registration stays in place.
    pub async fn reload(&self, diagram_id: &str) -> Result<LoadOutcome, TaxoflowError> {
        let outcome = self.loader().reload(&self.registry, diagram_id).await?;
        self.invalidate(diagram_id);
        Ok(outcome)
    }

    pub fn toggle_node(&self, diagram_id: &str, node_id: &str) -> bool {
        let toggled = expand::toggle_node(&mut self.registry.borrow_mut(), diagram_id, node_id);
        if toggled {
            self.invalidate(diagram_id);
        }
        toggled
    }

    pub fn toggle_all(&self, diagram_id: &str, collapsed: bool) -> bool {
        let toggled = expand::toggle_all(&mut self.registry.borrow_mut(), diagram_id, collapsed);
        if toggled {
            self.invalidate(diagram_id);
        }
        toggled
    }

    /// Lays out a registered diagram.
    ///
    /// Results are cached per diagram and reused while the diagram is
    /// unchanged and the effective options are the same; `force` bypasses the
    /// cache. A result is not cached if the diagram changed while the engine
    /// ran. Returns `None` for unregistered diagrams.
    pub async fn layout(
        &self,
        diagram_id: &str,
        container_width: Option<f32>,
        force: bool,
    ) -> Option<LayoutResult> {
        let generation = self.generation(diagram_id);
        let (nodes, edges, options) = {
            let registry = self.registry.borrow();
            let record = registry.get(diagram_id)?;
            let options = record
                .layout_options
                .as_ref()
                .unwrap_or(&self.config.layout.base)
                .for_container_width(container_width);
            (record.nodes.clone(), record.edges.clone(), options)
        };

        if !force {
            if let Some(cached) = self.layout_cache.borrow().get(diagram_id) {
                if cached.options == options {
                    trace!(diagram_id = diagram_id; "Using cached layout");
                    return Some(cached.result.clone());
                }
            }
        }

        let result = layout::layout_elements(
            &nodes,
            &edges,
            &options,
            &self.config.dimensions,
            &self.engine,
        )
        .await;
        debug!(diagram_id = diagram_id, outcome:? = result.outcome; "Laid out diagram");

        if self.generation(diagram_id) != generation {
            debug!(diagram_id = diagram_id; "Diagram changed during layout, not caching");
            return Some(result);
        }
        self.layout_cache.borrow_mut().insert(
            diagram_id.to_string(),
            CachedLayout {
                options,
                result: result.clone(),
            },
        );
        Some(result)
    }

    /// Decides and performs what clicking `node_id` in `diagram_id` does.
    ///
    /// A node carrying table data toggles its table. Otherwise a node of a
    /// tree diagram toggles its collapse flag, and a node named after a
    /// configured tree diagram opens that diagram.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when opening a diagram fails.
    pub async fn node_click(
        &self,
        diagram_id: &str,
        node_id: &str,
    ) -> Result<ClickAction, TaxoflowError> {
        let (has_table, is_tree) = {
            let registry = self.registry.borrow();
            let Some(record) = registry.get(diagram_id) else {
                return Ok(ClickAction::Ignored);
            };
            let has_table = record
                .node(node_id)
                .is_some_and(|node| node.data.table.is_some());
            (has_table, record.tree().is_some())
        };

        if has_table {
            let mut active = self.active_table.borrow_mut();
            if active.as_deref() == Some(node_id) {
                *active = None;
                return Ok(ClickAction::HideTable);
            }
            *active = Some(node_id.to_string());
            return Ok(ClickAction::ShowTable(node_id.to_string()));
        }

        if is_tree {
            return Ok(if self.toggle_node(diagram_id, node_id) {
                ClickAction::Toggled
            } else {
                ClickAction::Ignored
            });
        }

        if self.config.diagram(node_id).is_some() {
            self.open(node_id).await?;
            return Ok(ClickAction::Navigate(node_id.to_string()));
        }

        Ok(ClickAction::Ignored)
    }

    fn loader(&self) -> Loader<'_, F> {
        Loader::new(&self.config, &self.fetcher, &self.transforms)
    }

    fn generation(&self, diagram_id: &str) -> u64 {
        self.generations
            .borrow()
            .get(diagram_id)
            .copied()
            .unwrap_or_default()
    }

    fn invalidate(&self, diagram_id: &str) {
        self.layout_cache.borrow_mut().remove(diagram_id);
        *self
            .generations
            .borrow_mut()
            .entry(diagram_id.to_string())
            .or_default() += 1;
    }
}
