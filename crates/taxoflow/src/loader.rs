//! On-demand loading of tree diagrams.
//!
//! A [`Loader`] fetches a diagram's dataset through a [`JsonFetcher`], runs
//! the diagram's transform and registers the resulting tree. Any failure
//! before registration leaves the registry exactly as it was.

use std::{
    cell::RefCell,
    fs,
    future::Future,
    path::{Path, PathBuf},
    time::Instant,
};

use log::{debug, error, info, trace, warn};
use serde_json::Value;

use taxoflow_core::tree::TreeNode;

use crate::{
    config::{AppConfig, DiagramConfig},
    dataset::TransformTable,
    error::TaxoflowError,
    expand::initialize_tree,
    factory::{FactoryOptions, create_tree_diagram},
    registry::DiagramRegistry,
};

/// Fetches a JSON document.
///
/// Implementations report a non-success response as
/// [`TaxoflowError::Http`] carrying the status.
pub trait JsonFetcher {
    fn fetch_json(&self, url: &str) -> impl Future<Output = Result<Value, TaxoflowError>>;
}

/// Reads datasets from the file system, relative to a base directory.
///
/// Reads are synchronous: `fetch_json` blocks the calling thread until the
/// file is read. Do not drive it on an executor shared with other tasks.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    base: PathBuf,
}

impl FileFetcher {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Resolves a data source such as `./xdukte_daten.json` against the base.
    pub fn resolve(&self, url: &str) -> PathBuf {
        let relative = url.strip_prefix("./").unwrap_or(url);
        let path = Path::new(relative);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        }
    }
}

impl JsonFetcher for FileFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, TaxoflowError> {
        let path = self.resolve(url);
        trace!(path = path.display().to_string(); "Reading dataset");
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// What a load call did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The diagram was already registered; nothing was fetched.
    AlreadyRegistered,
    /// The diagram was fetched, transformed and registered.
    Registered,
    /// Another load registered the diagram while this one was fetching. The
    /// registry keeps the first registration.
    Superseded,
    /// The dataset was fetched but the registry refused it, for example
    /// because a diagram without a tree holds the id.
    Rejected,
}

pub struct Loader<'a, F> {
    config: &'a AppConfig,
    fetcher: &'a F,
    transforms: &'a TransformTable,
}

impl<'a, F: JsonFetcher> Loader<'a, F> {
    pub fn new(config: &'a AppConfig, fetcher: &'a F, transforms: &'a TransformTable) -> Self {
        Self {
            config,
            fetcher,
            transforms,
        }
    }

    /// Loads `diagram_id` unless it is already registered.
    ///
    /// The registry is only borrowed before and after the fetch, never across
    /// it.
    ///
    /// # Errors
    ///
    /// Returns an error if the diagram is not configured, or if fetching or
    /// transforming its dataset fails. The registry is unchanged in that case.
    pub async fn load(
        &self,
        registry: &RefCell<DiagramRegistry>,
        diagram_id: &str,
    ) -> Result<LoadOutcome, TaxoflowError> {
        if registry.borrow().is_registered(diagram_id) {
            trace!(diagram_id = diagram_id; "Diagram already loaded");
            return Ok(LoadOutcome::AlreadyRegistered);
        }

        let (diagram, root) = self.fetch_tree(diagram_id).await?;

        let mut registry = registry.borrow_mut();
        if registry.is_registered(diagram_id) {
            warn!(diagram_id = diagram_id; "Diagram was registered during load, dropping result");
            return Ok(LoadOutcome::Superseded);
        }
        Ok(self.register(&mut registry, diagram_id, diagram, root))
    }

    /// Fetches and registers `diagram_id` again, keeping the collapse state
    /// of nodes that survive by id.
    ///
    /// # Errors
    ///
    /// Same as [`Loader::load`]; on error the previous registration stays.
    pub async fn reload(
        &self,
        registry: &RefCell<DiagramRegistry>,
        diagram_id: &str,
    ) -> Result<LoadOutcome, TaxoflowError> {
        let (diagram, root) = self.fetch_tree(diagram_id).await?;
        Ok(self.register(&mut registry.borrow_mut(), diagram_id, diagram, root))
    }

    async fn fetch_tree(&self, diagram_id: &str) -> Result<(&'a DiagramConfig, TreeNode), TaxoflowError> {
        let diagram = self
            .config
            .diagram(diagram_id)
            .ok_or_else(|| TaxoflowError::UnknownDiagram(diagram_id.to_string()))?;

        let start = Instant::now();
        let value = self
            .fetcher
            .fetch_json(&diagram.data_source)
            .await
            .inspect_err(|err| {
                error!(diagram_id = diagram_id, url = diagram.data_source.as_str(), err:% = err; "Failed to fetch dataset");
            })?;
        debug!(
            diagram_id = diagram_id,
            elapsed_ms = start.elapsed().as_millis();
            "Fetched dataset"
        );

        let start = Instant::now();
        let root = self
            .transforms
            .apply(diagram_id, value, diagram)
            .inspect_err(|err| {
                error!(diagram_id = diagram_id, err:% = err; "Failed to transform dataset");
            })?;
        debug!(
            diagram_id = diagram_id,
            nodes = root.len(),
            elapsed_ms = start.elapsed().as_millis();
            "Transformed dataset"
        );

        Ok((diagram, root))
    }

    fn register(
        &self,
        registry: &mut DiagramRegistry,
        diagram_id: &str,
        diagram: &DiagramConfig,
        mut root: TreeNode,
    ) -> LoadOutcome {
        let restored = initialize_tree(registry, diagram_id, &mut root);
        let options = self.factory_options(diagram);
        let registered = create_tree_diagram(registry, diagram_id, root, &options);
        if registered {
            info!(diagram_id = diagram_id, restored = restored; "Loaded diagram");
            LoadOutcome::Registered
        } else {
            warn!(diagram_id = diagram_id; "Registry refused loaded diagram");
            LoadOutcome::Rejected
        }
    }

    /// The diagram's factory options, with the tree layout preset when it
    /// sets no layout of its own.
    fn factory_options(&self, diagram: &DiagramConfig) -> FactoryOptions {
        let mut options = diagram.factory.clone();
        options
            .layout_options
            .get_or_insert_with(|| self.config.layout.tree.clone());
        options
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use futures::executor::block_on;
    use serde_json::json;

    use taxoflow_core::layout_options::LayoutOptions;

    use super::*;
    use crate::{
        diagram::DiagramNode, error::TransformError, expand::toggle_node,
        localization::Label, tree::NodeData,
    };

    #[derive(Default)]
    struct MapFetcher {
        documents: HashMap<String, Value>,
    }

    impl MapFetcher {
        fn with(mut self, url: &str, value: Value) -> Self {
            self.documents.insert(url.to_string(), value);
            self
        }
    }

    impl JsonFetcher for MapFetcher {
        async fn fetch_json(&self, url: &str) -> Result<Value, TaxoflowError> {
            self.documents
                .get(url)
                .cloned()
                .ok_or_else(|| TaxoflowError::Http {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn tasks_dataset() -> Value {
        json!([
            {"id": 1, "name_german": "Wärme", "name_english": "heat", "tasks": [
                {"id": 10, "name_german": "Raumwärme", "name_english": "space heating"}
            ]},
            {"id": 2, "name_german": "Strom", "name_english": "power", "tasks": []}
        ])
    }

    fn tasks_url(config: &AppConfig) -> String {
        config.diagram("supply_tasks").unwrap().data_source.clone()
    }

    #[test]
    fn test_load_registers_collapsed_tree() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default().with(&tasks_url(&config), tasks_dataset());
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        let outcome = block_on(loader.load(&registry, "supply_tasks")).unwrap();
        assert_eq!(outcome, LoadOutcome::Registered);

        let registry = registry.borrow();
        let record = registry.get("supply_tasks").unwrap();
        // Root plus two categories; groups stay hidden below collapsed categories.
        assert_eq!(record.nodes.len(), 3);
        assert_eq!(record.edges.len(), 2);
        assert_eq!(record.layout_options, Some(LayoutOptions::tree()));
    }

    #[test]
    fn test_load_is_idempotent() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default().with(&tasks_url(&config), tasks_dataset());
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        block_on(loader.load(&registry, "supply_tasks")).unwrap();
        toggle_node(&mut registry.borrow_mut(), "supply_tasks", "category-1");
        let before = registry.borrow().get("supply_tasks").cloned();

        let outcome = block_on(loader.load(&registry, "supply_tasks")).unwrap();
        assert_eq!(outcome, LoadOutcome::AlreadyRegistered);
        assert_eq!(registry.borrow().get("supply_tasks").cloned(), before);
    }

    #[test]
    fn test_failed_fetch_leaves_registry_unchanged() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default();
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        let err = block_on(loader.load(&registry, "supply_tasks")).unwrap_err();
        assert!(matches!(err, TaxoflowError::Http { status: 404, .. }));
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn test_failed_transform_leaves_registry_unchanged() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default().with(&tasks_url(&config), json!({"tasks": []}));
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        let err = block_on(loader.load(&registry, "supply_tasks")).unwrap_err();
        assert!(matches!(
            err,
            TaxoflowError::Transform(TransformError::NotAnArray { .. })
        ));
        assert!(registry.borrow().is_empty());
    }

    #[test]
    fn test_unknown_diagram() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default();
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        let err = block_on(loader.load(&registry, "mix")).unwrap_err();
        assert!(matches!(err, TaxoflowError::UnknownDiagram(id) if id == "mix"));
    }

    #[test]
    fn test_reload_keeps_expanded_nodes() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default().with(&tasks_url(&config), tasks_dataset());
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        block_on(loader.load(&registry, "supply_tasks")).unwrap();
        assert!(toggle_node(&mut registry.borrow_mut(), "supply_tasks", "category-1"));
        assert_eq!(registry.borrow().get("supply_tasks").unwrap().nodes.len(), 4);

        let outcome = block_on(loader.reload(&registry, "supply_tasks")).unwrap();
        assert_eq!(outcome, LoadOutcome::Registered);
        let registry = registry.borrow();
        let record = registry.get("supply_tasks").unwrap();
        assert_eq!(record.nodes.len(), 4);
        assert!(record.node("task-10").is_some());
    }

    #[test]
    fn test_failed_reload_keeps_previous_record() {
        let config = AppConfig::default();
        let url = tasks_url(&config);
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());

        let fetcher = MapFetcher::default().with(&url, tasks_dataset());
        block_on(Loader::new(&config, &fetcher, &transforms).load(&registry, "supply_tasks")).unwrap();
        let before = registry.borrow().get("supply_tasks").cloned();

        let broken = MapFetcher::default().with(&url, json!("oops"));
        assert!(block_on(Loader::new(&config, &broken, &transforms).reload(&registry, "supply_tasks")).is_err());
        assert_eq!(registry.borrow().get("supply_tasks").cloned(), before);
    }

    #[test]
    fn test_reload_over_flat_diagram_is_rejected() {
        let config = AppConfig::default();
        let fetcher = MapFetcher::default().with(&tasks_url(&config), tasks_dataset());
        let transforms = TransformTable::bioenergy();
        let registry = RefCell::new(DiagramRegistry::new());
        let loader = Loader::new(&config, &fetcher, &transforms);

        let flat = vec![DiagramNode::new("a", NodeData::new(Label::from("a")), "default", "c")];
        assert!(registry.borrow_mut().register("supply_tasks", flat, Vec::new(), None));
        let before = registry.borrow().get("supply_tasks").cloned();

        let outcome = block_on(loader.reload(&registry, "supply_tasks")).unwrap();
        assert_eq!(outcome, LoadOutcome::Rejected);
        assert_eq!(registry.borrow().get("supply_tasks").cloned(), before);
    }

    #[test]
    fn test_file_fetcher_resolves_relative_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("aufgaben.json")).unwrap();
        writeln!(file, r#"[{{"id": 1}}]"#).unwrap();

        let fetcher = FileFetcher::new(dir.path());
        assert_eq!(fetcher.resolve("./aufgaben.json"), dir.path().join("aufgaben.json"));

        let value = block_on(fetcher.fetch_json("./aufgaben.json")).unwrap();
        assert_eq!(value, json!([{"id": 1}]));

        let err = block_on(fetcher.fetch_json("./missing.json")).unwrap_err();
        assert!(matches!(err, TaxoflowError::Io(_)));
    }
}
