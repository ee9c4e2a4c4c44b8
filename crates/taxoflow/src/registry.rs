//! The keyed store of rendered diagrams.
//!
//! A [`DiagramRegistry`] maps a diagram identity to exactly one
//! [`DiagramRecord`]. Registration never overwrites: replacing a diagram means
//! removing its record and registering a fresh one within the same synchronous
//! call, so no caller ever observes a half-updated node or edge list.

use indexmap::IndexMap;
use log::{debug, error, trace, warn};

use taxoflow_core::{
    diagram::{DiagramEdge, DiagramNode},
    layout_options::LayoutOptions,
    tree::TreeNode,
};

use crate::factory::ResolvedFactoryOptions;

/// One registered diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramRecord {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
    pub layout_options: Option<LayoutOptions>,
    tree: Option<TreeNode>,
    factory_options: Option<ResolvedFactoryOptions>,
}

impl DiagramRecord {
    /// A record without a backing tree, as produced by the flexible factory.
    pub fn new(
        nodes: Vec<DiagramNode>,
        edges: Vec<DiagramEdge>,
        layout_options: Option<LayoutOptions>,
    ) -> Self {
        Self {
            nodes,
            edges,
            layout_options,
            tree: None,
            factory_options: None,
        }
    }

    /// Attaches the live tree and the options needed to regenerate from it.
    pub fn with_tree(mut self, tree: TreeNode, factory_options: ResolvedFactoryOptions) -> Self {
        self.tree = Some(tree);
        self.factory_options = Some(factory_options);
        self
    }

    pub fn tree(&self) -> Option<&TreeNode> {
        self.tree.as_ref()
    }

    pub fn factory_options(&self) -> Option<&ResolvedFactoryOptions> {
        self.factory_options.as_ref()
    }

    pub fn node(&self, id: &str) -> Option<&DiagramNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Splits the record into its tree and factory options, if it has both.
    pub(crate) fn into_tree_parts(self) -> Option<(TreeNode, ResolvedFactoryOptions)> {
        self.tree.zip(self.factory_options)
    }
}

/// A tree diagram looked up by [`DiagramRegistry::get_tree_entry`].
#[derive(Debug, Clone, Copy)]
pub struct TreeEntry<'a> {
    pub record: &'a DiagramRecord,
    pub tree: &'a TreeNode,
    pub factory_options: &'a ResolvedFactoryOptions,
}

#[derive(Debug, Default)]
pub struct DiagramRegistry {
    records: IndexMap<String, DiagramRecord>,
}

impl DiagramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a diagram without a backing tree.
    ///
    /// Returns `false` and leaves the registry untouched when `id` is blank or
    /// already registered.
    pub fn register(
        &mut self,
        id: &str,
        nodes: Vec<DiagramNode>,
        edges: Vec<DiagramEdge>,
        layout_options: Option<LayoutOptions>,
    ) -> bool {
        self.register_record(id, DiagramRecord::new(nodes, edges, layout_options))
    }

    /// Registers a complete record under the same rules as [`Self::register`].
    pub fn register_record(&mut self, id: &str, record: DiagramRecord) -> bool {
        if id.trim().is_empty() {
            error!("Refusing to register a diagram with an empty id");
            return false;
        }
        if self.records.contains_key(id) {
            warn!(diagram_id = id; "Diagram already registered, ignoring registration");
            return false;
        }

        debug!(
            diagram_id = id,
            nodes = record.nodes.len(),
            edges = record.edges.len(),
            tree = record.tree.is_some();
            "Registered diagram"
        );
        self.records.insert(id.to_string(), record);
        true
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&DiagramRecord> {
        self.records.get(id)
    }

    /// Looks up a diagram that carries a live tree. Flexible diagrams yield
    /// `None`.
    pub fn get_tree_entry(&self, id: &str) -> Option<TreeEntry<'_>> {
        let record = self.records.get(id)?;
        let tree = record.tree.as_ref()?;
        let factory_options = record.factory_options.as_ref()?;
        Some(TreeEntry {
            record,
            tree,
            factory_options,
        })
    }

    /// Mutable access to the live tree of a diagram.
    ///
    /// Changes only become visible in the node and edge lists after the
    /// diagram is regenerated.
    pub fn tree_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        self.records.get_mut(id)?.tree.as_mut()
    }

    /// Runs `register` only if `id` is not registered yet.
    ///
    /// Returns whether the closure ran.
    pub fn try_register<F>(&mut self, id: &str, register: F) -> bool
    where
        F: FnOnce(&mut Self),
    {
        if self.is_registered(id) {
            trace!(diagram_id = id; "Diagram already registered, skipping");
            return false;
        }
        register(self);
        true
    }

    /// Deletes a diagram, returning its record.
    pub fn remove(&mut self, id: &str) -> Option<DiagramRecord> {
        self.records.shift_remove(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
