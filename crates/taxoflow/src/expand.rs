//! Expand/collapse engine.
//!
//! Every operation mutates the live tree owned by a registry record and then
//! regenerates that record: the old record is removed and the tree factory
//! registers a new one from the same tree and stored factory options, all
//! within one synchronous call.
//!
//! [`ExpandState`] carries collapse flags across a full tree replacement, so a
//! reloaded dataset keeps the user's navigation depth wherever node ids still
//! match.

use std::collections::HashMap;

use log::{debug, trace};

use taxoflow_core::tree::TreeNode;

use crate::{
    factory::create_tree_diagram_resolved,
    registry::{DiagramRecord, DiagramRegistry},
};

/// Flips the `collapsed` flag of the node with `node_id`.
///
/// Returns `false` if no node in the tree has that id.
pub fn toggle_flag(root: &mut TreeNode, node_id: &str) -> bool {
    match root.find_mut(node_id) {
        Some(node) => {
            node.collapsed = !node.collapsed;
            true
        }
        None => false,
    }
}

/// Collapses every node whose depth, counted from `root` and offset by
/// `start_depth`, is at least 1. The root itself is exempt when
/// `start_depth` is 0.
pub fn collapse_to_depth(root: &mut TreeNode, start_depth: usize) {
    root.for_each_mut_with_depth(&mut |node, depth| {
        if start_depth + depth >= 1 {
            node.collapsed = true;
        }
    });
}

/// Sets `collapsed` on every node of the tree.
pub fn set_collapse_state(root: &mut TreeNode, collapsed: bool) {
    root.for_each_mut_with_depth(&mut |node, _| node.collapsed = collapsed);
}

/// Collapse flags of a tree, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    collapsed: HashMap<String, bool>,
}

impl ExpandState {
    /// Records the flag of every node with an id, including nodes hidden
    /// below a collapsed ancestor.
    pub fn capture(root: &TreeNode) -> Self {
        let collapsed = root
            .iter()
            .filter_map(|node| Some((node.id()?.to_string(), node.collapsed)))
            .collect();
        Self { collapsed }
    }

    /// Writes the recorded flags onto matching nodes of `root`. Nodes whose
    /// id was not recorded keep their current flag.
    pub fn restore(&self, root: &mut TreeNode) {
        root.for_each_mut_with_depth(&mut |node, _| {
            if let Some(&collapsed) = node.id().and_then(|id| self.collapsed.get(id)) {
                node.collapsed = collapsed;
            }
        });
    }

    pub fn get(&self, node_id: &str) -> Option<bool> {
        self.collapsed.get(node_id).copied()
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }
}

/// Rebuilds the node and edge lists of a tree diagram from its live tree.
///
/// Returns `false`, leaving the registry untouched, if `diagram_id` is not a
/// registered tree diagram.
pub fn regenerate(registry: &mut DiagramRegistry, diagram_id: &str) -> bool {
    if registry.get_tree_entry(diagram_id).is_none() {
        trace!(diagram_id = diagram_id; "No tree diagram to regenerate");
        return false;
    }
    let Some((tree, options)) = registry
        .remove(diagram_id)
        .and_then(DiagramRecord::into_tree_parts)
    else {
        return false;
    };

    create_tree_diagram_resolved(registry, diagram_id, tree, options)
}

/// Toggles one node and regenerates the diagram.
///
/// Unknown diagrams and unknown nodes are silent no-ops returning `false`.
pub fn toggle_node(registry: &mut DiagramRegistry, diagram_id: &str, node_id: &str) -> bool {
    let Some(tree) = registry.tree_mut(diagram_id) else {
        return false;
    };
    if !toggle_flag(tree, node_id) {
        trace!(diagram_id = diagram_id, node_id = node_id; "Toggle target not found");
        return false;
    }

    debug!(diagram_id = diagram_id, node_id = node_id; "Toggled node");
    regenerate(registry, diagram_id)
}

/// Collapses everything below the root, or expands the whole tree.
pub fn toggle_all(registry: &mut DiagramRegistry, diagram_id: &str, collapsed: bool) -> bool {
    let Some(tree) = registry.tree_mut(diagram_id) else {
        return false;
    };
    if collapsed {
        collapse_to_depth(tree, 0);
    } else {
        set_collapse_state(tree, false);
    }

    debug!(diagram_id = diagram_id, collapsed = collapsed; "Toggled all nodes");
    regenerate(registry, diagram_id)
}

/// Prepares a freshly built tree before it is registered.
///
/// The new tree is collapsed below its root. If `diagram_id` already has a
/// tree diagram, that diagram's collapse flags are captured and replayed onto
/// the new tree, and the old record is removed so the new one can be
/// registered. Returns whether a previous state was restored.
pub fn initialize_tree(registry: &mut DiagramRegistry, diagram_id: &str, root: &mut TreeNode) -> bool {
    let previous = registry
        .get_tree_entry(diagram_id)
        .map(|entry| ExpandState::capture(entry.tree));

    collapse_to_depth(root, 0);

    match previous {
        Some(state) => {
            registry.remove(diagram_id);
            state.restore(root);
            debug!(diagram_id = diagram_id, nodes = state.len(); "Restored expand state");
            true
        }
        None => false,
    }
}
