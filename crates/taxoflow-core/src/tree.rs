//! The collapsible tree consumed by the tree factory and the expand engine.
//!
//! Collapsing a [`TreeNode`] only flips its `collapsed` flag. Its children stay
//! in memory so that re-expanding is lossless.

use serde::{Deserialize, Serialize};

use crate::{
    localization::{Description, Label},
    table::TableData,
};

/// Payload carried by tree nodes and rendered nodes.
///
/// `has_children`, `is_expanded` and `show_table_icon` are recomputed by the
/// tree factory every time a node is emitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub label: Label,
    /// Icon identifier understood by the presentation layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<TableData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_count: Option<usize>,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub is_expanded: bool,
    #[serde(default)]
    pub show_table_icon: bool,
}

impl NodeData {
    pub fn new(label: Label) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: Description) -> Self {
        self.description = Some(description);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_table(mut self, table: Vec<TableData>) -> Self {
        self.table = Some(table);
        self
    }

    /// True when the first attached table has at least one property row.
    pub fn has_table_data(&self) -> bool {
        self.table
            .as_ref()
            .and_then(|tables| tables.first())
            .is_some_and(|table| !table.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(id: impl Into<String>, data: NodeData) -> Self {
        Self {
            id: Some(id.into()),
            data,
            ..Self::default()
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Depth-first search, descending through collapsed nodes.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.iter().find(|node| node.id() == Some(id))
    }

    /// Mutable depth-first search, descending through collapsed nodes.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut TreeNode> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Pre-order iterator over every node, including those hidden below a
    /// collapsed ancestor.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of nodes in the whole tree.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// A tree always has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Visits every node mutably together with its depth below `self`.
    pub fn for_each_mut_with_depth(&mut self, f: &mut impl FnMut(&mut TreeNode, usize)) {
        fn walk(node: &mut TreeNode, depth: usize, f: &mut impl FnMut(&mut TreeNode, usize)) {
            f(node, depth);
            for child in &mut node.children {
                walk(child, depth + 1, f);
            }
        }
        walk(self, 0, f);
    }
}

/// Pre-order iterator returned by [`TreeNode::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        localization::LocalizedName,
        table::{TableData, TablePayload},
    };

    fn leaf(id: &str) -> TreeNode {
        TreeNode::new(id, NodeData::new(Label::from(id)))
    }

    fn sample() -> TreeNode {
        leaf("root").with_children(vec![
            leaf("a")
                .with_collapsed(true)
                .with_children(vec![leaf("a1"), leaf("a2")]),
            leaf("b"),
        ])
    }

    #[test]
    fn test_iter_is_preorder_through_collapsed_nodes() {
        let ids: Vec<_> = sample().iter().filter_map(TreeNode::id).map(str::to_string).collect();
        assert_eq!(ids, ["root", "a", "a1", "a2", "b"]);
    }

    #[test]
    fn test_find_mut_reaches_hidden_nodes() {
        let mut tree = sample();
        let node = tree.find_mut("a2").unwrap();
        node.collapsed = true;
        assert!(tree.find("a2").unwrap().collapsed);
        assert!(tree.find_mut("missing").is_none());
    }

    #[test]
    fn test_for_each_mut_with_depth() {
        let mut tree = sample();
        let mut depths = Vec::new();
        tree.for_each_mut_with_depth(&mut |node, depth| {
            depths.push((node.id().unwrap_or_default().to_string(), depth));
        });
        assert_eq!(depths[0], ("root".to_string(), 0));
        assert_eq!(depths[2], ("a1".to_string(), 2));
        assert_eq!(depths[4], ("b".to_string(), 1));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_has_table_data_checks_first_table() {
        let payload = |rows| TablePayload {
            category: LocalizedName::new("K", "C"),
            group: LocalizedName::new("G", "G"),
            leaf: None,
            properties: rows,
        };
        let empty = NodeData::default().with_table(vec![TableData::new("task", 1, payload(vec![]))]);
        assert!(!empty.has_table_data());
        assert!(!NodeData::default().has_table_data());
    }

    #[test]
    fn test_tree_node_json_shape() {
        let json = serde_json::to_value(leaf("x").with_class_name("xducts-cat")).unwrap();
        assert_eq!(json["id"], "x");
        assert_eq!(json["className"], "xducts-cat");
        assert_eq!(json["collapsed"], false);
        assert!(json.get("children").is_none());
        assert_eq!(json["data"]["hasChildren"], false);
    }
}
