//! Service trees assembled from a view and its CI instances.

use crate::ci::CiInstance;
use crate::view::ServiceTreeView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A node of a crawled service tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceTreeNode {
    pub id: i64,
    #[serde(rename = "type")]
    pub ci_type: i64,
    pub type_name: String,
    pub name: String,
    /// Names of the ancestors joined with ` > `.
    pub path: String,
    pub level: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ServiceTreeNode>,
    pub child_count: usize,
    pub is_leaf: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub statistics: BTreeMap<String, u64>,
}

impl ServiceTreeNode {
    /// Build a childless node from a CI instance.
    pub fn from_ci(ci: &CiInstance, type_name: impl Into<String>, level: usize) -> Self {
        Self {
            id: ci.id,
            ci_type: ci.ci_type,
            type_name: type_name.into(),
            name: ci.display_name(),
            level,
            attributes: ci.attrs.clone(),
            ..Default::default()
        }
    }

    /// Path a child of this node gets: `path > name`, or just `name` at the top.
    pub fn tree_path(&self) -> String {
        if self.path.is_empty() {
            self.name.clone()
        } else {
            format!("{} > {}", self.path, self.name)
        }
    }

    /// Attach a child, setting its path and level from this node.
    pub fn add_child(&mut self, mut child: ServiceTreeNode) -> &mut ServiceTreeNode {
        child.path = self.tree_path();
        child.level = self.level + 1;
        self.children.push(child);
        self.child_count = self.children.len();
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// All nodes below this one, depth first.
    pub fn descendants(&self) -> Vec<&ServiceTreeNode> {
        let mut out = Vec::new();
        for child in &self.children {
            out.push(child);
            out.extend(child.descendants());
        }
        out
    }

    /// Number of levels in the subtree rooted here, counting this node.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }
}

/// A fully crawled service-tree view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceTreeData {
    pub view_name: String,
    pub view_id: Option<i64>,
    pub config: ServiceTreeView,
    pub root_nodes: Vec<ServiceTreeNode>,
    pub total_nodes: usize,
    pub max_depth: usize,
    pub crawled_at: DateTime<Utc>,
}

impl ServiceTreeData {
    /// Empty tree stamped with the current time.
    pub fn new(view_name: impl Into<String>, view_id: Option<i64>, config: ServiceTreeView) -> Self {
        Self {
            view_name: view_name.into(),
            view_id,
            config,
            root_nodes: Vec::new(),
            total_nodes: 0,
            max_depth: 0,
            crawled_at: Utc::now(),
        }
    }

    /// Recount all nodes and store the result in `total_nodes`.
    pub fn count_nodes(&mut self) -> usize {
        self.total_nodes = self
            .root_nodes
            .iter()
            .map(|root| 1 + root.descendants().len())
            .sum();
        self.total_nodes
    }

    /// Recompute the deepest level and store it in `max_depth`.
    pub fn calculate_max_depth(&mut self) -> usize {
        self.max_depth = self
            .root_nodes
            .iter()
            .map(ServiceTreeNode::depth)
            .max()
            .unwrap_or(0);
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, name: &str) -> ServiceTreeNode {
        ServiceTreeNode {
            id,
            ci_type: 1,
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_child_sets_path_and_level() {
        let mut root = node(1, "payments");
        let child = root.add_child(node(2, "checkout"));
        let grandchild = child.add_child(node(3, "web-01"));

        assert_eq!(grandchild.path, "payments > checkout");
        assert_eq!(grandchild.level, 2);
        assert_eq!(root.children[0].path, "payments");
        assert_eq!(root.children[0].level, 1);
        assert_eq!(root.child_count, 1);
    }

    #[test]
    fn test_descendants_and_depth() {
        let mut root = node(1, "a");
        root.add_child(node(2, "b")).add_child(node(3, "c"));
        root.add_child(node(4, "d"));

        let ids: Vec<i64> = root.descendants().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(root.depth(), 3);
        assert_eq!(node(9, "leaf").depth(), 1);
    }

    #[test]
    fn test_tree_totals() {
        let mut first = node(1, "a");
        first.add_child(node(2, "b")).add_child(node(3, "c"));
        let second = node(4, "d");

        let mut tree = ServiceTreeData::new("Business", Some(3), ServiceTreeView::default());
        tree.root_nodes = vec![first, second];

        assert_eq!(tree.count_nodes(), 4);
        assert_eq!(tree.total_nodes, 4);
        assert_eq!(tree.calculate_max_depth(), 3);
        assert_eq!(tree.max_depth, 3);
    }

    #[test]
    fn test_empty_tree_totals() {
        let mut tree = ServiceTreeData::new("Empty", None, ServiceTreeView::default());
        assert_eq!(tree.count_nodes(), 0);
        assert_eq!(tree.calculate_max_depth(), 0);
    }

    #[test]
    fn test_from_ci() {
        let ci: CiInstance = serde_json::from_value(serde_json::json!({
            "_id": 5, "_type": 39, "name": "payments", "owner": "ops"
        }))
        .unwrap();

        let node = ServiceTreeNode::from_ci(&ci, "Product", 0);
        assert_eq!(node.id, 5);
        assert_eq!(node.ci_type, 39);
        assert_eq!(node.type_name, "Product");
        assert_eq!(node.name, "payments");
        assert_eq!(node.attributes["owner"], "ops");
        assert!(!node.is_leaf);
    }

    #[test]
    fn test_node_serializes_type_field() {
        let json = serde_json::to_value(node(1, "a")).unwrap();
        assert_eq!(json["type"], 1);
        assert!(json.get("children").is_none());
    }
}
