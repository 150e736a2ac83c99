//! Service-tree view definitions from `preference/relation/view`.

use crate::ci::CiType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response from `preference/relation/view`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationViewResponse {
    /// View configurations keyed by view name.
    pub views: BTreeMap<String, ServiceTreeView>,
    /// CI types keyed by stringified type id.
    pub id2type: BTreeMap<String, CiType>,
    /// `[name, id]` pairs.
    pub name2id: Vec<Vec<Value>>,
}

impl RelationViewResponse {
    /// Numeric id of the named view.
    pub fn view_id(&self, view_name: &str) -> Option<i64> {
        find_view_id_by_name(view_name, &self.name2id)
    }
}

/// Display name (alias, else name) for a CI type id in an `id2type` map.
pub fn find_type_name(id2type: &BTreeMap<String, CiType>, type_id: i64) -> Option<&str> {
    id2type.get(&type_id.to_string()).map(CiType::display_name)
}

/// Look up a view id in `name2id` pairs.
///
/// Pairs shorter than two elements or with a non-string name or non-integer
/// id are skipped.
pub fn find_view_id_by_name(view_name: &str, name2id: &[Vec<Value>]) -> Option<i64> {
    name2id.iter().find_map(|pair| match pair.as_slice() {
        [Value::String(name), id, ..] if name == view_name => id
            .as_i64()
            .or_else(|| id.as_f64().map(|f| f as i64)),
        _ => None,
    })
}

/// Configuration of one service-tree view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTreeView {
    /// CI type ids per level; level 0 are the roots.
    pub topo: Vec<Vec<i64>>,
    /// All type ids in level order.
    pub topo_flatten: Vec<i64>,
    /// Leaf type ids.
    pub leaf: Vec<i64>,
    pub leaf2show_types: BTreeMap<String, Vec<i64>>,
    pub node2show_types: BTreeMap<String, Vec<CiType>>,
    pub level2constraint: BTreeMap<String, Value>,
    pub option: ServiceTreeOption,
    pub is_public: bool,
    pub show_types: Vec<CiType>,
}

/// Display options of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceTreeOption {
    pub is_show_leaf_node: bool,
    pub is_show_tree_node: bool,
    pub sort: i64,
    pub is_public: bool,
}
