//! CMDB query syntax helpers.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

const TREE_KEY_SEPARATOR: &str = "@^@";
const SEGMENT_SEPARATOR: char = '%';

/// Build a `q` filter matching any of the given CI types.
///
/// `[73, 74]` becomes `_type:(73;74)`; an empty list gives an empty string.
pub fn build_ci_type_query(type_ids: &[i64]) -> String {
    if type_ids.is_empty() {
        return String::new();
    }
    format!("_type:({})", join_ids(type_ids, ";"))
}

/// Join ids with a separator, e.g. `1,2,3`.
pub fn join_ids(ids: &[i64], separator: &str) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// One `ci_id%type_id%meta` step of a service-tree node key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeKeySegment {
    pub ci_id: i64,
    pub type_id: i64,
    pub meta: String,
}

/// Parse a node key such as `12%39%x@^@40%41%y`.
///
/// An empty key yields no segments.
pub fn parse_tree_key(key: &str) -> Result<Vec<TreeKeySegment>, ModelError> {
    if key.is_empty() {
        return Ok(Vec::new());
    }

    key.split(TREE_KEY_SEPARATOR)
        .map(|segment| {
            let parts: Vec<&str> = segment.split(SEGMENT_SEPARATOR).collect();
            let [ci_id, type_id, meta] = parts.as_slice() else {
                return Err(ModelError::InvalidTreeKeySegment(segment.to_string()));
            };

            Ok(TreeKeySegment {
                ci_id: ci_id
                    .parse()
                    .map_err(|_| ModelError::InvalidCiId(ci_id.to_string()))?,
                type_id: type_id
                    .parse()
                    .map_err(|_| ModelError::InvalidTypeId(type_id.to_string()))?,
                meta: meta.to_string(),
            })
        })
        .collect()
}

/// Inverse of [`parse_tree_key`].
pub fn build_tree_key(segments: &[TreeKeySegment]) -> String {
    segments
        .iter()
        .map(|s| format!("{}%{}%{}", s.ci_id, s.type_id, s.meta))
        .collect::<Vec<_>>()
        .join(TREE_KEY_SEPARATOR)
}
