//! CMDB data model.
//!
//! Response types for the CMDB endpoints, the service-tree structures built
//! by the crawler, and helpers for the CMDB query syntax.

mod ci;
mod error;
mod query;
mod tree;
mod view;

pub use ci::{CiInstance, CiRelationSearchResponse, CiSearchResponse, CiType, StatisticsResponse};
pub use error::ModelError;
pub use query::{build_ci_type_query, build_tree_key, join_ids, parse_tree_key, TreeKeySegment};
pub use tree::{ServiceTreeData, ServiceTreeNode};
pub use view::{
    find_type_name, find_view_id_by_name, RelationViewResponse, ServiceTreeOption, ServiceTreeView,
};
