//! The CMDB operations the crawler depends on.

use crate::error::CmdbRestError;
use async_trait::async_trait;
use auth::Params;
use model::{CiRelationSearchResponse, CiSearchResponse, RelationViewResponse, StatisticsResponse};

/// Read access to a CMDB.
///
/// Implemented by [`CmdbRestClient`](crate::CmdbRestClient); tests provide
/// in-memory implementations.
#[async_trait]
pub trait CmdbApi: Send + Sync {
    /// GET `preference/relation/view`.
    async fn get_relation_views(&self) -> Result<RelationViewResponse, CmdbRestError>;

    /// GET `ci/s`.
    async fn search_ci(
        &self,
        query: &str,
        count: u32,
        use_id_filter: bool,
    ) -> Result<CiSearchResponse, CmdbRestError>;

    /// GET `ci_relations/s`.
    async fn search_ci_relation(
        &self,
        params: &Params,
    ) -> Result<CiRelationSearchResponse, CmdbRestError>;

    /// GET `ci_relations/statistics`.
    async fn get_ci_relation_statistics(
        &self,
        params: &Params,
    ) -> Result<StatisticsResponse, CmdbRestError>;
}
