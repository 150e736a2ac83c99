//! CMDB REST API client.

use crate::api::CmdbApi;
use crate::error::{classify, CmdbRestError};
use async_trait::async_trait;
use auth::{to_query_pairs, ApiCredentials, Params, RequestSigner};
use common::CmdbEnvironment;
use metrics::SharedMetrics;
use model::{CiRelationSearchResponse, CiSearchResponse, RelationViewResponse, StatisticsResponse};
use rest_client::{RestClient, RestResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// CMDB REST API client with request signing.
pub struct CmdbRestClient {
    client: RestClient,
    signer: RequestSigner,
    environment: CmdbEnvironment,
    metrics: Option<SharedMetrics>,
}

impl CmdbRestClient {
    /// Create a new client for the given CMDB instance.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        credentials: ApiCredentials,
        environment: CmdbEnvironment,
    ) -> Result<Self, CmdbRestError> {
        Self::with_signer(RequestSigner::new(credentials), environment)
    }

    /// Create a client around an already configured signer.
    pub fn with_signer(
        signer: RequestSigner,
        environment: CmdbEnvironment,
    ) -> Result<Self, CmdbRestError> {
        let client = RestClient::new(environment.base_url(), environment.timeout())?;

        tracing::info!(
            api_key = %signer.api_key(),
            environment = %environment,
            "CMDB client configured"
        );

        Ok(Self {
            client,
            signer,
            environment,
            metrics: None,
        })
    }

    /// Count requests into `metrics`.
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get the environment this client is connected to.
    pub fn environment(&self) -> &CmdbEnvironment {
        &self.environment
    }

    /// Get the API key (for logging/debugging).
    pub fn api_key(&self) -> &str {
        self.signer.api_key()
    }

    // ========================================================================
    // Signing
    // ========================================================================

    /// Signed query pairs for a GET to `path` (relative to the server root).
    ///
    /// The signature covers the path as the server sees it, including any
    /// prefix in the base URL.
    pub fn signed_query(
        &self,
        path: &str,
        params: &Params,
    ) -> Result<Vec<(String, String)>, CmdbRestError> {
        let url_path = self.client.url_path(path)?;
        let signed = self.signer.sign(&url_path, params);
        Ok(to_query_pairs(&signed))
    }

    /// Signed GET returning status, resolved URL and JSON body.
    ///
    /// `path` is relative to the server root (e.g. `/api/v0.1/ci_types`).
    /// Non-2xx statuses are returned, not raised.
    pub async fn signed_get(
        &self,
        path: &str,
        params: &Params,
    ) -> Result<RestResponse<Value>, CmdbRestError> {
        let query = self.signed_query(path, params)?;
        self.record_sent();

        match self.client.get_response(path, &query).await {
            Ok(response) => {
                if response.is_success() {
                    self.record_success();
                } else {
                    self.record_failure();
                }
                Ok(response)
            }
            Err(e) => {
                self.record_failure();
                Err(e.into())
            }
        }
    }

    /// Signed GET to an endpoint below the API prefix, typed response.
    async fn get_endpoint<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &Params,
    ) -> Result<T, CmdbRestError> {
        let path = self.environment.endpoint_path(endpoint);
        let query = self.signed_query(&path, params)?;
        self.record_sent();

        match self.client.get(&path, &query).await {
            Ok(body) => {
                self.record_success();
                Ok(body)
            }
            Err(e) => {
                self.record_failure();
                tracing::error!(endpoint = %endpoint, error = %e, "CMDB request failed");
                Err(classify(e))
            }
        }
    }

    fn record_sent(&self) {
        if let Some(m) = &self.metrics {
            m.inc_requests_sent();
        }
    }

    fn record_success(&self) {
        if let Some(m) = &self.metrics {
            m.inc_requests_succeeded();
        }
    }

    fn record_failure(&self) {
        if let Some(m) = &self.metrics {
            m.inc_requests_failed();
        }
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Get CI type definitions.
    ///
    /// GET ci_types
    ///
    /// Returned as raw JSON; the shape differs between CMDB releases.
    pub async fn get_ci_types(&self) -> Result<Value, CmdbRestError> {
        self.get_endpoint("ci_types", &Params::new()).await
    }
}

#[async_trait]
impl CmdbApi for CmdbRestClient {
    /// GET preference/relation/view
    async fn get_relation_views(&self) -> Result<RelationViewResponse, CmdbRestError> {
        tracing::info!("Fetching relation views");

        let response: RelationViewResponse = self
            .get_endpoint("preference/relation/view", &Params::new())
            .await?;

        tracing::info!(view_count = response.views.len(), "Fetched relation views");
        Ok(response)
    }

    /// GET ci/s
    ///
    /// # Parameters
    /// - `query`: CMDB filter, e.g. `_type:(39)`
    /// - `count`: page size
    /// - `use_id_filter`: sends `use_id_filter=1`
    async fn search_ci(
        &self,
        query: &str,
        count: u32,
        use_id_filter: bool,
    ) -> Result<CiSearchResponse, CmdbRestError> {
        tracing::debug!(query = %query, count = count, "Searching CI instances");

        let mut params = Params::new();
        params.insert("q".into(), Value::from(query));
        params.insert("count".into(), Value::from(count));
        if use_id_filter {
            params.insert("use_id_filter".into(), Value::from(1));
        }

        let response: CiSearchResponse = self.get_endpoint("ci/s", &params).await?;

        tracing::debug!(
            found = response.numfound,
            returned = response.result.len(),
            "CI search complete"
        );
        Ok(response)
    }

    /// GET ci_relations/s
    ///
    /// Array values are sent comma-joined, e.g. `descendant_ids=41,42`.
    async fn search_ci_relation(
        &self,
        params: &Params,
    ) -> Result<CiRelationSearchResponse, CmdbRestError> {
        tracing::debug!(params = ?params, "Searching CI relations");

        let response: CiRelationSearchResponse = self
            .get_endpoint("ci_relations/s", &normalize_params(params))
            .await?;

        tracing::debug!(
            found = response.numfound,
            returned = response.result.len(),
            "CI relation search complete"
        );
        Ok(response)
    }

    /// GET ci_relations/statistics
    async fn get_ci_relation_statistics(
        &self,
        params: &Params,
    ) -> Result<StatisticsResponse, CmdbRestError> {
        tracing::debug!(params = ?params, "Fetching CI relation statistics");

        let response: StatisticsResponse = self
            .get_endpoint("ci_relations/statistics", &normalize_params(params))
            .await?;

        tracing::debug!(roots = response.data.len(), "Statistics received");
        Ok(response)
    }
}

/// Join array values into comma-separated strings.
///
/// The CMDB expects id lists as `1,2,3`. Joining before signing also makes
/// those values part of the signature.
pub fn normalize_params(params: &Params) -> Params {
    params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Array(items) => Value::String(
                    items
                        .iter()
                        .map(|item| auth::scalar_text(item).unwrap_or_else(|| item.to_string()))
                        .collect::<Vec<_>>()
                        .join(","),
                ),
                other => other.clone(),
            };
            (key.clone(), value)
        })
        .collect()
}

impl std::fmt::Debug for CmdbRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmdbRestClient")
            .field("environment", &self.environment)
            .field("api_key", &self.signer.api_key())
            .finish()
    }
}
