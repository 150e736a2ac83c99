//! Service-tree crawler.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use auth::Params;
use cmdb_rest::CmdbApi;
use common::CrawlSettings;
use metrics::SharedMetrics;
use model::{
    build_ci_type_query, find_type_name, join_ids, CiType, ServiceTreeData, ServiceTreeNode,
    ServiceTreeView,
};

use crate::error::CrawlError;

/// Configuration for the crawler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlerConfig {
    /// Deepest level to fetch, `None` for no limit.
    pub max_depth: Option<usize>,
    /// `count` sent with every search.
    pub page_size: u32,
    /// Root subtrees crawled at the same time.
    pub max_workers: usize,
    /// Fetch descendant statistics for root nodes.
    pub include_stats: bool,
    /// Pause before every child query.
    pub request_interval: Duration,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            page_size: 1000,
            max_workers: 10,
            include_stats: true,
            request_interval: Duration::from_millis(100),
        }
    }
}

impl From<&CrawlSettings> for CrawlerConfig {
    fn from(settings: &CrawlSettings) -> Self {
        Self {
            max_depth: settings.max_depth,
            page_size: settings.page_size,
            max_workers: settings.max_workers,
            include_stats: settings.include_stats,
            request_interval: settings.request_interval,
        }
    }
}

/// What every node of one view needs while its subtrees are fetched.
struct ViewContext {
    view: ServiceTreeView,
    id2type: BTreeMap<String, CiType>,
}

impl ViewContext {
    fn type_name(&self, type_id: i64) -> String {
        find_type_name(&self.id2type, type_id)
            .unwrap_or_default()
            .to_string()
    }
}

type CrawlFuture<'a> = Pin<Box<dyn Future<Output = Result<(), CrawlError>> + Send + 'a>>;

/// Walks service-tree views into node trees.
///
/// Root nodes come from the first level of the view; every root subtree is
/// fetched in its own task, at most `max_workers` at a time.
pub struct ServiceTreeCrawler<A> {
    client: Arc<A>,
    config: CrawlerConfig,
    metrics: Option<SharedMetrics>,
}

impl<A> Clone for ServiceTreeCrawler<A> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<A: CmdbApi + 'static> ServiceTreeCrawler<A> {
    /// Create a crawler with the given configuration.
    pub fn new(client: Arc<A>, config: CrawlerConfig) -> Self {
        Self {
            client,
            config,
            metrics: None,
        }
    }

    /// Count crawled trees and nodes into `metrics`.
    pub fn with_metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get the crawler configuration.
    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Crawl every view the CMDB defines.
    ///
    /// A view that fails is logged and left out of the result.
    pub async fn crawl_all(&self) -> Result<Vec<ServiceTreeData>, CrawlError> {
        self.crawl_views(None).await
    }

    /// Crawl the named views; an empty list crawls every view.
    ///
    /// Names the CMDB does not know are logged as warnings.
    pub async fn crawl_specific_views(
        &self,
        targets: &[String],
    ) -> Result<Vec<ServiceTreeData>, CrawlError> {
        if targets.is_empty() {
            return self.crawl_all().await;
        }

        info!(targets = ?targets, "Crawling specific service trees");

        let wanted: HashSet<&str> = targets.iter().map(String::as_str).collect();
        let trees = self.crawl_views(Some(&wanted)).await?;

        for target in targets {
            if !trees.iter().any(|t| &t.view_name == target) {
                warn!(view = %target, "Target service tree view not found");
            }
        }

        info!(
            requested = targets.len(),
            found = trees.len(),
            "Completed crawling specific service trees"
        );
        Ok(trees)
    }

    async fn crawl_views(
        &self,
        wanted: Option<&HashSet<&str>>,
    ) -> Result<Vec<ServiceTreeData>, CrawlError> {
        let response = self.client.get_relation_views().await?;

        if response.views.is_empty() {
            warn!("No service tree views found");
            return Ok(Vec::new());
        }

        let mut trees = Vec::new();
        for (view_name, view) in &response.views {
            if wanted.is_some_and(|w| !w.contains(view_name.as_str())) {
                continue;
            }

            let view_id = response.view_id(view_name);
            info!(view = %view_name, view_id = ?view_id, "Crawling service tree");

            match self
                .crawl_service_tree(view_name, view_id, view, &response.id2type)
                .await
            {
                Ok(tree) => trees.push(tree),
                Err(e) => {
                    error!(view = %view_name, error = %e, "Failed to crawl service tree");
                }
            }
        }

        info!(total_trees = trees.len(), "Completed crawling service trees");
        Ok(trees)
    }

    /// Crawl one view.
    ///
    /// `id2type` maps stringified type ids to their definitions and supplies
    /// the node type names.
    pub async fn crawl_service_tree(
        &self,
        view_name: &str,
        view_id: Option<i64>,
        view: &ServiceTreeView,
        id2type: &BTreeMap<String, CiType>,
    ) -> Result<ServiceTreeData, CrawlError> {
        info!(view = %view_name, levels = view.topo.len(), "Starting to crawl service tree");

        let Some(root_types) = view.topo.first() else {
            return Err(CrawlError::NoLevels(view_name.to_string()));
        };

        let mut tree = ServiceTreeData::new(view_name, view_id, view.clone());

        debug!(root_types = ?root_types, "Loading root nodes");
        let query = build_ci_type_query(root_types);
        let response = self
            .client
            .search_ci(&query, self.config.page_size, false)
            .await?;

        if response.result.is_empty() {
            warn!(view = %view_name, "No root nodes found for service tree");
            if let Some(m) = &self.metrics {
                m.inc_trees_crawled();
            }
            return Ok(tree);
        }

        let ctx = Arc::new(ViewContext {
            view: view.clone(),
            id2type: id2type.clone(),
        });

        let mut roots: Vec<ServiceTreeNode> = response
            .result
            .iter()
            .map(|ci| ServiceTreeNode::from_ci(ci, ctx.type_name(ci.ci_type), 0))
            .collect();

        if self.config.include_stats && !view.leaf.is_empty() {
            if let Err(e) = self.load_root_node_statistics(&mut roots, view).await {
                warn!(view = %view_name, error = %e, "Failed to load root node statistics");
            }
        }

        tree.root_nodes = self.crawl_roots(roots, ctx).await;
        tree.count_nodes();
        tree.calculate_max_depth();

        if let Some(m) = &self.metrics {
            m.inc_trees_crawled();
            m.add_nodes_crawled(tree.total_nodes as u64);
        }

        info!(
            view = %view_name,
            total_nodes = tree.total_nodes,
            max_depth = tree.max_depth,
            "Crawled service tree"
        );
        Ok(tree)
    }

    /// Fetch every root subtree, keeping the roots in their original order.
    async fn crawl_roots(
        &self,
        roots: Vec<ServiceTreeNode>,
        ctx: Arc<ViewContext>,
    ) -> Vec<ServiceTreeNode> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut tasks = JoinSet::new();
        let root_count = roots.len();

        for (index, mut root) in roots.into_iter().enumerate() {
            let crawler = self.clone();
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = crawler.crawl_node_children(&mut root, &ctx, 1).await;
                if let Err(e) = result {
                    error!(node = %root.name, error = %e, "Failed to crawl children");
                }
                (index, root)
            });
        }

        let mut crawled = Vec::with_capacity(root_count);
        let mut failures = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => crawled.push(entry),
                Err(e) => {
                    failures += 1;
                    let err = CrawlError::TaskFailed(e.to_string());
                    error!(error = %err, "Root subtree lost");
                }
            }
        }

        if failures > 0 {
            warn!(failures = failures, "Some root subtrees failed to crawl");
        }

        crawled.sort_by_key(|(index, _)| *index);
        crawled.into_iter().map(|(_, root)| root).collect()
    }

    /// Fetch the children of `node` at `level`, then theirs.
    ///
    /// A node is marked leaf when the view has no level below it or the
    /// CMDB returns no children. Hitting `max_depth` leaves it unmarked.
    fn crawl_node_children<'a>(
        &'a self,
        node: &'a mut ServiceTreeNode,
        ctx: &'a ViewContext,
        level: usize,
    ) -> CrawlFuture<'a> {
        Box::pin(async move {
            if self.config.max_depth.is_some_and(|max| level >= max) {
                return Ok(());
            }

            let child_types = match ctx.view.topo.get(level) {
                Some(types) if !types.is_empty() => types,
                _ => {
                    node.is_leaf = true;
                    return Ok(());
                }
            };

            if !self.config.request_interval.is_zero() {
                tokio::time::sleep(self.config.request_interval).await;
            }

            let params = child_query_params(
                node.id,
                child_types,
                &ctx.view.topo_flatten,
                level,
                self.config.page_size,
            );
            let response = self.client.search_ci_relation(&params).await?;

            if response.result.is_empty() {
                node.is_leaf = true;
                return Ok(());
            }

            let parent_id = node.id;
            for ci in &response.result {
                let child = node.add_child(ServiceTreeNode::from_ci(
                    ci,
                    ctx.type_name(ci.ci_type),
                    level,
                ));

                if let Err(e) = self.crawl_node_children(child, ctx, level + 1).await {
                    error!(
                        parent_id = parent_id,
                        child_id = ci.id,
                        error = %e,
                        "Failed to crawl grandchildren"
                    );
                }
            }

            Ok(())
        })
    }

    /// Store `total_descendants` for every root from one statistics query.
    async fn load_root_node_statistics(
        &self,
        roots: &mut [ServiceTreeNode],
        view: &ServiceTreeView,
    ) -> Result<(), CrawlError> {
        if roots.is_empty() || view.leaf.is_empty() {
            return Ok(());
        }

        let root_ids: Vec<i64> = roots.iter().map(|r| r.id).collect();
        let params = statistics_params(&root_ids, view);
        let stats = self.client.get_ci_relation_statistics(&params).await?;

        for root in roots.iter_mut() {
            root.statistics.insert(
                "total_descendants".to_string(),
                stats.count(&root.id.to_string()),
            );
        }

        Ok(())
    }
}

impl<A> std::fmt::Debug for ServiceTreeCrawler<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceTreeCrawler")
            .field("config", &self.config)
            .finish()
    }
}

/// Parameters for `ci_relations/s` fetching the children of `root_id`.
///
/// `descendant_ids` lists the flattened types below `level`, when any.
fn child_query_params(
    root_id: i64,
    child_types: &[i64],
    topo_flatten: &[i64],
    level: usize,
    page_size: u32,
) -> Params {
    let mut params = Params::new();
    params.insert("q".into(), Value::from(build_ci_type_query(child_types)));
    params.insert("root_id".into(), Value::from(root_id));
    params.insert("level".into(), Value::from(1));
    params.insert("count".into(), Value::from(page_size));

    if let Some(below) = topo_flatten.get(level + 1..).filter(|ids| !ids.is_empty()) {
        params.insert("descendant_ids".into(), Value::from(join_ids(below, ",")));
    }

    params
}

/// Parameters for `ci_relations/statistics` over the leaf types of a view.
fn statistics_params(root_ids: &[i64], view: &ServiceTreeView) -> Params {
    let mut params = Params::new();
    params.insert("root_ids".into(), Value::from(join_ids(root_ids, ",")));
    params.insert("level".into(), Value::from(view.topo_flatten.len()));
    params.insert("type_ids".into(), Value::from(view.leaf.clone()));
    params.insert("has_m2m".into(), Value::from(0));
    params
}
