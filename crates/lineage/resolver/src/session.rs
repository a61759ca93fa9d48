//! Per-call resolution state
//!
//! A session lives for one resolve call. It maps each history prefix
//! (`""` for the root execution) to a cell that is filled by the first task
//! to need it; concurrent tasks needing the same prefix wait on that cell
//! instead of fetching again. The cell holds the outcome, so a failed fetch
//! is shared with every owner group below that prefix and never repeated.

use dashmap::DashMap;
use lineage_history::{EventLog, HistoryError, HistoryFetcher};
use lineage_types::{ExecutionRef, NodeAddress};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::ResolveError;
use crate::plan::FetchPlan;

type FetchOutcome = Result<Arc<EventLog>, ResolveError>;
type LogCell = Arc<OnceCell<FetchOutcome>>;

/// Fetch cache and in-flight map for one resolve call
pub struct ResolutionSession {
    fetcher: Arc<dyn HistoryFetcher>,
    root: ExecutionRef,
    plan: FetchPlan,
    logs: DashMap<String, LogCell>,
}

impl ResolutionSession {
    pub fn new(fetcher: Arc<dyn HistoryFetcher>, root: ExecutionRef, plan: FetchPlan) -> Self {
        Self {
            fetcher,
            root,
            plan,
            logs: DashMap::new(),
        }
    }

    pub fn root(&self) -> &ExecutionRef {
        &self.root
    }

    pub fn plan(&self) -> &FetchPlan {
        &self.plan
    }

    /// Number of histories fetched successfully so far
    pub fn fetched(&self) -> usize {
        self.logs
            .iter()
            .filter(|entry| matches!(entry.value().get(), Some(Ok(_))))
            .count()
    }

    fn cell(&self, key: &str) -> LogCell {
        self.logs.entry(key.to_string()).or_default().clone()
    }

    /// History of the root execution
    pub async fn root_log(&self) -> Result<Arc<EventLog>, ResolveError> {
        let cell = self.cell("");
        let outcome = cell
            .get_or_init(|| async {
                let hints = self.plan.hints_for("", &[]);
                debug!(execution = %self.root, hints = hints.len(), "Fetching root history");
                self.fetcher
                    .fetch_history(&self.root, &hints)
                    .await
                    .map(Arc::new)
                    .map_err(|source| ResolveError::FetchFailed {
                        execution: self.root.clone(),
                        prefix: None,
                        source,
                    })
            })
            .await;
        outcome.clone()
    }

    /// History of the sub-execution at `prefix`, walking down from root.
    ///
    /// `requested` is the fetch hint for the final level when the plan has
    /// none for it.
    pub async fn log_for(
        &self,
        prefix: &NodeAddress,
        requested: &[NodeAddress],
    ) -> Result<Arc<EventLog>, ResolveError> {
        let mut current = self.root_log().await?;
        let path = prefix.prefixes();

        for (depth, step) in path.iter().enumerate() {
            let fallback = match path.get(depth + 1) {
                Some(next) => vec![next.clone()],
                None => requested.to_vec(),
            };
            let parent = Arc::clone(&current);
            let cell = self.cell(step.as_str());
            let outcome = cell
                .get_or_init(|| self.fetch_child(&parent, step, &fallback))
                .await;
            current = outcome.clone()?;
        }

        Ok(current)
    }

    async fn fetch_child(
        &self,
        parent: &EventLog,
        prefix: &NodeAddress,
        fallback: &[NodeAddress],
    ) -> Result<Arc<EventLog>, ResolveError> {
        let execution =
            parent
                .child_execution(prefix)
                .map_err(|source: HistoryError| ResolveError::ChildExecutionUnresolved {
                    prefix: prefix.clone(),
                    parent: parent.execution().clone(),
                    source,
                })?;

        let hints = self.plan.hints_for(prefix.as_str(), fallback);
        debug!(prefix = %prefix, execution = %execution, hints = hints.len(), "Fetching child history");

        let fetched = self.fetcher.fetch_history(&execution, &hints).await;
        fetched
            .map(Arc::new)
            .map_err(|source| ResolveError::FetchFailed {
                execution,
                prefix: Some(prefix.clone()),
                source,
            })
    }
}
