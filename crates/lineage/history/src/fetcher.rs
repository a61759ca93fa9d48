//! History fetcher port.

use async_trait::async_trait;
use lineage_types::{ExecutionRef, NodeAddress};
use std::sync::Arc;

use crate::error::FetchError;
use crate::event_log::EventLog;

/// Source of execution histories.
///
/// Implemented by the engine's history query API. `hint_node_ids` names
/// the addresses the caller intends to extract; implementations may use it
/// to narrow what they load but must return a log that contains at least
/// those nodes when they exist.
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Fetch the full history of one execution.
    async fn fetch_history(
        &self,
        execution: &ExecutionRef,
        hint_node_ids: &[NodeAddress],
    ) -> Result<EventLog, FetchError>;
}

#[async_trait]
impl<T: HistoryFetcher + ?Sized> HistoryFetcher for Arc<T> {
    async fn fetch_history(
        &self,
        execution: &ExecutionRef,
        hint_node_ids: &[NodeAddress],
    ) -> Result<EventLog, FetchError> {
        (**self).fetch_history(execution, hint_node_ids).await
    }
}
